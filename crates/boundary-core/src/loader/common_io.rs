// crates/boundary-core/src/loader/common_io.rs
use crate::error::{BoundaryError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[cfg(feature = "compact")]
use flate2::read::GzDecoder;

/// Reads a whole source file into memory.
///
/// With the `compact` feature, `*.gz` paths are gunzipped on the way in; the
/// text decoding step sees the same bytes either way.
pub fn read_source(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| {
        BoundaryError::FileLoad(format!("file not found at {}: {}", path.display(), e))
    })?;

    let mut reader = open_stream(path, BufReader::new(file));
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|e| {
        BoundaryError::FileLoad(format!("cannot read {}: {}", path.display(), e))
    })?;
    Ok(bytes)
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

#[cfg(feature = "compact")]
fn open_stream<'a, R: Read + 'a>(path: &Path, reader: R) -> Box<dyn Read + 'a> {
    if is_gzip(path) {
        Box::new(GzDecoder::new(reader))
    } else {
        Box::new(reader)
    }
}

#[cfg(not(feature = "compact"))]
fn open_stream<'a, R: Read + 'a>(path: &Path, reader: R) -> Box<dyn Read + 'a> {
    if is_gzip(path) {
        tracing::warn!(path = %path.display(), "gzip input needs the 'compact' feature; reading raw bytes");
    }
    Box::new(reader)
}
