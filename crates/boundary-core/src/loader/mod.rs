// crates/boundary-core/src/loader/mod.rs

//! # GeoJSON Loader
//!
//! Handles the physical layer (I/O, decompression, text encodings) and the
//! structural sanity check of a `FeatureCollection`. Parsed features are kept
//! as raw JSON values; per-feature validation happens later in the
//! [`FeatureProcessor`](crate::FeatureProcessor).

pub mod common_io;
pub mod encoding;

use crate::error::{BoundaryError, Result};
use encoding::{decode_first, TextEncoding, GEOJSON_ENCODINGS};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// Summaries only look at this many leading features.
pub const SUMMARY_SAMPLE: usize = 100;

/// A decoded and structurally checked `FeatureCollection`.
#[derive(Debug, Clone)]
pub struct GeoJsonDocument {
    pub features: Vec<Value>,
    /// Encoding that won the fallback walk.
    pub encoding: TextEncoding,
}

/// Union of property keys over the leading features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertiesInfo {
    pub total_properties: usize,
    pub property_keys: Vec<String>,
    pub sample_properties: Map<String, Value>,
}

/// Geometry type set over the leading features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryInfo {
    pub geometry_types: Vec<String>,
    pub sample_geometry_type: String,
    /// Length of the first feature's serialized `coordinates`.
    pub sample_coordinates_len: usize,
}

/// Parses GeoJSON bytes, trying each encoding of [`GEOJSON_ENCODINGS`] in order.
///
/// The first encoding that both decodes and parses as JSON wins. The winning
/// document is then checked with [`validate_document`]; a structural problem is
/// a [`BoundaryError::Data`], not a reason to try the next encoding.
pub fn parse_bytes(bytes: &[u8]) -> Result<GeoJsonDocument> {
    let (encoding, value) =
        decode_first(bytes, &GEOJSON_ENCODINGS, |text| serde_json::from_str::<Value>(text).ok())
            .ok_or_else(|| {
                BoundaryError::FileLoad("could not decode and parse with any encoding".into())
            })?;

    validate_document(&value)?;

    let features = match value {
        Value::Object(mut map) => match map.remove("features") {
            Some(Value::Array(features)) => features,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    Ok(GeoJsonDocument { features, encoding })
}

/// Reads and parses a GeoJSON file.
pub fn load_document(path: impl AsRef<Path>) -> Result<GeoJsonDocument> {
    let path = path.as_ref();
    let bytes = common_io::read_source(path)?;
    parse_bytes(&bytes).map_err(|e| match e {
        BoundaryError::FileLoad(msg) => {
            BoundaryError::FileLoad(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

/// Top-level shape check.
///
/// Only the first feature is inspected; later features are validated one by
/// one during processing.
pub fn validate_document(doc: &Value) -> Result<()> {
    let obj = doc
        .as_object()
        .ok_or_else(|| BoundaryError::Data("GeoJSON root is not an object".into()))?;

    if obj.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(BoundaryError::Data("GeoJSON type is not 'FeatureCollection'".into()));
    }

    let features = match obj.get("features") {
        None => return Err(BoundaryError::Data("features is empty".into())),
        Some(Value::Array(features)) => features,
        Some(_) => return Err(BoundaryError::Data("features is not a list".into())),
    };

    let first = features
        .first()
        .ok_or_else(|| BoundaryError::Data("features is empty".into()))?;

    let first = first
        .as_object()
        .ok_or_else(|| BoundaryError::Data("feature is not an object".into()))?;

    if first.get("type").and_then(Value::as_str) != Some("Feature") {
        return Err(BoundaryError::Data("feature type is not 'Feature'".into()));
    }
    if !first.contains_key("properties") {
        return Err(BoundaryError::Data("feature has no properties".into()));
    }
    if !first.contains_key("geometry") {
        return Err(BoundaryError::Data("feature has no geometry".into()));
    }
    Ok(())
}

/// Stateful loader: keeps the last loaded feature list for later summaries.
#[derive(Debug, Default)]
pub struct GeoJsonLoader {
    document: Option<GeoJsonDocument>,
}

impl GeoJsonLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `path`, replacing any previously cached document.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&GeoJsonDocument> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading GeoJSON");
        let doc = load_document(path)?;
        debug!(
            encoding = doc.encoding.label(),
            features = doc.features.len(),
            "GeoJSON parsed"
        );
        let doc = self.document.insert(doc);
        Ok(&*doc)
    }

    /// Loads already-read bytes (no file I/O).
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<&GeoJsonDocument> {
        let doc = self.document.insert(parse_bytes(bytes)?);
        Ok(&*doc)
    }

    pub fn document(&self) -> Option<&GeoJsonDocument> {
        self.document.as_ref()
    }

    pub fn features(&self) -> &[Value] {
        self.document
            .as_ref()
            .map(|d| d.features.as_slice())
            .unwrap_or(&[])
    }

    pub fn feature_count(&self) -> usize {
        self.features().len()
    }

    pub fn sample_feature(&self) -> Option<&Value> {
        self.features().first()
    }

    pub fn properties_info(&self) -> Option<PropertiesInfo> {
        let sample = self.sample_feature()?;

        let keys: BTreeSet<&str> = self
            .features()
            .iter()
            .take(SUMMARY_SAMPLE)
            .filter_map(|f| f.get("properties").and_then(Value::as_object))
            .flat_map(|props| props.keys().map(String::as_str))
            .collect();

        Some(PropertiesInfo {
            total_properties: keys.len(),
            property_keys: keys.into_iter().map(str::to_string).collect(),
            sample_properties: sample
                .get("properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        })
    }

    pub fn geometry_info(&self) -> Option<GeometryInfo> {
        let sample = self.sample_feature()?;

        let types: BTreeSet<&str> = self
            .features()
            .iter()
            .take(SUMMARY_SAMPLE)
            .map(|f| geometry_type(f).unwrap_or("Unknown"))
            .collect();

        let sample_coordinates_len = sample
            .get("geometry")
            .and_then(|g| g.get("coordinates"))
            .map(|c| c.to_string().chars().count())
            .unwrap_or(0);

        Some(GeometryInfo {
            geometry_types: types.into_iter().map(str::to_string).collect(),
            sample_geometry_type: geometry_type(sample).unwrap_or("Unknown").to_string(),
            sample_coordinates_len,
        })
    }
}

fn geometry_type(feature: &Value) -> Option<&str> {
    feature.get("geometry")?.get("type")?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(name: &str, sido: &str) -> Value {
        json!({
            "type": "Feature",
            "properties": { "adm_nm": name, "sidonm": sido },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
            }
        })
    }

    fn collection(features: Vec<Value>) -> Vec<u8> {
        serde_json::to_vec(&json!({ "type": "FeatureCollection", "features": features })).unwrap()
    }

    #[test]
    fn keeps_every_feature_in_order() {
        let features: Vec<_> = (0..7).map(|i| feature(&format!("동{i}"), "A")).collect();
        let doc = parse_bytes(&collection(features.clone())).unwrap();
        assert_eq!(doc.features, features);
        assert_eq!(doc.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn rejects_non_feature_collection() {
        let bytes = serde_json::to_vec(&json!({ "type": "Feature", "features": [] })).unwrap();
        assert!(matches!(parse_bytes(&bytes), Err(BoundaryError::Data(_))));
    }

    #[test]
    fn rejects_empty_features() {
        assert!(matches!(parse_bytes(&collection(vec![])), Err(BoundaryError::Data(_))));
    }

    #[test]
    fn rejects_type_mismatched_first_feature() {
        let mut f = feature("x", "A");
        f["type"] = json!("Point");
        assert!(matches!(parse_bytes(&collection(vec![f])), Err(BoundaryError::Data(_))));
    }

    #[test]
    fn first_feature_needs_properties_and_geometry() {
        let mut f = feature("x", "A");
        f.as_object_mut().unwrap().remove("geometry");
        assert!(matches!(parse_bytes(&collection(vec![f])), Err(BoundaryError::Data(_))));

        let mut f = feature("x", "A");
        f.as_object_mut().unwrap().remove("properties");
        assert!(matches!(parse_bytes(&collection(vec![f])), Err(BoundaryError::Data(_))));
    }

    #[test]
    fn only_the_first_feature_is_checked() {
        let bad_second = json!({ "type": "NotAFeature" });
        let doc = parse_bytes(&collection(vec![feature("x", "A"), bad_second])).unwrap();
        assert_eq!(doc.features.len(), 2);
    }

    #[test]
    fn garbage_is_a_file_load_error() {
        assert!(matches!(parse_bytes(b"<xml/>"), Err(BoundaryError::FileLoad(_))));
    }

    #[test]
    fn summaries_cover_first_hundred_features() {
        let mut features: Vec<_> = (0..SUMMARY_SAMPLE).map(|i| feature(&i.to_string(), "A")).collect();
        // Past the sample window; must not show up in the summaries.
        features.push(json!({
            "type": "Feature",
            "properties": { "late_key": 1 },
            "geometry": { "type": "Point", "coordinates": [1.0, 2.0] }
        }));

        let mut loader = GeoJsonLoader::new();
        loader.load_bytes(&collection(features)).unwrap();
        assert_eq!(loader.feature_count(), SUMMARY_SAMPLE + 1);

        let props = loader.properties_info().unwrap();
        assert_eq!(props.property_keys, ["adm_nm", "sidonm"]);
        assert_eq!(props.total_properties, 2);

        let geom = loader.geometry_info().unwrap();
        assert_eq!(geom.geometry_types, ["Polygon"]);
        assert_eq!(geom.sample_geometry_type, "Polygon");
        assert!(geom.sample_coordinates_len > 0);
    }

    #[test]
    fn empty_loader_has_no_summaries() {
        let loader = GeoJsonLoader::new();
        assert_eq!(loader.feature_count(), 0);
        assert!(loader.properties_info().is_none());
        assert!(loader.geometry_info().is_none());
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dong.geojson");
        std::fs::write(&path, collection(vec![feature("청운효자동", "서울특별시")])).unwrap();

        let mut loader = GeoJsonLoader::new();
        let doc = loader.load(&path).unwrap();
        assert_eq!(doc.features.len(), 1);
        assert_eq!(
            loader.sample_feature().unwrap()["properties"]["adm_nm"],
            "청운효자동"
        );
    }
}
