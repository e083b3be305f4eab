// crates/boundary-core/src/error.rs
use std::fmt;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BoundaryError>;

/// Errors raised by the loader, the database client, the importer and the
/// aggregator.
///
/// Per-feature problems are *not* raised through this type during an import;
/// they come back as [`ValidationError`] values and are counted by the caller.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// Source file missing, or unreadable in every attempted text encoding.
    #[error("file load failed: {0}")]
    FileLoad(String),

    /// Structurally invalid GeoJSON document.
    #[error("invalid GeoJSON data: {0}")]
    Data(String),

    /// A single feature failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Operation attempted while disconnected, or the connection attempt failed.
    #[error("database connection error: {0}")]
    Connection(String),

    /// A statement failed at the driver level; its transaction was rolled back.
    #[error("query failed: {0}")]
    Query(String),

    /// SQL script file missing or undecodable.
    #[error("SQL file error: {0}")]
    File(String),

    /// Import-level failure (missing table, declined clear, ...).
    #[error("import failed: {0}")]
    Import(String),

    /// Province/county derivation failure.
    #[error("aggregation failed: {0}")]
    Aggregate(String),

    /// Geometry could not be decoded or merged.
    #[error("geometry error: {0}")]
    Geometry(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<postgres::Error> for BoundaryError {
    fn from(e: postgres::Error) -> Self {
        BoundaryError::Query(describe_pg(&e))
    }
}

/// Text of a driver error with the server's reason kept.
///
/// `postgres::Error` displays as a bare kind ("db error"); the server
/// message, SQLSTATE, detail and hint live on the attached `DbError`.
pub(crate) fn describe_pg(e: &postgres::Error) -> String {
    if let Some(db) = e.as_db_error() {
        return server_message(db.code().code(), db.message(), db.detail(), db.hint());
    }
    let mut out = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

fn server_message(code: &str, message: &str, detail: Option<&str>, hint: Option<&str>) -> String {
    let mut out = format!("{message} (SQLSTATE {code})");
    if let Some(detail) = detail {
        out.push_str("; detail: ");
        out.push_str(detail);
    }
    if let Some(hint) = hint {
        out.push_str("; hint: ");
        out.push_str(hint);
    }
    out
}

/// Why a feature was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// The feature (or its `properties`) is not a JSON object.
    NotAnObject,
    /// A required property is absent or empty.
    MissingProperty(&'static str),
    /// `adm_nm` is longer than the column allows.
    NameTooLong { len: usize, max: usize },
    /// Geometry lacks `type` or `coordinates`.
    InvalidGeometry,
    /// Geometry could not be re-parsed from its serialized form.
    GeometryParse(String),
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "feature or properties is not an object"),
            Self::MissingProperty(p) => write!(f, "missing required property: {p}"),
            Self::NameTooLong { len, max } => {
                write!(f, "administrative name is {len} chars (max {max})")
            }
            Self::InvalidGeometry => write!(f, "geometry needs both type and coordinates"),
            Self::GeometryParse(msg) => write!(f, "geometry JSON parse failed: {msg}"),
        }
    }
}

/// A rejected feature, keyed by its administrative name (or `"Unknown"`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("feature processing error ({feature_name}): {reason}")]
pub struct ValidationError {
    pub feature_name: String,
    pub reason: ValidationFailure,
}

impl ValidationError {
    pub fn new(feature_name: impl Into<String>, reason: ValidationFailure) -> Self {
        Self {
            feature_name: feature_name.into(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_keeps_reason_and_code() {
        let text = server_message(
            "23502",
            "null value in column \"adm_nm\" violates not-null constraint",
            Some("Failing row contains (1, null)."),
            None,
        );
        assert_eq!(
            text,
            "null value in column \"adm_nm\" violates not-null constraint (SQLSTATE 23502); \
             detail: Failing row contains (1, null)."
        );
    }

    #[test]
    fn server_message_appends_hint() {
        let text = server_message("42P01", "relation \"nope\" does not exist", None, Some("create it"));
        assert_eq!(text, "relation \"nope\" does not exist (SQLSTATE 42P01); hint: create it");
    }

    #[test]
    fn validation_error_display() {
        let e = ValidationError::new("청운효자동", ValidationFailure::MissingProperty("sidonm"));
        assert_eq!(
            e.to_string(),
            "feature processing error (청운효자동): missing required property: sidonm"
        );
    }
}
