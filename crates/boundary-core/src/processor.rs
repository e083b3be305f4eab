// crates/boundary-core/src/processor.rs

//! Feature → [`BoundaryRecord`] transform.
//!
//! Rules, checked in order:
//! 1. `properties.adm_nm` present and non-empty, at most [`MAX_NAME_CHARS`] chars
//! 2. the geometry, serialized and parsed back, has both `type` and `coordinates`
//!
//! Failures never escape as errors of the import; they come back as
//! [`ValidationError`] values and bump the error counter.

use crate::common::ProcessorStats;
use crate::error::{ValidationError, ValidationFailure};
use crate::model::{BoundaryRecord, MAX_NAME_CHARS};
use serde_json::{Map, Value};
use tracing::debug;

const UNKNOWN_NAME: &str = "Unknown";

/// Records (input order) plus the rejections of one batch call.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub records: Vec<BoundaryRecord>,
    pub errors: Vec<ValidationError>,
}

#[derive(Debug, Default)]
pub struct FeatureProcessor {
    stats: ProcessorStats,
}

impl FeatureProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transforms one feature and updates the counters.
    pub fn process(&mut self, feature: &Value) -> Result<BoundaryRecord, ValidationError> {
        let outcome = build_record(feature);
        match &outcome {
            Ok(_) => self.stats.processed_count += 1,
            Err(e) => {
                self.stats.error_count += 1;
                debug!(feature = %e.feature_name, reason = %e.reason, "feature rejected");
            }
        }
        outcome
    }

    /// Applies [`FeatureProcessor::process`] over `features`, keeping order and
    /// dropping rejected features from `records`.
    pub fn process_batch<'a, I>(&mut self, features: I) -> BatchOutcome
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut out = BatchOutcome::default();
        for feature in features {
            match self.process(feature) {
                Ok(record) => out.records.push(record),
                Err(e) => out.errors.push(e),
            }
        }
        out
    }

    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }

    pub fn reset(&mut self) {
        self.stats = ProcessorStats::default();
    }
}

fn build_record(feature: &Value) -> Result<BoundaryRecord, ValidationError> {
    let empty = Map::new();
    let props = match feature.as_object() {
        Some(obj) => match obj.get("properties") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(p)) => p,
            Some(_) => return Err(ValidationError::new(UNKNOWN_NAME, ValidationFailure::NotAnObject)),
        },
        None => return Err(ValidationError::new(UNKNOWN_NAME, ValidationFailure::NotAnObject)),
    };

    let name = feature_name(props);
    let fail = |reason| ValidationError::new(name.clone(), reason);

    if !props.get("adm_nm").is_some_and(is_truthy) {
        return Err(fail(ValidationFailure::MissingProperty("adm_nm")));
    }

    let adm_nm = property_text(props, "adm_nm");
    let len = adm_nm.chars().count();
    if len > MAX_NAME_CHARS {
        return Err(fail(ValidationFailure::NameTooLong {
            len,
            max: MAX_NAME_CHARS,
        }));
    }

    let geometry = feature
        .get("geometry")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    let geometry_json = geometry.to_string();
    check_geometry_json(&geometry_json).map_err(fail)?;

    Ok(BoundaryRecord {
        adm_nm,
        adm_cd: property_text(props, "adm_cd"),
        adm_cd2: property_text(props, "adm_cd2"),
        sido: property_text(props, "sido"),
        sgg: property_text(props, "sgg"),
        sidonm: property_text(props, "sidonm"),
        sggnm: property_text(props, "sggnm"),
        geometry_json,
    })
}

/// Re-parses serialized geometry; both `type` and `coordinates` must be set.
fn check_geometry_json(text: &str) -> Result<(), ValidationFailure> {
    let parsed: Value =
        serde_json::from_str(text).map_err(|e| ValidationFailure::GeometryParse(e.to_string()))?;
    let has = |key: &str| parsed.get(key).is_some_and(is_truthy);
    if has("type") && has("coordinates") {
        Ok(())
    } else {
        Err(ValidationFailure::InvalidGeometry)
    }
}

fn feature_name(props: &Map<String, Value>) -> String {
    match props.get("adm_nm") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(v) if is_truthy(v) => v.to_string(),
        _ => UNKNOWN_NAME.to_string(),
    }
}

/// Missing or null → `""`; strings verbatim; other scalars in JSON form.
fn property_text(props: &Map<String, Value>, key: &str) -> String {
    match props.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// JSON truthiness: null, false, 0, "" and empty containers are false.
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
