// crates/boundary-core/src/analysis.rs

//! Offline GeoJSON statistics for the `analyze` command. No database needed.

use crate::error::Result;
use crate::loader::{GeoJsonLoader, GeometryInfo, PropertiesInfo};
use crate::loader::encoding::TextEncoding;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

pub const TOP_SIDO: usize = 10;
pub const TOP_SGG: usize = 20;

const UNKNOWN: &str = "Unknown";

/// Name and feature count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureAnalysis {
    pub total_features: usize,
    pub unique_properties: Vec<String>,
    pub sido_count: usize,
    pub sgg_count: usize,
    pub top_sido: Vec<NameCount>,
    pub top_sgg: Vec<NameCount>,
    pub sample: Option<Value>,
}

/// Counts provinces and counties over the whole feature list.
pub fn analyze_features(features: &[Value]) -> FeatureAnalysis {
    let mut keys = BTreeSet::new();
    let mut sido: IndexMap<String, usize> = IndexMap::new();
    let mut sgg: IndexMap<String, usize> = IndexMap::new();

    for feature in features {
        let props = feature.get("properties").and_then(Value::as_object);
        if let Some(props) = props {
            keys.extend(props.keys().cloned());
        }
        let name = |key: &str| {
            props
                .and_then(|p| p.get(key))
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN)
                .to_string()
        };
        *sido.entry(name("sidonm")).or_default() += 1;
        *sgg.entry(name("sggnm")).or_default() += 1;
    }

    FeatureAnalysis {
        total_features: features.len(),
        unique_properties: keys.into_iter().collect(),
        sido_count: sido.len(),
        sgg_count: sgg.len(),
        top_sido: top_n(&sido, TOP_SIDO),
        top_sgg: top_n(&sgg, TOP_SGG),
        sample: features.first().cloned(),
    }
}

/// Count desc; the stable sort keeps first-seen order among ties.
fn top_n(counts: &IndexMap<String, usize>, n: usize) -> Vec<NameCount> {
    let mut all: Vec<NameCount> = counts
        .iter()
        .map(|(name, count)| NameCount {
            name: name.clone(),
            count: *count,
        })
        .collect();
    all.sort_by(|a, b| b.count.cmp(&a.count));
    all.truncate(n);
    all
}

/// Everything `analyze` prints for one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub encoding: TextEncoding,
    pub properties: Option<PropertiesInfo>,
    pub geometry: Option<GeometryInfo>,
    pub features: FeatureAnalysis,
}

pub fn analyze_file(path: impl AsRef<Path>) -> Result<AnalysisReport> {
    let mut loader = GeoJsonLoader::new();
    let encoding = loader.load(path)?.encoding;
    Ok(AnalysisReport {
        encoding,
        properties: loader.properties_info(),
        geometry: loader.geometry_info(),
        features: analyze_features(loader.features()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn f(sido: Option<&str>, sgg: &str) -> Value {
        let mut props = json!({ "adm_nm": "동", "sggnm": sgg });
        if let Some(s) = sido {
            props["sidonm"] = json!(s);
        }
        json!({ "type": "Feature", "properties": props, "geometry": null })
    }

    #[test]
    fn counts_and_ranks() {
        let features = vec![
            f(Some("B"), "b1"),
            f(Some("A"), "a1"),
            f(Some("A"), "a2"),
            f(None, "a2"),
        ];
        let a = analyze_features(&features);
        assert_eq!(a.total_features, 4);
        assert_eq!(a.sido_count, 3);
        assert_eq!(a.sgg_count, 3);
        assert_eq!(a.top_sido[0], NameCount { name: "A".into(), count: 2 });
        // B and Unknown tie at 1; B was seen first.
        assert_eq!(a.top_sido[1].name, "B");
        assert_eq!(a.top_sido[2].name, "Unknown");
        assert_eq!(a.unique_properties, ["adm_nm", "sggnm", "sidonm"]);
        assert_eq!(a.sample, Some(features[0].clone()));
    }

    #[test]
    fn top_lists_are_capped() {
        let features: Vec<_> = (0..30).map(|i| f(Some(&format!("s{i}")), &format!("g{i}"))).collect();
        let a = analyze_features(&features);
        assert_eq!(a.top_sido.len(), TOP_SIDO);
        assert_eq!(a.top_sgg.len(), TOP_SGG);
        assert_eq!(a.top_sido[0].name, "s0");
    }

    #[test]
    fn empty_input() {
        let a = analyze_features(&[]);
        assert_eq!(a.total_features, 0);
        assert!(a.top_sido.is_empty());
        assert!(a.sample.is_none());
    }

    #[test]
    fn analyzes_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dong.geojson");
        let doc = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "adm_nm": "사직동", "sidonm": "서울특별시", "sggnm": "종로구" },
                "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] }
            }]
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        let report = analyze_file(&path).unwrap();
        assert_eq!(report.encoding, TextEncoding::Utf8);
        assert_eq!(report.features.total_features, 1);
        assert_eq!(report.geometry.unwrap().geometry_types, ["Polygon"]);
        assert_eq!(report.properties.unwrap().total_properties, 3);
    }
}
