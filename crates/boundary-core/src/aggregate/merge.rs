// crates/boundary-core/src/aggregate/merge.rs
use crate::error::{BoundaryError, Result};
use geo::{BooleanOps, Geometry, MultiPolygon, Polygon};
use serde_json::Value;
use wkt::ToWkt;

/// Decodes a GeoJSON geometry string (as produced by `ST_AsGeoJSON`).
pub fn parse_geojson_geometry(text: &str) -> Result<Geometry<f64>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| BoundaryError::Geometry(format!("invalid geometry JSON: {e}")))?;
    let geometry = geojson::Geometry::from_json_value(value)
        .map_err(|e| BoundaryError::Geometry(format!("invalid GeoJSON geometry: {e}")))?;
    Geometry::<f64>::try_from(geometry)
        .map_err(|e| BoundaryError::Geometry(format!("unsupported geometry: {e}")))
}

/// Areal union of every polygon found in `geometries`.
///
/// Points and lines carry no area and are skipped; collections are flattened.
/// Fails when nothing areal is left.
pub fn merge_geometries(geometries: &[Geometry<f64>]) -> Result<MultiPolygon<f64>> {
    let mut parts = geometries.iter().map(areal_parts).filter(|mp| !mp.0.is_empty());

    let first = parts
        .next()
        .ok_or_else(|| BoundaryError::Geometry("no polygonal geometry to merge".into()))?;

    Ok(parts.fold(first, |acc, next| acc.union(&next)))
}

/// WKT text for `ST_GeomFromText`.
pub fn to_wkt(geometry: &MultiPolygon<f64>) -> String {
    geometry.wkt_string()
}

fn areal_parts(geometry: &Geometry<f64>) -> MultiPolygon<f64> {
    let mut polygons = Vec::new();
    collect_polygons(geometry, &mut polygons);
    MultiPolygon::new(polygons)
}

fn collect_polygons(geometry: &Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(p) => out.push(p.clone()),
        Geometry::MultiPolygon(mp) => out.extend(mp.0.iter().cloned()),
        Geometry::Rect(r) => out.push(r.to_polygon()),
        Geometry::Triangle(t) => out.push(t.to_polygon()),
        Geometry::GeometryCollection(gc) => {
            for g in gc.iter() {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};

    fn unit_square(x: f64, y: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x, y: y),
            (x: x + 1.0, y: y),
            (x: x + 1.0, y: y + 1.0),
            (x: x, y: y + 1.0),
            (x: x, y: y),
        ])
    }

    #[test]
    fn disjoint_squares_sum_their_areas() {
        let merged = merge_geometries(&[
            unit_square(0.0, 0.0),
            unit_square(5.0, 0.0),
            unit_square(10.0, 10.0),
        ])
        .unwrap();
        assert!((merged.unsigned_area() - 3.0).abs() < 1e-9);
        assert_eq!(merged.0.len(), 3);
    }

    #[test]
    fn self_union_keeps_area() {
        let sq = unit_square(2.0, 3.0);
        let merged = merge_geometries(&[sq.clone(), sq]).unwrap();
        assert!((merged.unsigned_area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn touching_squares_coalesce() {
        let merged = merge_geometries(&[unit_square(0.0, 0.0), unit_square(1.0, 0.0)]).unwrap();
        assert!((merged.unsigned_area() - 2.0).abs() < 1e-9);
        assert_eq!(merged.0.len(), 1);
    }

    #[test]
    fn non_areal_input_is_rejected() {
        let point = Geometry::Point(geo::Point::new(1.0, 2.0));
        assert!(matches!(merge_geometries(&[point]), Err(BoundaryError::Geometry(_))));
        assert!(merge_geometries(&[]).is_err());
    }

    #[test]
    fn parses_postgis_geojson() {
        let g = parse_geojson_geometry(
            r#"{"type":"MultiPolygon","coordinates":[[[[0,0],[2,0],[2,2],[0,2],[0,0]]]]}"#,
        )
        .unwrap();
        assert!(matches!(g, Geometry::MultiPolygon(_)));
        assert!((g.unsigned_area() - 4.0).abs() < 1e-9);

        assert!(parse_geojson_geometry("{}").is_err());
        assert!(parse_geojson_geometry("not json").is_err());
    }

    #[test]
    fn wkt_is_multipolygon() {
        let merged = merge_geometries(&[unit_square(0.0, 0.0)]).unwrap();
        assert!(to_wkt(&merged).starts_with("MULTIPOLYGON"));
    }
}
