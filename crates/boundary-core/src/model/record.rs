// crates/boundary-core/src/model/record.rs
use serde::{Deserialize, Serialize};

/// `adm_nm` column width.
pub const MAX_NAME_CHARS: usize = 100;

/// One district feature flattened for insertion.
///
/// Scalar fields are never null: a missing property becomes `""`.
/// `geometry_json` is the feature geometry serialized back to GeoJSON text,
/// handed to `ST_GeomFromGeoJSON` on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryRecord {
    pub adm_nm: String,
    pub adm_cd: String,
    pub adm_cd2: String,
    pub sido: String,
    pub sgg: String,
    pub sidonm: String,
    pub sggnm: String,
    pub geometry_json: String,
}

impl BoundaryRecord {
    /// Insert parameters in column order
    /// (`adm_nm, adm_cd, adm_cd2, sido, sgg, sidonm, sggnm, geom`).
    pub fn insert_params(&self) -> [crate::model::SqlValue; 8] {
        use crate::model::SqlValue::Text;
        [
            Text(self.adm_nm.clone()),
            Text(self.adm_cd.clone()),
            Text(self.adm_cd2.clone()),
            Text(self.sido.clone()),
            Text(self.sgg.clone()),
            Text(self.sidonm.clone()),
            Text(self.sggnm.clone()),
            Text(self.geometry_json.clone()),
        ]
    }
}
