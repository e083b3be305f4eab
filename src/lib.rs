//! Workspace umbrella crate: re-exports `boundary-core` for the demos.

pub use boundary_core::*;

pub mod prelude {
    pub use boundary_core::analysis::{analyze_features, analyze_file, AnalysisReport};
    pub use boundary_core::{
        BoundaryError, BoundaryRecord, FeatureProcessor, GeoJsonLoader, Result,
    };
}
