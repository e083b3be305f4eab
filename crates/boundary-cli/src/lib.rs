//! boundary-cli
//! ============
//!
//! Command-line interface for the `boundary-core` PostGIS boundary importer.
//!
//! This crate primarily provides a binary (`boundary-cli`). We include a small
//! library target so that the documentation renders an overview page.
//!
//! Quick start
//! -----------
//!
//! ```text
//! export DB_HOST=localhost DB_PORT=5432 DB_NAME=gis DB_USER=postgres DB_PASSWORD=secret
//! boundary-cli setup --table all
//! boundary-cli import --geojson-file data/HangJeongDong_ver20250401.geojson
//! boundary-cli setup --table sido --create-sido-from-data
//! boundary-cli import --level sigungu
//! boundary-cli verify --table-name sido_boundary
//! ```
//!
//! For programmatic access (importer, aggregator, loaders), use the
//! `boundary-core` crate directly.
#![cfg_attr(docsrs, feature(doc_cfg))]

// This library target intentionally exposes no API; the binary is the primary
// deliverable.
