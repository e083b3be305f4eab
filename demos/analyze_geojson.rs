//! Offline walk-through of a GeoJSON boundary file
//!
//! This demo shows how to:
//! - Load a file with the encoding fallback
//! - Print property and geometry summaries
//! - Run every feature through the processor without a database
//!
//! Usage: cargo run --example analyze_geojson -- path/to/file.geojson

use boundary_rs::prelude::*;

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/HangJeongDong_ver20250401.geojson".to_string());

    println!("=== Boundary GeoJSON Analysis ===\n");

    let mut loader = GeoJsonLoader::new();
    let doc = loader.load(&path)?;
    println!("Loaded {} features ({})\n", doc.features.len(), doc.encoding);

    // Step 1: summaries over the leading features
    if let Some(props) = loader.properties_info() {
        println!("--- Properties ({}) ---", props.total_properties);
        println!("{}\n", props.property_keys.join(", "));
    }
    if let Some(geom) = loader.geometry_info() {
        println!("--- Geometry ---");
        println!("types: {}", geom.geometry_types.join(", "));
        println!("sample: {}\n", geom.sample_geometry_type);
    }

    // Step 2: dry-run processing
    let mut processor = FeatureProcessor::new();
    let outcome = processor.process_batch(loader.features());
    let stats = processor.stats();
    println!("--- Processing ---");
    println!("valid:   {}", stats.processed_count);
    println!("invalid: {}", stats.error_count);
    println!("rate:    {:.1}%", stats.success_rate() * 100.0);
    for err in outcome.errors.iter().take(5) {
        println!("  - {err}");
    }

    // Step 3: province/county counts
    let analysis = analyze_features(loader.features());
    println!("\n--- Top provinces ---");
    for entry in &analysis.top_sido {
        println!("{}: {}", entry.name, entry.count);
    }

    Ok(())
}
