//! Complete workflow demonstration for voronoi_cellmap

use voronoi_cellmap::*;

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    println!("=== voronoi_cellmap Demo ===\n");

    // Step 1: Configure map
    println!("Step 1: Configuring map...");
    let config = CellMapConfigBuilder::new()
        .seed(1452454844896546548)
        .chunk_size(16, 16)?
        .section_size(32, 32)?
        .build()?;
    println!("  Seed: {}", config.seed);
    println!("  Chunk size: {}", config.chunk_size);
    println!("  Section extent: {}", config.section_extent());

    // Step 2: Build the pipeline
    println!("\nStep 2: Building pipeline...");
    let mut map = CellMapBuilder::new(config)
        .points_generator(ZoomPointsGenerator::new(
            BlueNoisePointsGenerator::new(200..=250)?,
            DVec2::new(1.1, 1.1),
        )?)
        .polygon_generator(VoronoiPolygonGenerator::new(TriangleCenter::Circumcenter))
        .processor(OceanLandProcessor::new(PerlinNoise::from_map_seed(config.seed)))
        .processor(DistanceToOceanProcessor::new(5)?)
        .build()?;
    println!("  Processors: {}", map.processor_names().join(" -> "));

    // Step 3: Query a view
    println!("\nStep 3: Loading a 1000x1000 view...");
    let view = map.get_sub_view(Rect::new(DVec2::ZERO, DVec2::splat(1000.0)))?;
    println!("  Sections loaded: {}", map.loaded_sections());
    println!("  Cells: {}", view.cell_ids().len());
    println!("  Edges: {}", view.edge_ids().len());
    println!("  Corners: {}", view.corner_ids().len());

    // Step 4: Analyze the distance field
    println!("\nStep 4: Distance to ocean:");
    let mut histogram = std::collections::BTreeMap::new();
    for cell in view.cells(map.graph()) {
        if let Some(&distance) = cell.get(keys::DISTANCE_TO_OCEAN) {
            *histogram.entry(distance).or_insert(0usize) += 1;
        }
    }
    for (distance, count) in &histogram {
        let pct = (*count as f64 / view.cell_ids().len() as f64) * 100.0;
        println!("  {:>3}: {:>4} ({:.1}%)", distance, count, pct);
    }

    // Step 5: Point lookups
    println!("\nStep 5: Point lookups:");
    for position in [DVec2::new(10.0, 10.0), DVec2::new(500.0, 500.0), DVec2::new(990.0, 3.0)] {
        if let Some(cell) = map.cell_at(position) {
            println!(
                "  {} -> cell {} (ocean: {:?}, {} neighbors)",
                position,
                cell.id(),
                cell.get(keys::IS_OCEAN),
                cell.neighbor_count()
            );
        }
    }
    if let Some(chunk) = map.chunk(3, 4) {
        println!("  Chunk (3, 4) overlaps {} cells", chunk.cells().len());
    }

    // Step 6: Release
    map.release(view);
    println!("\nStep 6: Released view, {} sections loaded", map.loaded_sections());

    println!("\n=== Demo Complete ===");
    Ok(())
}
