//! Full pipeline over a generated map
//!
//! - Every cell of a large view is classified and gets a bounded distance
//! - Coastal cells on both sides of the coastline get the fixed values
//! - Rivers and moisture run on top of the distance field

use voronoi_cellmap::*;

const SEED: u64 = 1452454844896546548;

fn config() -> CellMapConfig {
    CellMapConfigBuilder::new()
        .seed(SEED)
        .chunk_size(16, 16)
        .unwrap()
        .section_size(32, 32)
        .unwrap()
        .build()
        .unwrap()
}

fn points() -> ZoomPointsGenerator<BlueNoisePointsGenerator> {
    ZoomPointsGenerator::new(
        BlueNoisePointsGenerator::new(200..=250).unwrap(),
        DVec2::new(1.1, 1.1),
    )
    .unwrap()
}

fn distance_map() -> CellMap {
    CellMapBuilder::new(config())
        .points_generator(points())
        .polygon_generator(VoronoiPolygonGenerator::new(TriangleCenter::Circumcenter))
        .processor(OceanLandProcessor::new(PerlinNoise::from_map_seed(SEED)))
        .processor(DistanceToOceanProcessor::new(5).unwrap())
        .build()
        .unwrap()
}

fn classified_neighbors(graph: &MapGraph, cell: &Cell) -> Option<Vec<bool>> {
    cell.neighbors()
        .iter()
        .map(|&n| graph.cell(n).and_then(|c| c.get(keys::IS_OCEAN)).copied())
        .collect()
}

#[test]
fn test_distance_field_over_large_view() {
    let mut map = distance_map();
    let view = map
        .get_sub_view(Rect::new(DVec2::ZERO, DVec2::splat(1000.0)))
        .unwrap();
    assert!(!view.cell_ids().is_empty());

    let graph = map.graph();
    for cell in view.cells(graph) {
        let ocean = *cell
            .get(keys::IS_OCEAN)
            .unwrap_or_else(|| panic!("cell {} was not classified", cell.id()));
        let distance = *cell
            .get(keys::DISTANCE_TO_OCEAN)
            .unwrap_or_else(|| panic!("cell {} has no distance", cell.id()));

        assert!(distance.abs() <= 5, "cell {} has distance {}", cell.id(), distance);
        if ocean {
            assert!(distance <= 0);
        } else {
            assert!(distance >= 1);
        }

        let Some(neighbors) = classified_neighbors(graph, cell) else {
            continue;
        };
        if neighbors.iter().any(|&n| n != ocean) {
            let expected = if ocean { 0 } else { 1 };
            assert_eq!(distance, expected, "coastal cell {}", cell.id());
        }
    }

    for corner in view.corners(graph) {
        if let Some(&distance) = corner.get(keys::DISTANCE_TO_OCEAN) {
            assert!(distance.abs() <= 8, "corner {} has distance {}", corner.id(), distance);
        }
    }

    map.release(view);
    assert_eq!(map.loaded_sections(), 0);
}

#[test]
fn test_same_seed_same_map() {
    let rect = Rect::new(DVec2::new(-200.0, 100.0), DVec2::new(200.0, 500.0));
    let collect = |map: &mut CellMap| {
        let view = map.get_sub_view(rect).unwrap();
        let mut cells: Vec<(PointKey, bool, usize)> = view
            .cells(map.graph())
            .map(|c| (point_key(c.center()), *c.get(keys::IS_OCEAN).unwrap(), c.neighbor_count()))
            .collect();
        cells.sort();
        map.release(view);
        cells
    };

    let mut first = distance_map();
    let mut second = distance_map();
    // Load a neighboring region first so sections are generated in another order
    let detour = second
        .get_sub_view(Rect::new(DVec2::splat(600.0), DVec2::splat(700.0)))
        .unwrap();
    assert_eq!(collect(&mut first), collect(&mut second));
    second.release(detour);
}

#[test]
fn test_rivers_and_moisture() {
    let mut map = CellMapBuilder::new(config())
        .points_generator(points())
        .processor(OceanLandProcessor::new(PerlinNoise::from_map_seed(SEED)))
        .processor(DistanceToOceanProcessor::default())
        .processor(RiverProcessor::default().with_chance(0.5).unwrap())
        .processor(MoistureProcessor::new())
        .build()
        .unwrap();
    assert_eq!(
        map.processor_names(),
        vec!["ocean_land", "distance_to_ocean", "river", "moisture"]
    );

    let view = map
        .get_sub_view(Rect::new(DVec2::ZERO, DVec2::splat(600.0)))
        .unwrap();
    let graph = map.graph();

    for cell in view.cells(graph) {
        let moisture = *cell.get(keys::MOISTURE).unwrap();
        assert!((0.0..=1.0).contains(&moisture));
        if cell.get(keys::IS_OCEAN) == Some(&true) {
            assert_eq!(moisture, 1.0);
        }
    }

    // River edges join river corners
    for edge in graph.edges().filter(|e| e.get(keys::IS_RIVER) == Some(&true)) {
        for corner in edge.corners() {
            let corner = graph.corner(corner).unwrap();
            assert_eq!(corner.get(keys::IS_RIVER), Some(&true));
        }
        assert!(edge.get(keys::DISTANCE_TO_RIVER_START).is_some());
    }

    map.release(view);
}

#[test]
fn test_edge_distance_on_chunks() {
    let mut map = CellMapBuilder::new(config())
        .points_generator(points())
        .processor(EdgeDistanceProcessor::new(4).unwrap())
        .build()
        .unwrap();

    let view = map
        .get_sub_view(Rect::new(DVec2::ZERO, DVec2::splat(100.0)))
        .unwrap();

    let mut annotated = 0;
    for cy in 0..6 {
        for cx in 0..6 {
            let Some(data) = map.chunk_data(cx, cy).and_then(|d| d.get(keys::EDGE_DISTANCE)) else {
                continue;
            };
            annotated += 1;
            for y in 0..16 {
                for x in 0..16 {
                    if let Some((edge, distance)) = data.nearest_edge(x, y) {
                        assert!(distance <= 4);
                        assert!(map.edge(edge).is_some());
                    }
                }
            }
        }
    }
    assert!(annotated > 0);

    map.release(view);
}
