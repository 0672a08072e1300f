//! Renders a small map with rivers and moisture as ASCII art

use voronoi_cellmap::*;

const WIDTH: usize = 100;
const HEIGHT: usize = 50;
const SCALE: f64 = 8.0;

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = CellMapConfigBuilder::new()
        .seed(1452454844896546548)
        .section_size(16, 16)?
        .build()?;

    let mut map = CellMapBuilder::new(config)
        .points_generator(ZoomPointsGenerator::new(
            BlueNoisePointsGenerator::new(200..=250)?,
            DVec2::new(1.1, 1.1),
        )?)
        .processor(OceanLandProcessor::new(PerlinNoise::from_map_seed(config.seed)))
        .processor(DistanceToOceanProcessor::default())
        .processor(RiverProcessor::default())
        .processor(MoistureProcessor::with_noise(ConstantNoise(0.0), ConstantNoise(1.0)))
        .build()?;

    let area = Rect::new(DVec2::ZERO, DVec2::new(WIDTH as f64 * SCALE, HEIGHT as f64 * SCALE));
    let view = map.get_sub_view(area)?;

    // River corners, snapped to the character grid
    let mut river = vec![vec![false; WIDTH]; HEIGHT];
    for corner in view.corners(map.graph()) {
        if corner.get(keys::IS_RIVER) == Some(&true) {
            let p = corner.point() / SCALE;
            let (x, y) = (p.x as usize, p.y as usize);
            if x < WIDTH && y < HEIGHT {
                river[y][x] = true;
            }
        }
    }

    for (row, river_row) in river.iter().enumerate() {
        let line: String = river_row
            .iter()
            .enumerate()
            .map(|(column, &is_river)| {
                if is_river {
                    return '~';
                }
                let position = DVec2::new(column as f64 + 0.5, row as f64 + 0.5) * SCALE;
                match map.cell_at(position) {
                    Some(cell) if cell.get(keys::IS_OCEAN) == Some(&true) => ' ',
                    Some(cell) => match cell.get(keys::MOISTURE).copied().unwrap_or(0.0) {
                        m if m >= 0.3 => '#',
                        m if m >= 0.1 => '+',
                        _ => '.',
                    },
                    None => '?',
                }
            })
            .collect();
        println!("{}", line);
    }

    let rivers = view
        .edges(map.graph())
        .filter(|e| e.get(keys::IS_RIVER) == Some(&true))
        .count();
    println!("\n{} cells, {} river edges", view.cell_ids().len(), rivers);

    map.release(view);
    Ok(())
}
