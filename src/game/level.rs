//! Obstacle layouts and the level-advance rule

use std::collections::HashSet;

use rand::Rng;

use super::bounds::Bounds;
use super::config::ObstacleLayout;
use super::error::PlacementError;
use super::food;
use super::state::Position;

/// True when eating the `food_eaten`-th item moves the game up a level
pub fn advances_level(food_eaten: u32, threshold: u32) -> bool {
    threshold > 0 && food_eaten > 0 && food_eaten % threshold == 0
}

/// Obstacle cells for `level`, all inside the playable area and none in `avoid`
pub fn generate<R: Rng + ?Sized>(
    level: u32,
    layout: ObstacleLayout,
    bounds: &Bounds,
    avoid: &HashSet<Position>,
    rng: &mut R,
) -> Result<HashSet<Position>, PlacementError> {
    match layout {
        ObstacleLayout::Random { per_level } => {
            random_cells(per_level * level.max(1) as usize, bounds, avoid, rng)
        }
        ObstacleLayout::Maze => Ok(maze_pattern(level, bounds)
            .into_iter()
            .map(|(col, row)| bounds.cell(col, row))
            .filter(|pos| bounds.contains(*pos) && !avoid.contains(pos))
            .collect()),
    }
}

/// Like [`generate`], but a layout that does not fit becomes an empty one
pub fn generate_or_empty<R: Rng + ?Sized>(
    level: u32,
    layout: ObstacleLayout,
    bounds: &Bounds,
    avoid: &HashSet<Position>,
    rng: &mut R,
) -> HashSet<Position> {
    generate(level, layout, bounds, avoid, rng).unwrap_or_else(|err| {
        tracing::warn!(level, %err, "obstacle layout does not fit, using an empty one");
        HashSet::new()
    })
}

fn random_cells<R: Rng + ?Sized>(
    count: usize,
    bounds: &Bounds,
    avoid: &HashSet<Position>,
    rng: &mut R,
) -> Result<HashSet<Position>, PlacementError> {
    let mut taken = avoid.clone();
    let mut cells = HashSet::with_capacity(count);

    for _ in 0..count {
        let pos = food::place(&taken, bounds, rng)?;
        taken.insert(pos);
        cells.insert(pos);
    }

    Ok(cells)
}

/// Hand-drawn walls in (column, row) cells, scaled to the field where it
/// makes sense. Levels past the last pattern have no walls.
fn maze_pattern(level: u32, bounds: &Bounds) -> Vec<(i32, i32)> {
    let (cols, rows) = (bounds.columns(), bounds.rows());

    match level {
        1 => vec![(10, 10), (15, 15)],
        2 => {
            let (from, to) = (cols / 4, cols - cols / 4);
            [rows / 3, rows - rows / 3]
                .into_iter()
                .flat_map(|row| (from..to).map(move |col| (col, row)))
                .collect()
        }
        3 => {
            let arm = 3;
            let (left, right) = (2, cols - 3);
            let (top, bottom) = (2, rows - 3);
            let mut cells = Vec::new();
            for (cx, cy, sx, sy) in [
                (left, top, 1, 1),
                (right, top, -1, 1),
                (left, bottom, 1, -1),
                (right, bottom, -1, -1),
            ] {
                cells.push((cx, cy));
                for i in 1..arm {
                    cells.push((cx + sx * i, cy));
                    cells.push((cx, cy + sy * i));
                }
            }
            cells
        }
        _ => Vec::new(),
    }
}
