//! Food placement

use std::collections::HashSet;

use rand::Rng;
use rand::seq::IteratorRandom;

use super::bounds::Bounds;
use super::error::PlacementError;
use super::state::Position;

/// Random draws before falling back to scanning the free cells
const SAMPLE_ATTEMPTS: usize = 64;

/// Pick a uniformly random playable cell that is not in `occupied`.
///
/// Samples the field directly first, which is cheap while the board is mostly
/// empty, and then chooses among the remaining free cells so a crowded board
/// still terminates.
pub fn place<R: Rng + ?Sized>(
    occupied: &HashSet<Position>,
    bounds: &Bounds,
    rng: &mut R,
) -> Result<Position, PlacementError> {
    let no_space = PlacementError::NoSpaceAvailable {
        columns: bounds.columns(),
        rows: bounds.rows(),
    };

    if !bounds.is_playable() {
        return Err(no_space);
    }

    for _ in 0..SAMPLE_ATTEMPTS {
        let pos = bounds.cell(
            rng.gen_range(0..bounds.columns()),
            rng.gen_range(0..bounds.rows()),
        );
        if !occupied.contains(&pos) {
            return Ok(pos);
        }
    }

    bounds
        .cells()
        .filter(|pos| !occupied.contains(pos))
        .choose(rng)
        .ok_or(no_space)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_place_avoids_occupied() {
        let bounds = Bounds::from_cells(5, 5, 1, 20);
        let occupied: HashSet<_> = bounds.cells().take(20).collect();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let pos = place(&occupied, &bounds, &mut rng).unwrap();
            assert!(!occupied.contains(&pos));
            assert!(bounds.contains(pos));
            assert_eq!((pos.x % 20, pos.y % 20), (0, 0));
        }
    }

    #[test]
    fn test_place_finds_last_free_cell() {
        let bounds = Bounds::from_cells(8, 8, 0, 20);
        let last = bounds.cell(3, 6);
        let occupied: HashSet<_> = bounds.cells().filter(|c| *c != last).collect();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(place(&occupied, &bounds, &mut rng), Ok(last));
    }

    #[test]
    fn test_place_full_board_fails() {
        let bounds = Bounds::from_cells(3, 2, 1, 20);
        let occupied: HashSet<_> = bounds.cells().collect();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(
            place(&occupied, &bounds, &mut rng),
            Err(PlacementError::NoSpaceAvailable { columns: 3, rows: 2 })
        );
    }

    #[test]
    fn test_place_never_in_header() {
        let bounds = Bounds::from_cells(4, 4, 3, 20);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let pos = place(&HashSet::new(), &bounds, &mut rng).unwrap();
            assert!(pos.y >= bounds.header);
        }
    }
}
