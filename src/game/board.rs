//! The 5x5 building grid.
//!
//! Every cell stores a height in units of ten: 0 is bare ground, 10/20/30 are
//! the three building levels and 40 is a dome. Heights only ever grow.

use std::fmt;

use rand::Rng;

/// Side length of the square board.
pub const BOARD_SIZE: usize = 5;
/// Height of one building level.
pub const TIER: u32 = 10;
/// A cell at this height carries a dome.
pub const MAX_HEIGHT: u32 = 40;
/// Every height a cell can have.
pub const HEIGHTS: [u32; 5] = [0, 10, 20, 30, 40];

/// Horizontal distance between neighbouring cell anchors.
const CELL_PITCH: f32 = 29.5;
/// Vertical anchor units per height unit.
const HEIGHT_SCALE: f32 = 2.0;
const GROUND_OFFSET: f32 = -20.0;

/// Per-level correction so each level mesh sits on the one below it.
const TIER_OFFSETS: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [2.05, 5.0, -2.0],
    [2.0, 6.0, -2.0],
    [3.6, 3.0, -3.4],
];

/// Mesh drawn for each built level, indexed by `height / TIER - 1`.
const TIER_MESHES: [&str; 4] = ["level1_v1", "level2_v1", "level3", "dome"];

/// (row, column)
pub type Cell = (usize, usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: [[u32; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// An empty board: every cell at ground level.
    pub fn new() -> Self {
        Self {
            cells: [[0; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Builds a board from explicit heights, or `None` if any height is not in [`HEIGHTS`].
    pub fn from_heights(cells: [[u32; BOARD_SIZE]; BOARD_SIZE]) -> Option<Self> {
        cells
            .iter()
            .flatten()
            .all(|h| HEIGHTS.contains(h))
            .then_some(Self { cells })
    }

    /// Sets every cell to a uniformly random height.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for row in self.cells.iter_mut() {
            for cell in row.iter_mut() {
                *cell = HEIGHTS[rng.random_range(0..HEIGHTS.len())];
            }
        }
    }

    /// Adds one level to a cell unless it already has a dome.
    /// Returns whether the cell changed.
    ///
    /// # Panics
    ///
    /// If `(i, j)` is off the board.
    pub fn build(&mut self, i: usize, j: usize) -> bool {
        let cell = &mut self.cells[i][j];
        if *cell < MAX_HEIGHT {
            *cell += TIER;
            true
        } else {
            false
        }
    }

    /// # Panics
    ///
    /// If `(i, j)` is off the board.
    pub fn get(&self, i: usize, j: usize) -> u32 {
        self.cells[i][j]
    }

    pub fn in_bounds(i: isize, j: isize) -> bool {
        (0..BOARD_SIZE as isize).contains(&i) && (0..BOARD_SIZE as isize).contains(&j)
    }

    /// Cells of the 3x3 neighbourhood around `(i, j)`, the centre included,
    /// whose height is within one level of the centre.
    ///
    /// Occupied cells and domes are not filtered out; callers that need
    /// strictly legal moves have to do that themselves.
    pub fn find_available(&self, i: usize, j: usize) -> Vec<Cell> {
        let here = self.get(i, j);
        let mut available = Vec::new();
        for di in -1..=1isize {
            for dj in -1..=1isize {
                let (ni, nj) = (i as isize + di, j as isize + dj);
                if !Self::in_bounds(ni, nj) {
                    continue;
                }
                let (ni, nj) = (ni as usize, nj as usize);
                if self.get(ni, nj).abs_diff(here) <= TIER {
                    available.push((ni, nj));
                }
            }
        }
        available
    }

    /// World-space anchor of cell `(i, j)` at height `v`, in the board's frame.
    pub fn base_position(i: usize, j: usize, v: u32) -> cgmath::Vector3<f32> {
        cgmath::Vector3::new(
            j as f32 * CELL_PITCH,
            v as f32 * HEIGHT_SCALE + GROUND_OFFSET,
            i as f32 * CELL_PITCH,
        )
    }

    /// Correction for the mesh of the given level (0 = first level, 3 = dome).
    /// Levels past the dome reuse the dome's correction.
    pub fn tier_offset(tier: usize) -> cgmath::Vector3<f32> {
        TIER_OFFSETS[tier.min(TIER_OFFSETS.len() - 1)].into()
    }

    /// Mesh name for the level that tops out at `height`; ground has none.
    pub fn tier_mesh(height: u32) -> Option<&'static str> {
        let tier = (height / TIER) as usize;
        tier.checked_sub(1).and_then(|t| TIER_MESHES.get(t)).copied()
    }

    /// Iterates `((row, column), height)` over the whole board.
    pub fn cells(&self) -> impl Iterator<Item = (Cell, u32)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, h)| ((i, j), *h)))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: Vec<String> = row.iter().map(|h| format!("{h:2}")).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn randomize_only_produces_known_heights() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut board = Board::new();
        for _ in 0..200 {
            board.randomize(&mut rng);
            assert!(board.cells().all(|(_, h)| HEIGHTS.contains(&h)));
        }
    }

    #[test]
    fn randomize_eventually_uses_every_height() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut board = Board::new();
        let mut seen = [false; 5];
        for _ in 0..20 {
            board.randomize(&mut rng);
            for (_, h) in board.cells() {
                seen[(h / TIER) as usize] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn build_four_times_reaches_a_dome_and_stops() {
        let mut board = Board::new();
        for _ in 0..4 {
            assert!(board.build(2, 2));
        }
        assert_eq!(board.get(2, 2), 40);
        assert!(!board.build(2, 2));
        assert_eq!(board.get(2, 2), 40);
        // only the target cell changed
        assert_eq!(board.cells().filter(|(_, h)| *h != 0).count(), 1);
    }

    #[test]
    fn centre_of_flat_board_sees_all_nine_cells() {
        let board = Board::new();
        let available = board.find_available(2, 2);
        assert_eq!(available.len(), 9);
        assert!(available.contains(&(2, 2)));
        assert!(available.contains(&(1, 1)));
        assert!(available.contains(&(3, 3)));
    }

    #[test]
    fn find_available_is_clipped_to_the_board() {
        let board = Board::new();
        assert_eq!(board.find_available(0, 0), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert_eq!(board.find_available(4, 2).len(), 6);

        let mut rng = StdRng::seed_from_u64(3);
        let mut board = Board::new();
        for _ in 0..20 {
            board.randomize(&mut rng);
            for ((i, j), _) in board.cells() {
                for (ni, nj) in board.find_available(i, j) {
                    assert!(ni < BOARD_SIZE && nj < BOARD_SIZE);
                    assert!(ni.abs_diff(i) <= 1 && nj.abs_diff(j) <= 1);
                }
            }
        }
    }

    #[test]
    fn find_available_respects_the_one_level_step() {
        let board = Board::from_heights([
            [0, 10, 20, 0, 0],
            [30, 10, 40, 0, 0],
            [0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0],
        ])
        .expect("valid heights");
        let mut available = board.find_available(1, 1);
        available.sort();
        assert_eq!(available, vec![(0, 0), (0, 1), (0, 2), (1, 1), (2, 0), (2, 1), (2, 2)]);
    }

    #[test]
    fn from_heights_rejects_unknown_heights() {
        let mut cells = [[0; BOARD_SIZE]; BOARD_SIZE];
        cells[3][1] = 15;
        assert!(Board::from_heights(cells).is_none());
    }

    #[test]
    fn anchors_and_level_meshes() {
        assert_eq!(Board::base_position(1, 2, 10), cgmath::Vector3::new(59.0, 0.0, 29.5));
        assert_eq!(Board::tier_mesh(0), None);
        assert_eq!(Board::tier_mesh(10), Some("level1_v1"));
        assert_eq!(Board::tier_mesh(40), Some("dome"));
        assert_eq!(Board::tier_mesh(50), None);
        assert_eq!(Board::tier_offset(9), Board::tier_offset(3));
    }
}
