use cgmath::Matrix4;
use rand::Rng;

use crate::{
    config::DEFAULT_PLACEMENT_ATTEMPTS,
    data_structures::{compiled::BindState, instance::Instance, registry::MeshRegistry},
    error::PlacementError,
    game::board::{BOARD_SIZE, Board, Cell, MAX_HEIGHT, TIER},
    render::DrawTarget,
};

/// Shift from the cell anchor to where the worker stands on its tile.
const STANDING_OFFSET: [f32; 3] = [5.0, 0.0, 0.0];
const WORKER_SCALE: f32 = 2.0;

/// Where a worker stands: its cell and the height of its feet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerPosition {
    pub row: usize,
    pub col: usize,
    /// One level above the cell's height at the time of placement.
    pub height: u32,
}

impl WorkerPosition {
    pub fn cell(&self) -> Cell {
        (self.row, self.col)
    }
}

/// A game piece. Starts off the board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Worker {
    position: Option<WorkerPosition>,
}

impl Worker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts the worker on top of `cell`.
    pub fn set_position(&mut self, (row, col): Cell, board: &Board) -> WorkerPosition {
        let position = WorkerPosition {
            row,
            col,
            height: board.get(row, col) + TIER,
        };
        self.position = Some(position);
        position
    }

    /// Tries [`DEFAULT_PLACEMENT_ATTEMPTS`] random cells and takes the first
    /// one without a dome.
    pub fn set_random_position<R: Rng + ?Sized>(
        &mut self,
        board: &Board,
        rng: &mut R,
    ) -> Result<WorkerPosition, PlacementError> {
        self.set_random_position_within(board, rng, DEFAULT_PLACEMENT_ATTEMPTS)
    }

    /// Random placement with an explicit bound. This can fail on a board that
    /// still has free cells; it never searches exhaustively.
    pub fn set_random_position_within<R: Rng + ?Sized>(
        &mut self,
        board: &Board,
        rng: &mut R,
        attempts: usize,
    ) -> Result<WorkerPosition, PlacementError> {
        for _ in 0..attempts {
            let i = rng.random_range(0..BOARD_SIZE);
            let j = rng.random_range(0..BOARD_SIZE);
            if board.get(i, j) < MAX_HEIGHT {
                return Ok(self.set_position((i, j), board));
            }
        }
        log::warn!("Could not place worker after {attempts} attempts");
        Err(PlacementError::Exhausted { attempts })
    }

    pub fn position(&self) -> Option<WorkerPosition> {
        self.position
    }

    pub fn cell(&self) -> Option<Cell> {
        self.position.map(|p| p.cell())
    }

    pub fn is_placed(&self) -> bool {
        self.position.is_some()
    }

    /// Placement of the worker mesh in the board's frame, if placed.
    pub fn instance(&self) -> Option<Instance> {
        let p = self.position?;
        let tier = (p.height / TIER).saturating_sub(1) as usize;
        let position = Board::base_position(p.row, p.col, p.height)
            + Board::tier_offset(tier)
            + cgmath::Vector3::from(STANDING_OFFSET);
        Some(Instance::from(position) * Instance::uniform_scale(WORKER_SCALE))
    }

    /// Draws the `worker` mesh under `board_frame`. Does nothing when unplaced.
    pub fn draw<T: DrawTarget + ?Sized>(
        &self,
        registry: &MeshRegistry,
        target: &mut T,
        board_frame: &Instance,
        bind: &mut BindState,
    ) -> bool {
        let Some(instance) = self.instance() else {
            return false;
        };
        let transform: Matrix4<f32> = (board_frame * &instance).to_matrix();
        registry.draw("worker", target, &transform, bind)
    }
}
