use cgmath::Matrix4;
use rand::Rng;

use crate::{
    data_structures::{
        compiled::{BindState, CompiledMesh},
        instance::Instance,
        registry::MeshRegistry,
    },
    error::PlacementError,
    game::{
        board::{Board, Cell},
        worker::Worker,
    },
    pick::{PickColor, Pickable},
    render::DrawTarget,
};

pub const WORKERS_PER_PLAYER: usize = 2;

/// Half the edge of the cube drawn in place of a worker during picking, in
/// the worker's own (unscaled) units.
pub const WORKER_PROXY_HALF_EXTENT: f32 = 3.0;

/// Two workers and which of them is selected.
#[derive(Clone, Debug, Default)]
pub struct Player {
    workers: [Worker; WORKERS_PER_PLAYER],
    active: Option<usize>,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn worker(&self, n: usize) -> Option<&Worker> {
        self.workers.get(n)
    }

    pub fn worker_mut(&mut self, n: usize) -> Option<&mut Worker> {
        self.workers.get_mut(n)
    }

    /// Selects worker `n`. Returns false and leaves the selection alone if
    /// there is no such worker.
    pub fn set_active_worker(&mut self, n: usize) -> bool {
        if n < WORKERS_PER_PLAYER {
            self.active = Some(n);
            true
        } else {
            false
        }
    }

    pub fn active_worker(&self) -> Option<usize> {
        self.active
    }

    pub fn clear_active_worker(&mut self) {
        self.active = None;
    }

    /// Moves the selected worker onto `cell`. Does nothing without a selection.
    ///
    /// No rules are checked; use [`Board::find_available`] to offer moves.
    pub fn move_active(&mut self, cell: Cell, board: &Board) -> bool {
        match self.active {
            Some(n) => {
                self.workers[n].set_position(cell, board);
                true
            }
            None => false,
        }
    }

    /// Places every worker at random. Stops at the first worker that cannot
    /// be placed.
    pub fn place_randomly<R: Rng + ?Sized>(
        &mut self,
        board: &Board,
        rng: &mut R,
    ) -> Result<(), PlacementError> {
        for worker in self.workers.iter_mut() {
            worker.set_random_position(board, rng)?;
        }
        Ok(())
    }

    /// Draws every placed worker and returns how many were drawn.
    pub fn draw_workers<T: DrawTarget + ?Sized>(
        &self,
        registry: &MeshRegistry,
        target: &mut T,
        board_frame: &Instance,
        bind: &mut BindState,
    ) -> usize {
        self.workers
            .iter()
            .filter(|worker| worker.draw(registry, target, board_frame, bind))
            .count()
    }

    /// One pick proxy per placed worker, paired with the worker's index.
    ///
    /// Identifier colours start at `first_index` so the proxies can share a
    /// pick pass with other objects.
    pub fn pickables<'a>(
        &self,
        proxy: &'a CompiledMesh,
        board_frame: &Instance,
        first_index: usize,
    ) -> Vec<(usize, Pickable<'a>)> {
        let lift = Instance::translation(0.0, WORKER_PROXY_HALF_EXTENT, 0.0);
        self.workers
            .iter()
            .enumerate()
            .filter_map(|(n, worker)| Some((n, worker.instance()?)))
            .enumerate()
            .filter_map(|(k, (n, instance))| {
                let Some(color) = first_index.checked_add(k).and_then(PickColor::for_index) else {
                    log::warn!("No identifier colour left for worker {n}");
                    return None;
                };
                let transform: Matrix4<f32> = (board_frame * &instance * lift).to_matrix();
                let pickable = Pickable {
                    mesh: proxy,
                    transform,
                    color,
                };
                Some((n, pickable))
            })
            .collect()
    }
}
