//! Where everything on the board is drawn.
//!
//! The layout is a small transform hierarchy:
//!
//! ```text
//! world (0, -30, 0)
//! ├── terrain tile, rotated -90° about X
//! └── board (-70, 0, -48)
//!     ├── one mesh per built level of each cell
//!     └── workers
//! ```

use cgmath::Deg;

use crate::{
    data_structures::{
        compiled::{BindState, CompiledMesh},
        instance::Instance,
        registry::MeshRegistry,
    },
    game::{
        board::{Board, TIER},
        player::{Player, WORKER_PROXY_HALF_EXTENT},
    },
    pick::{self, Pickable},
    render::{DrawTarget, FrameTarget, PickSurface},
};

pub const WORLD_OFFSET: [f32; 3] = [0.0, -30.0, 0.0];
pub const BOARD_OFFSET: [f32; 3] = [-70.0, 0.0, -48.0];
pub const FIELD_MESH: &str = "field";

/// One mesh to draw and where.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub mesh: &'static str,
    pub instance: Instance,
}

pub fn world_frame() -> Instance {
    cgmath::Vector3::from(WORLD_OFFSET).into()
}

pub fn board_frame() -> Instance {
    world_frame() * Instance::from(cgmath::Vector3::from(BOARD_OFFSET))
}

/// The terrain and every building level, in draw order.
pub fn board_placements(board: &Board) -> Vec<Placement> {
    let mut placements = vec![Placement {
        mesh: FIELD_MESH,
        instance: world_frame() * Instance::rotation_x(Deg(-90.0)),
    }];
    let frame = board_frame();
    for ((i, j), height) in board.cells() {
        for v in (TIER..=height).step_by(TIER as usize) {
            let Some(mesh) = Board::tier_mesh(v) else {
                continue;
            };
            let tier = (v / TIER - 1) as usize;
            let anchor = Board::base_position(i, j, v) + Board::tier_offset(tier);
            placements.push(Placement {
                mesh,
                instance: frame * Instance::from(anchor),
            });
        }
    }
    placements
}

/// The board and one player's workers, plus the cube drawn in place of a
/// worker when picking.
#[derive(Debug)]
pub struct Scene {
    pub board: Board,
    pub player: Player,
    proxy: CompiledMesh,
}

impl Scene {
    pub fn new(board: Board, player: Player) -> Self {
        Self {
            board,
            player,
            proxy: CompiledMesh::cube("worker_proxy", WORKER_PROXY_HALF_EXTENT),
        }
    }

    /// Every mesh of the current frame: terrain, building levels and workers.
    pub fn placements(&self) -> Vec<Placement> {
        let frame = board_frame();
        let mut placements = board_placements(&self.board);
        placements.extend(self.player.workers().iter().filter_map(|worker| {
            Some(Placement {
                mesh: "worker",
                instance: frame * worker.instance()?,
            })
        }));
        placements
    }

    /// Replays [`Self::placements`] through the registry. Returns how many
    /// placements had a mesh.
    pub fn draw<T: DrawTarget + ?Sized>(
        &self,
        registry: &MeshRegistry,
        target: &mut T,
        bind: &mut BindState,
    ) -> usize {
        self.placements()
            .iter()
            .filter(|p| registry.draw(p.mesh, target, &p.instance.to_matrix(), bind))
            .count()
    }

    /// Renders a lit frame over `background` and reads it back. Returns the
    /// image and how many placements had a mesh.
    pub fn snapshot<T: FrameTarget + ?Sized>(
        &self,
        registry: &MeshRegistry,
        target: &mut T,
        background: [f64; 4],
    ) -> anyhow::Result<(image::RgbaImage, usize)> {
        target.clear_to_background(background);
        let mut bind = BindState::default();
        let drawn = self.draw(registry, target, &mut bind);
        Ok((target.read_image()?, drawn))
    }

    /// World-space centre of worker `n`'s pick proxy, if it is placed.
    pub fn worker_centre(&self, n: usize) -> Option<cgmath::Vector3<f32>> {
        let instance = self.player.worker(n)?.instance()?;
        let lift = Instance::translation(0.0, WORKER_PROXY_HALF_EXTENT, 0.0);
        Some((board_frame() * instance * lift).position)
    }

    pub fn worker_pickables(&self) -> Vec<(usize, Pickable<'_>)> {
        self.player.pickables(&self.proxy, &board_frame(), 0)
    }

    /// Runs a pick pass over the workers and selects the one under the
    /// cursor. Returns the selected worker, if any.
    ///
    /// The pass overwrites `surface`; redraw the scene before showing it.
    pub fn pick_worker<S: PickSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        cursor_x: u32,
        cursor_y: u32,
    ) -> anyhow::Result<Option<usize>> {
        let (workers, objects): (Vec<usize>, Vec<Pickable<'_>>) =
            self.worker_pickables().into_iter().unzip();
        let selected = pick::pick(surface, cursor_x, cursor_y, &objects)?.map(|k| workers[k]);
        if let Some(n) = selected {
            self.player.set_active_worker(n);
        }
        Ok(selected)
    }
}
