use std::path::{Path, PathBuf};

use anyhow::Context as _;
use cgmath::Matrix4;
use santorini_ngin::{
    Board, Config, FrameTarget, MeshRegistry, Player,
    camera::{OrbitCamera, project_to_cursor},
    render::{gpu::GpuRenderer, software::SoftwareTarget},
    resources::texture::{ImageTextures, TextureLoader},
    scene::Scene,
};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    let snapshot = std::env::args().nth(1).map(PathBuf::from);

    let mut scene = new_scene(&config)?;
    let view_proj = OrbitCamera::default().view_proj(config.aspect());

    match GpuRenderer::new(config.width, config.height) {
        Ok(mut renderer) => {
            let registry = load_registry(&config, &mut renderer)?;
            let mut frame = renderer.frame(view_proj);
            run(&config, &registry, &mut scene, &mut frame, view_proj, snapshot.as_deref())
        }
        Err(e) => {
            log::warn!("No headless GPU device, rendering on the CPU: {e:#}");
            let mut textures = ImageTextures::new();
            let registry = load_registry(&config, &mut textures)?;
            let mut target =
                SoftwareTarget::new(config.width, config.height).with_textures(&textures);
            target.set_view_proj(view_proj);
            run(&config, &registry, &mut scene, &mut target, view_proj, snapshot.as_deref())
        }
    }
}

fn load_registry(config: &Config, textures: &mut dyn TextureLoader) -> anyhow::Result<MeshRegistry> {
    MeshRegistry::load(&config.asset_dir, textures)
        .with_context(|| format!("Failed to load meshes from {}", config.asset_dir.display()))
}

/// A random board with the first worker placed on it.
fn new_scene(config: &Config) -> anyhow::Result<Scene> {
    let mut rng = rand::rng();
    let mut board = Board::new();
    board.randomize(&mut rng);
    log::info!("Board:\n{board}");

    let mut player = Player::new();
    let worker = player.worker_mut(0).context("Player has no workers")?;
    let position = worker
        .set_random_position_within(&board, &mut rng, config.placement_attempts)
        .context("Can't place worker")?;
    log::info!("Worker at {position:?}");
    log::info!(
        "Available cells: {:?}",
        board.find_available(position.row, position.col)
    );
    Ok(Scene::new(board, player))
}

fn run<T: FrameTarget>(
    config: &Config,
    registry: &MeshRegistry,
    scene: &mut Scene,
    target: &mut T,
    view_proj: Matrix4<f32>,
    snapshot: Option<&Path>,
) -> anyhow::Result<()> {
    // Click on the worker once to show the pick pass resolving it.
    let cursor = scene
        .worker_centre(0)
        .and_then(|centre| project_to_cursor(&view_proj, centre, (config.width, config.height)));
    if let Some((x, y)) = cursor {
        let picked = scene.pick_worker(target, x, y)?;
        log::info!("Click at ({x}, {y}) selected worker {picked:?}");
    }

    if let Some(path) = snapshot {
        let (image, drawn) = scene.snapshot(registry, target, config.clear_colour)?;
        image
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {drawn} meshes to {}", path.display());
    }

    Ok(())
}
