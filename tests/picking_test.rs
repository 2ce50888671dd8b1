use santorini_ngin::{
    Board, Player, PickSurface,
    camera::{OrbitCamera, project_to_cursor},
    pick::{PickColor, Pickable, pick},
    render::software::SoftwareTarget,
    scene::Scene,
};

use crate::common::test_utils::{init_logger, load_board};

mod common;

const WIDTH: u32 = 600;
const HEIGHT: u32 = 400;

fn scene_with_workers_at(cells: [(usize, usize); 2], board: Board) -> Scene {
    let mut player = Player::new();
    for (n, cell) in cells.into_iter().enumerate() {
        player.set_active_worker(n);
        player.move_active(cell, &board);
    }
    player.clear_active_worker();
    Scene::new(board, player)
}

fn cursor_on_worker(scene: &Scene, n: usize, camera: &OrbitCamera) -> (u32, u32) {
    let view_proj = camera.view_proj(WIDTH as f32 / HEIGHT as f32);
    let centre = scene.worker_centre(n).expect("worker is placed");
    project_to_cursor(&view_proj, centre, (WIDTH, HEIGHT)).expect("worker is on screen")
}

#[test]
fn should_select_the_worker_under_the_cursor() {
    init_logger();
    let mut board = Board::new();
    board.build(4, 4);
    board.build(4, 4);
    let mut scene = scene_with_workers_at([(0, 0), (4, 4)], board);

    let camera = OrbitCamera::default();
    let mut target = SoftwareTarget::new(WIDTH, HEIGHT);
    target.set_view_proj(camera.view_proj(WIDTH as f32 / HEIGHT as f32));

    for n in [1, 0] {
        let (x, y) = cursor_on_worker(&scene, n, &camera);
        assert_eq!(scene.pick_worker(&mut target, x, y).expect("pick"), Some(n));
        assert_eq!(scene.player.active_worker(), Some(n));
    }

    // top-left corner is sky
    assert_eq!(scene.pick_worker(&mut target, 0, 0).expect("pick"), None);
    assert_eq!(scene.player.active_worker(), Some(0));
}

#[test]
fn should_leave_identifier_colours_unshaded() {
    init_logger();
    let scene = scene_with_workers_at([(1, 3), (3, 1)], Board::new());
    let camera = OrbitCamera::default();
    let mut target = SoftwareTarget::new(WIDTH, HEIGHT);
    target.set_view_proj(camera.view_proj(WIDTH as f32 / HEIGHT as f32));

    let objects: Vec<Pickable<'_>> = scene
        .worker_pickables()
        .into_iter()
        .map(|(_, pickable)| pickable)
        .collect();
    for (k, object) in objects.iter().enumerate() {
        let (x, y) = cursor_on_worker(&scene, k, &camera);
        assert_eq!(pick(&mut target, x, y, &objects).expect("pick"), Some(k));
        let pixel = target.read_pixel(x, HEIGHT - 1 - y).expect("in range");
        assert_eq!(pixel, object.color.to_rgb8());
        assert_eq!(Some(object.color), PickColor::for_index(k));
    }
}

#[test]
fn should_render_the_board_after_a_pick_pass() {
    let (registry, textures) = load_board();
    let mut board = Board::new();
    board.build(2, 2);
    let mut scene = scene_with_workers_at([(0, 0), (2, 2)], board);

    let camera = OrbitCamera::default();
    let mut target = SoftwareTarget::new(WIDTH, HEIGHT).with_textures(&textures);
    target.set_view_proj(camera.view_proj(WIDTH as f32 / HEIGHT as f32));

    let (x, y) = cursor_on_worker(&scene, 1, &camera);
    assert_eq!(scene.pick_worker(&mut target, x, y).expect("pick"), Some(1));

    let sky = [0.45, 0.7, 0.9, 1.0];
    let (image, drawn) = scene.snapshot(&registry, &mut target, sky).expect("snapshot");
    // terrain, one level and two workers
    assert_eq!(drawn, 4);

    let [r, g, b, a] = sky.map(|c: f64| (c * 255.0).round() as u8);
    assert_eq!(image.get_pixel(0, 0).0, [r, g, b, a]);
    // the worker is drawn where it was picked
    assert_ne!(image.get_pixel(x, y).0, [r, g, b, a]);
}
