//! An orbiting camera that always looks at a fixed target.

use cgmath::{Deg, Matrix4, Point3, Rad, Vector3};

/// wgpu expects depth in `[0, 1]`; cgmath produces OpenGL's `[-1, 1]`.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub const MIN_PITCH: Deg<f32> = Deg(5.0);
pub const MAX_PITCH: Deg<f32> = Deg(30.0);

/// Camera on a sphere around `target`, described by pitch (elevation above the
/// ground plane), yaw and distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pitch: Deg<f32>,
    pub yaw: Deg<f32>,
    pub radius: f32,
    pub target: Point3<f32>,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl OrbitCamera {
    pub fn new(pitch: Deg<f32>, yaw: Deg<f32>, radius: f32) -> Self {
        Self {
            pitch: clamp_pitch(pitch),
            yaw,
            radius,
            target: Point3::new(0.0, 0.0, 0.0),
            fovy: Deg(45.0),
            znear: 0.1,
            zfar: 350.0,
        }
    }

    pub fn pitch(&self) -> Deg<f32> {
        self.pitch
    }

    /// Pitch is kept within [`MIN_PITCH`] and [`MAX_PITCH`].
    pub fn set_pitch(&mut self, pitch: Deg<f32>) {
        self.pitch = clamp_pitch(pitch);
    }

    pub fn eye(&self) -> Point3<f32> {
        let phi: Rad<f32> = self.pitch.into();
        let theta: Rad<f32> = self.yaw.into();
        Point3::new(
            self.target.x + self.radius * phi.0.cos() * theta.0.sin(),
            self.target.y + self.radius * phi.0.sin(),
            self.target.z + self.radius * phi.0.cos() * theta.0.cos(),
        )
    }

    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye(), self.target, Vector3::unit_y())
    }

    /// OpenGL-style projection times view, for the software renderer.
    pub fn view_proj(&self, aspect: f32) -> Matrix4<f32> {
        cgmath::perspective(self.fovy, aspect, self.znear, self.zfar) * self.view()
    }
}

/// Projects a world-space point to a cursor position (top-left origin) in a
/// `width` x `height` viewport. `None` if it falls behind the eye or off-screen.
pub fn project_to_cursor(
    view_proj: &Matrix4<f32>,
    point: Vector3<f32>,
    (width, height): (u32, u32),
) -> Option<(u32, u32)> {
    let clip = view_proj * point.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let x = (clip.x / clip.w + 1.0) * 0.5 * width as f32;
    let y = (1.0 - clip.y / clip.w) * 0.5 * height as f32;
    if x < 0.0 || y < 0.0 || x >= width as f32 || y >= height as f32 {
        return None;
    }
    Some((x as u32, y as u32))
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Deg(30.0), Deg(0.0), 200.0)
    }
}

fn clamp_pitch(pitch: Deg<f32>) -> Deg<f32> {
    Deg(pitch.0.clamp(MIN_PITCH.0, MAX_PITCH.0))
}
