//! Object picking through an identification pass.
//!
//! Every selectable object gets a unique identifier colour. To resolve a click
//! the objects are drawn flat in those colours into a [`PickSurface`], the pixel
//! under the cursor is read back and compared against each identifier:
//!
//! 1. clear the surface and draw every object with its identifier colour
//! 2. flush so the read-back sees every draw
//! 3. read one pixel at the cursor, flipping Y since surfaces are bottom-up
//! 4. return the index of the first object whose colour matches
//!
//! The pass overwrites the colour buffer. Callers drawing to a visible frame
//! must re-render the scene afterwards.

use cgmath::Matrix4;

use crate::{
    data_structures::compiled::{BindState, CompiledMesh},
    render::PickSurface,
};

/// Per-channel match tolerance.
pub const PICK_TOLERANCE: f32 = 1.0 / 255.0;
/// Relative tolerance on top of [`PICK_TOLERANCE`], absorbing float rounding.
const PICK_RTOL: f32 = 1e-5;

const BITS_PER_CHANNEL: u32 = 7;
const CHANNEL_MASK: u32 = (1 << BITS_PER_CHANNEL) - 1;
/// Largest id that still fits into three channels.
pub const MAX_PICK_ID: u32 = (1 << (3 * BITS_PER_CHANNEL)) - 1;

/// An identifier colour in `[0, 1]` RGB.
///
/// Ids are packed 7 bits per channel and every byte value is even, so two
/// distinct ids always differ by at least 2/255 in some channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickColor(pub [f32; 3]);

impl PickColor {
    /// Colour for `id`. Id 0 is what a cleared surface reads back as.
    /// `None` past [`MAX_PICK_ID`].
    pub fn from_id(id: u32) -> Option<Self> {
        if id > MAX_PICK_ID {
            return None;
        }
        let channel = |shift: u32| (((id >> shift) & CHANNEL_MASK) * 2) as f32 / 255.0;
        Some(PickColor([
            channel(0),
            channel(BITS_PER_CHANNEL),
            channel(2 * BITS_PER_CHANNEL),
        ]))
    }

    /// Colour of the `index`-th pickable. Never the background colour.
    pub fn for_index(index: usize) -> Option<Self> {
        let id = u32::try_from(index).ok()?.checked_add(1)?;
        Self::from_id(id)
    }

    /// Recovers the id of an identifier colour.
    pub fn id(&self) -> u32 {
        let [r, g, b] = self.to_rgb8();
        let channel = |byte: u8| (u32::from(byte) + 1) / 2;
        channel(r) | channel(g) << BITS_PER_CHANNEL | channel(b) << (2 * BITS_PER_CHANNEL)
    }

    pub fn to_rgb8(&self) -> [u8; 3] {
        self.0.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Whether a read-back pixel is this colour, within [`PICK_TOLERANCE`].
    pub fn matches(&self, pixel: [u8; 3]) -> bool {
        pixel.iter().zip(self.0).all(|(&p, c)| {
            let sampled = f32::from(p) / 255.0;
            (sampled - c).abs() <= PICK_TOLERANCE + PICK_RTOL * c.abs()
        })
    }
}

impl From<PickColor> for [f32; 3] {
    fn from(color: PickColor) -> Self {
        color.0
    }
}

/// A mesh drawn with an identifier colour during the pick pass.
#[derive(Clone, Copy, Debug)]
pub struct Pickable<'a> {
    pub mesh: &'a CompiledMesh,
    pub transform: Matrix4<f32>,
    pub color: PickColor,
}

/// Clears `surface` and draws every object flat in its identifier colour.
pub fn render_for_picking<S: PickSurface + ?Sized>(surface: &mut S, objects: &[Pickable<'_>]) {
    let mut bind = BindState::default();
    surface.clear();
    for object in objects {
        object
            .mesh
            .draw_flat(surface, &object.transform, object.color.0, &mut bind);
    }
}

/// Resolves a cursor position (top-left origin) to the index of the object
/// under it.
///
/// Returns `Ok(None)` when nothing matches or the cursor is outside the surface.
pub fn pick<S: PickSurface + ?Sized>(
    surface: &mut S,
    cursor_x: u32,
    cursor_y: u32,
    objects: &[Pickable<'_>],
) -> anyhow::Result<Option<usize>> {
    let (width, height) = surface.size();
    if cursor_x >= width || cursor_y >= height {
        log::debug!("Cursor ({cursor_x}, {cursor_y}) is outside the {width}x{height} surface");
        return Ok(None);
    }

    render_for_picking(surface, objects);
    surface.flush()?;
    let pixel = surface.read_pixel(cursor_x, height - 1 - cursor_y)?;

    let selected = objects.iter().position(|object| object.color.matches(pixel));
    match selected {
        Some(index) => log::info!("Selected obj with index {index} (pixel {pixel:?})"),
        None => log::info!("Nothing selected at ({cursor_x}, {cursor_y})"),
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use cgmath::SquareMatrix;

    use super::*;
    use crate::render::software::SoftwareTarget;

    #[test]
    fn ids_round_trip_through_bytes() {
        for id in [1, 2, 127, 128, 5000, MAX_PICK_ID] {
            let color = PickColor::from_id(id).expect("in range");
            assert_eq!(color.id(), id);
            assert!(color.matches(color.to_rgb8()));
        }
    }

    #[test]
    fn neighbouring_ids_never_match_each_other() {
        for id in 1..300 {
            let a = PickColor::from_id(id).expect("in range");
            let b = PickColor::from_id(id + 1).expect("in range");
            assert!(!a.matches(b.to_rgb8()), "{id} matched {}", id + 1);
        }
    }

    #[test]
    fn background_matches_no_pickable() {
        assert_eq!(PickColor::from_id(0).expect("in range").to_rgb8(), [0, 0, 0]);
        for index in 0..64 {
            assert!(!PickColor::for_index(index).expect("in range").matches([0, 0, 0]));
        }
    }

    #[test]
    fn ids_past_the_last_colour_are_rejected() {
        assert!(PickColor::from_id(MAX_PICK_ID + 1).is_none());
        let last = MAX_PICK_ID as usize - 1;
        assert_eq!(PickColor::for_index(last).map(|c| c.id()), Some(MAX_PICK_ID));
        assert!(PickColor::for_index(last + 1).is_none());
        // would wrap to id 1 if truncated to 32 bits
        assert!(PickColor::for_index(u32::MAX as usize).is_none());
        assert!(PickColor::for_index(usize::MAX).is_none());
    }

    #[test]
    fn one_step_off_is_still_a_match() {
        let color = PickColor::from_id(3).expect("in range");
        let [r, g, b] = color.to_rgb8();
        assert!(color.matches([r + 1, g, b]));
        assert!(!color.matches([r + 2, g, b]));
    }

    #[test]
    fn cursor_outside_the_surface_selects_nothing() {
        let cube = CompiledMesh::cube("proxy", 1.0);
        let objects = [Pickable {
            mesh: &cube,
            transform: Matrix4::identity(),
            color: PickColor::for_index(0).expect("in range"),
        }];
        let mut surface = SoftwareTarget::new(8, 8);
        assert_eq!(pick(&mut surface, 8, 0, &objects).expect("pick"), None);
        assert_eq!(pick(&mut surface, 0, 8, &objects).expect("pick"), None);
    }

    #[test]
    fn picks_the_object_under_the_cursor() {
        // Two cubes side by side in clip space: left half and right half.
        let left = CompiledMesh::cube("left", 0.5);
        let right = CompiledMesh::cube("right", 0.5);
        let objects = [
            Pickable {
                mesh: &left,
                transform: Matrix4::from_translation(cgmath::Vector3::new(-0.5, 0.0, 0.0)),
                color: PickColor::for_index(0).expect("in range"),
            },
            Pickable {
                mesh: &right,
                transform: Matrix4::from_translation(cgmath::Vector3::new(0.5, 0.0, 0.0)),
                color: PickColor::for_index(1).expect("in range"),
            },
        ];
        let mut surface = SoftwareTarget::new(40, 40);
        assert_eq!(pick(&mut surface, 10, 20, &objects).expect("pick"), Some(0));
        assert_eq!(pick(&mut surface, 30, 20, &objects).expect("pick"), Some(1));
        // above both quads
        assert_eq!(pick(&mut surface, 20, 2, &objects).expect("pick"), None);
    }
}
