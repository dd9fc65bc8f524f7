//! Scene graph of visual primitives.
//!
//! The core never draws anything itself. The host renderer consumes
//! [`SceneGraph::snapshot`] once per frame and owns every GPU resource.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::handle::{define_handle, Handle, HandleStore};

define_handle!(
    /// Handle to a node in the [`SceneGraph`].
    RenderHandle
);

/// 8-bit sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([0xff, 0xff, 0xff]);
    pub const GOLD: Rgb = Rgb([0xff, 0xd7, 0x00]);

    pub fn from_hex(hex: u32) -> Self {
        Rgb([(hex >> 16) as u8, (hex >> 8) as u8, hex as u8])
    }

    pub fn hex(self) -> u32 {
        let [r, g, b] = self.0;
        (r as u32) << 16 | (g as u32) << 8 | b as u32
    }

    pub fn to_f32(self) -> [f32; 3] {
        let [r, g, b] = self.0;
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleStyle {
    Square,
    Rounded { corner_radius: f32, tail_size: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Ambient { intensity: f32 },
    Hemisphere { ground: Rgb, intensity: f32 },
    Directional { intensity: f32 },
}

/// What a node draws. Text and bubbles carry their content; rasterizing
/// them is the host's job.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Sphere { radius: f32 },
    Cuboid { size: Vec3 },
    Ground { width: f32, depth: f32, texture: String, repeat: [f32; 2] },
    Text { text: String, size: f32 },
    Bubble { text: String, size: f32, style: BubbleStyle, background: [f32; 4] },
    Model { url: String },
    Tube { points: Vec<Vec3>, radius: f32 },
    Light(Light),
    /// Cube map background, faces ordered +x, -x, +y, -y, +z, -z.
    Skybox { faces: [String; 6] },
}

impl Primitive {
    /// Stable numeric tag used in [`InstanceRecord::kind`].
    pub fn kind_tag(&self) -> u32 {
        match self {
            Primitive::Sphere { .. } => 0,
            Primitive::Cuboid { .. } => 1,
            Primitive::Ground { .. } => 2,
            Primitive::Text { .. } => 3,
            Primitive::Bubble { .. } => 4,
            Primitive::Model { .. } => 5,
            Primitive::Tube { .. } => 6,
            Primitive::Light(_) => 7,
            Primitive::Skybox { .. } => 8,
        }
    }

    /// Uniform extent used by the snapshot: radius for spheres, edge
    /// lengths for boxes, and 1.0 for everything scaled by its transform.
    fn extent(&self) -> Vec3 {
        match self {
            Primitive::Sphere { radius } => Vec3::splat(*radius),
            Primitive::Cuboid { size } => *size,
            Primitive::Ground { width, depth, .. } => Vec3::new(*width, 0.0, *depth),
            Primitive::Text { size, .. } | Primitive::Bubble { size, .. } => {
                Vec3::new(size * 4.0, size * 2.0, 0.0)
            }
            Primitive::Tube { radius, .. } => Vec3::splat(*radius),
            Primitive::Model { .. } | Primitive::Light(_) | Primitive::Skybox { .. } => Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub primitive: Primitive,
    pub transform: Transform,
    pub color: Rgb,
    pub cast_shadow: bool,
    pub visible: bool,
}

impl SceneNode {
    pub fn new(primitive: Primitive, position: Vec3, color: Rgb) -> Self {
        Self {
            primitive,
            transform: Transform::from_position(position),
            color,
            cast_shadow: true,
            visible: true,
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }
}

/// Flat per-node record handed to the host renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRecord {
    /// Node handle as `[low 16 bits, remaining bits]`. Both halves stay
    /// exact in f32 up to 2^40 handles; the host rebuilds the id as
    /// `high * 65536 + low`.
    pub handle: [f32; 2],
    pub kind: f32,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub extent: [f32; 3],
    pub color: [f32; 3],
}

/// Floats per [`InstanceRecord`] when viewed as `&[f32]`.
pub const INSTANCE_FLOATS: usize = std::mem::size_of::<InstanceRecord>() / 4;

const HANDLE_SPLIT: u64 = 1 << 16;

fn split_handle(raw: u64) -> [f32; 2] {
    [(raw % HANDLE_SPLIT) as f32, (raw / HANDLE_SPLIT) as f32]
}

impl InstanceRecord {
    /// The node handle this record was taken from.
    pub fn render_handle(&self) -> RenderHandle {
        let [low, high] = self.handle;
        RenderHandle::from_raw(high as u64 * HANDLE_SPLIT + low as u64)
    }
}

#[derive(Default)]
pub struct SceneGraph {
    nodes: HandleStore<RenderHandle, SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) -> RenderHandle {
        self.nodes.insert(node)
    }

    pub fn remove(&mut self, handle: RenderHandle) -> Option<SceneNode> {
        self.nodes.remove(handle)
    }

    pub fn get(&self, handle: RenderHandle) -> Option<&SceneNode> {
        self.nodes.get(handle)
    }

    pub fn get_mut(&mut self, handle: RenderHandle) -> Option<&mut SceneNode> {
        self.nodes.get_mut(handle)
    }

    pub fn contains(&self, handle: RenderHandle) -> bool {
        self.nodes.contains(handle)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visible nodes in creation order, flattened for the renderer.
    ///
    /// Text, bubbles, models, tubes and ground planes also need their
    /// content; hosts fetch those once per handle through [`Self::get`].
    pub fn snapshot(&self) -> Vec<InstanceRecord> {
        self.nodes
            .sorted_handles()
            .into_iter()
            .filter_map(|h| self.nodes.get(h).map(|n| (h, n)))
            .filter(|(_, n)| n.visible)
            .map(|(h, n)| InstanceRecord {
                handle: split_handle(h.raw()),
                kind: n.primitive.kind_tag() as f32,
                position: n.transform.position.to_array(),
                rotation: n.transform.rotation.to_array(),
                scale: n.transform.scale.to_array(),
                extent: n.primitive.extent().to_array(),
                color: n.color.to_f32(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_hex_roundtrip() {
        let c = Rgb::from_hex(0xff8800);
        assert_eq!(c.0, [0xff, 0x88, 0x00]);
        assert_eq!(c.hex(), 0xff8800);
    }

    #[test]
    fn test_add_remove_node() {
        let mut scene = SceneGraph::new();
        let h = scene.add(SceneNode::new(Primitive::Sphere { radius: 0.5 }, Vec3::Y, Rgb::WHITE));
        assert!(scene.contains(h));
        assert_eq!(scene.len(), 1);
        assert!(scene.remove(h).is_some());
        assert!(scene.remove(h).is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_snapshot_skips_hidden_and_keeps_order() {
        let mut scene = SceneGraph::new();
        let a = scene.add(SceneNode::new(Primitive::Sphere { radius: 1.0 }, Vec3::ZERO, Rgb::WHITE));
        let mut hidden = SceneNode::new(Primitive::Cuboid { size: Vec3::splat(0.01) }, Vec3::ZERO, Rgb::WHITE);
        hidden.visible = false;
        scene.add(hidden);
        let c = scene.add(SceneNode::new(
            Primitive::Cuboid { size: Vec3::ONE },
            Vec3::new(1.0, 2.0, 3.0),
            Rgb::from_hex(0xff0000),
        ));

        let snap = scene.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].render_handle(), a);
        assert_eq!(snap[1].render_handle(), c);
        assert_eq!(snap[1].position, [1.0, 2.0, 3.0]);
        assert_eq!(snap[1].color, [1.0, 0.0, 0.0]);
        assert_eq!(snap[1].kind, 1.0);
    }

    #[test]
    fn test_handles_past_f32_precision_stay_exact() {
        for raw in [(1u64 << 24) + 1, (1u64 << 24) + 3, (1u64 << 32) + 12345] {
            let rec = InstanceRecord {
                handle: split_handle(raw),
                ..<InstanceRecord as bytemuck::Zeroable>::zeroed()
            };
            assert_eq!(rec.render_handle().raw(), raw);
            let [low, high] = rec.handle;
            assert_eq!(high as f64 * 65536.0 + low as f64, raw as f64);
        }
        assert_ne!(split_handle((1 << 24) + 1), split_handle(1 << 24));
    }

    #[test]
    fn test_instance_record_is_float_aligned() {
        assert_eq!(std::mem::size_of::<InstanceRecord>() % 4, 0);
        let rec: InstanceRecord = bytemuck::Zeroable::zeroed();
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&rec));
        assert_eq!(floats.len(), INSTANCE_FLOATS);
    }
}
