//! Stage definitions and the built-in stages.
//!
//! A stage is plain data: it deserializes from TOML and is instantiated
//! into a [`Session`] by [`StageDef::build`].

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::assets::ModelSource;
use crate::audio::SoundId;
use crate::emitter::{EmitterConfig, ParticleShape, SpawnSource, DEFAULT_LIFESPAN, DEFAULT_SPEED};
use crate::error::StageError;
use crate::math::{ring_point, spiral_points};
use crate::physics::{Collider, RigidBody};
use crate::registry::EntityKind;
use crate::render::{BubbleStyle, Light, Primitive, Rgb, SceneNode};
use crate::session::{PendingModel, Session};

pub const BUILTIN_STAGES: &[&str] = &["stage1", "stage2", "test"];

const PROP_DAMPING: f32 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LightDef {
    Ambient {
        color: u32,
        intensity: f32,
    },
    Hemisphere {
        sky: u32,
        ground: u32,
        intensity: f32,
        position: Vec3,
    },
    Directional {
        color: u32,
        intensity: f32,
        position: Vec3,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundDef {
    pub texture: String,
    pub width: f32,
    pub depth: f32,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default = "unit_repeat")]
    pub repeat: [f32; 2],
}

fn unit_repeat() -> [f32; 2] {
    [1.0, 1.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDef {
    pub url: String,
    pub position: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    /// XYZ Euler angles in radians.
    #[serde(default)]
    pub rotation: Vec3,
    /// Spin about Y in radians per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_rotate: Option<f32>,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleDef {
    pub style: BubbleStyle,
    /// RGBA, each channel in `[0, 1]`.
    pub background: [f32; 4],
}

/// Floating text, optionally drawn inside a speech bubble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDef {
    pub text: String,
    pub position: Vec3,
    #[serde(default = "one")]
    pub size: f32,
    #[serde(default = "white")]
    pub color: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bubble: Option<BubbleDef>,
}

fn one() -> f32 {
    1.0
}

fn white() -> u32 {
    Rgb::WHITE.hex()
}

/// A free-standing prop. Zero mass makes it immovable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDef {
    pub shape: ParticleShape,
    pub position: Vec3,
    pub color: u32,
    #[serde(default = "one")]
    pub mass: f32,
    #[serde(default = "prop_damping")]
    pub damping: f32,
}

fn prop_damping() -> f32 {
    PROP_DAMPING
}

/// A shape that is only drawn. Nothing collides with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorDef {
    pub shape: ParticleShape,
    pub position: Vec3,
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiralDef {
    pub turns: f32,
    pub height: f32,
    pub radius: f32,
    pub segments: u32,
    #[serde(default)]
    pub start_y: f32,
    #[serde(default)]
    pub origin: Vec3,
    #[serde(default = "tube_radius")]
    pub tube_radius: f32,
    #[serde(default = "gold")]
    pub color: u32,
}

fn tube_radius() -> f32 {
    0.1
}

fn gold() -> u32 {
    Rgb::GOLD.hex()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PianoKeyDef {
    pub note: String,
    pub position: Vec3,
    #[serde(default = "key_size")]
    pub size: Vec3,
    #[serde(default = "white")]
    pub color: u32,
    /// Overrides the piano's shared sound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

fn key_size() -> Vec3 {
    Vec3::new(1.0, 0.2, 2.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PianoDef {
    /// Sound played by every key without its own.
    pub sound: String,
    pub keys: Vec<PianoKeyDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathDef {
    /// Spawn points circle `center` at `angular_speed` rad/s of emitter time.
    Ring {
        center: Vec3,
        radius: f32,
        angular_speed: f32,
    },
}

impl PathDef {
    fn spawn_source(self) -> SpawnSource {
        match self {
            PathDef::Ring {
                center,
                radius,
                angular_speed,
            } => SpawnSource::Path(Box::new(move |t, _live| {
                ring_point(center, radius, t * angular_speed)
            })),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterDef {
    /// Fixed spawn point. Ignored when `path` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathDef>,
    /// Spawns per second. Falls back to the session's default rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_lifespan")]
    pub lifespan: f32,
    #[serde(default)]
    pub shape: ParticleShape,
}

fn default_speed() -> f32 {
    DEFAULT_SPEED
}

fn default_lifespan() -> f32 {
    DEFAULT_LIFESPAN
}

impl EmitterDef {
    pub fn config(&self, default_rate: f32) -> EmitterConfig {
        EmitterConfig {
            rate: self.rate.unwrap_or(default_rate),
            speed: self.speed,
            lifespan: self.lifespan,
            shape: self.shape,
        }
    }

    fn spawn_source(&self) -> SpawnSource {
        match (self.path, self.origin) {
            (Some(path), _) => path.spawn_source(),
            (None, Some(origin)) => SpawnSource::Point(origin),
            (None, None) => SpawnSource::Point(Vec3::Y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageDef {
    pub name: String,
    /// Cube map faces, ordered +x, -x, +y, -y, +z, -z.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skybox: Option<[String; 6]>,
    pub lights: Vec<LightDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground: Option<GroundDef>,
    pub models: Vec<ModelDef>,
    pub labels: Vec<LabelDef>,
    pub props: Vec<PropDef>,
    pub decor: Vec<DecorDef>,
    pub spirals: Vec<SpiralDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piano: Option<PianoDef>,
    pub emitters: Vec<EmitterDef>,
}

/// Counts of what [`StageDef::build`] created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub nodes: usize,
    pub bodies: usize,
    pub models_requested: usize,
    pub piano_keys: usize,
    pub emitters: usize,
}

impl StageDef {
    pub fn from_toml(source: &str) -> Result<Self, StageError> {
        Ok(toml::from_str(source)?)
    }

    pub fn to_toml(&self) -> Result<String, StageError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Look up a built-in stage by name.
    pub fn builtin(name: &str) -> Result<Self, StageError> {
        match name {
            "stage1" => Ok(stage1()),
            "stage2" => Ok(stage2()),
            "test" => Ok(test_stage()),
            other => Err(StageError::UnknownStage(other.to_string())),
        }
    }

    /// Every sound a piano in this stage can play.
    pub fn sound_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        if let Some(piano) = &self.piano {
            let all = std::iter::once(&piano.sound).chain(piano.keys.iter().filter_map(|k| k.sound.as_ref()));
            for url in all {
                if !urls.contains(url) {
                    urls.push(url.clone());
                }
            }
        }
        urls
    }

    /// Reject definitions that could never render or play.
    pub fn validate(&self) -> Result<(), StageError> {
        let invalid = |reason: String| StageError::Invalid {
            stage: self.name.clone(),
            reason,
        };
        if let Some(ground) = &self.ground {
            if ground.width <= 0.0 || ground.depth <= 0.0 {
                return Err(invalid(format!(
                    "ground must have positive size, got {}x{}",
                    ground.width, ground.depth
                )));
            }
        }
        if let Some(skybox) = &self.skybox {
            if let Some(i) = skybox.iter().position(String::is_empty) {
                return Err(invalid(format!("skybox face #{i} has no texture")));
            }
        }
        if let Some(i) = self.models.iter().position(|m| m.url.is_empty()) {
            return Err(invalid(format!("model #{i} has no url")));
        }
        if let Some(i) = self.labels.iter().position(|l| l.text.is_empty()) {
            return Err(invalid(format!("label #{i} has no text")));
        }
        if let Some(piano) = &self.piano {
            if piano.sound.is_empty() {
                return Err(invalid("piano has no sound".into()));
            }
            if let Some(i) = piano.keys.iter().position(|k| k.note.is_empty()) {
                return Err(invalid(format!("piano key #{i} has no note")));
            }
        }
        Ok(())
    }

    /// Instantiate the stage into `session`. Model files are requested
    /// from `models` and appear once their loads resolve.
    pub fn build(&self, session: &mut Session, models: &mut dyn ModelSource) -> Result<BuildSummary, StageError> {
        self.validate()?;
        let nodes_before = session.scene.len();
        let bodies_before = session.physics.len();
        let mut summary = BuildSummary::default();

        if let Some(faces) = &self.skybox {
            let mut node = SceneNode::new(Primitive::Skybox { faces: faces.clone() }, Vec3::ZERO, Rgb::WHITE);
            node.cast_shadow = false;
            session.spawn_entity(node, None, EntityKind::Marker);
        }

        for light in &self.lights {
            let node = light.node();
            session.spawn_entity(node, None, EntityKind::Marker);
        }

        if let Some(ground) = &self.ground {
            let body = session.physics.add_body(RigidBody::fixed(
                Collider::Plane {
                    normal: Vec3::Y,
                    offset: ground.position.y,
                },
                ground.position,
            ));
            let node = SceneNode::new(
                Primitive::Ground {
                    width: ground.width,
                    depth: ground.depth,
                    texture: ground.texture.clone(),
                    repeat: ground.repeat,
                },
                ground.position,
                Rgb::WHITE,
            );
            session.spawn_entity(node, Some(body), EntityKind::Scenery);
        }

        for model in &self.models {
            let load = models.request(&model.url);
            let node = SceneNode::new(Primitive::Model { url: model.url.clone() }, model.position, Rgb::WHITE)
                .with_rotation(euler_xyz(model.rotation))
                .with_scale(model.scale);
            session.request_model(PendingModel {
                load,
                node,
                euler: model.rotation,
                auto_rotate: model.auto_rotate,
            });
            summary.models_requested += 1;
        }

        for label in &self.labels {
            let primitive = match &label.bubble {
                None => Primitive::Text {
                    text: label.text.clone(),
                    size: label.size,
                },
                Some(bubble) => Primitive::Bubble {
                    text: label.text.clone(),
                    size: label.size,
                    style: bubble.style,
                    background: bubble.background,
                },
            };
            let mut node = SceneNode::new(primitive, label.position, Rgb::from_hex(label.color));
            node.cast_shadow = false;
            session.spawn_entity(node, None, EntityKind::Marker);
        }

        for prop in &self.props {
            let collider = prop.shape.collider();
            let body = if prop.mass > 0.0 {
                RigidBody::dynamic(collider, prop.mass, prop.position).with_damping(prop.damping, prop.damping)
            } else {
                RigidBody::fixed(collider, prop.position)
            };
            let body = session.physics.add_body(body);
            let node = SceneNode::new(prop.shape.primitive(), prop.position, Rgb::from_hex(prop.color));
            session.spawn_entity(node, Some(body), EntityKind::Prop);
        }

        for decor in &self.decor {
            let node = SceneNode::new(decor.shape.primitive(), decor.position, Rgb::from_hex(decor.color));
            session.spawn_entity(node, None, EntityKind::Marker);
        }

        for spiral in &self.spirals {
            let points = spiral_points(
                spiral.turns,
                spiral.height,
                spiral.radius,
                spiral.segments,
                spiral.start_y,
                spiral.origin,
            );
            let node = SceneNode::new(
                Primitive::Tube {
                    points,
                    radius: spiral.tube_radius,
                },
                Vec3::ZERO,
                Rgb::from_hex(spiral.color),
            );
            session.spawn_entity(node, None, EntityKind::Marker);
        }

        if let Some(piano) = &self.piano {
            for key in &piano.keys {
                let body = session.physics.add_body(RigidBody::fixed(
                    Collider::Cuboid {
                        half_extents: key.size / 2.0,
                    },
                    key.position,
                ));
                let node = SceneNode::new(Primitive::Cuboid { size: key.size }, key.position, Rgb::from_hex(key.color));
                session.spawn_entity(node, Some(body), EntityKind::PianoKey { note: key.note.clone() });
                let sound = key.sound.as_deref().unwrap_or(&piano.sound);
                session.attach_note(body, SoundId::new(sound));
                summary.piano_keys += 1;
            }
        }

        let default_rate = session.config().default_emitter_rate;
        for emitter in &self.emitters {
            session.add_emitter(emitter.spawn_source(), emitter.config(default_rate));
            summary.emitters += 1;
        }

        summary.nodes = session.scene.len() - nodes_before;
        summary.bodies = session.physics.len() - bodies_before;
        log::info!(
            "built stage '{}': {} nodes, {} bodies, {} models pending, {} emitters",
            self.name,
            summary.nodes,
            summary.bodies,
            summary.models_requested,
            summary.emitters
        );
        Ok(summary)
    }
}

impl LightDef {
    fn node(&self) -> SceneNode {
        let (light, color, position) = match *self {
            LightDef::Ambient { color, intensity } => (Light::Ambient { intensity }, color, Vec3::ZERO),
            LightDef::Hemisphere {
                sky,
                ground,
                intensity,
                position,
            } => (
                Light::Hemisphere {
                    ground: Rgb::from_hex(ground),
                    intensity,
                },
                sky,
                position,
            ),
            LightDef::Directional {
                color,
                intensity,
                position,
            } => (Light::Directional { intensity }, color, position),
        };
        SceneNode::new(Primitive::Light(light), position, Rgb::from_hex(color))
    }
}

fn euler_xyz(e: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, e.x, e.y, e.z)
}

fn ring_emitter(center: Vec3, radius: f32, angular_speed: f32) -> EmitterDef {
    EmitterDef {
        origin: None,
        path: Some(PathDef::Ring {
            center,
            radius,
            angular_speed,
        }),
        rate: Some(8.0),
        speed: 6.0,
        lifespan: 4.0,
        shape: ParticleShape::cube(),
    }
}

fn fountain(origin: Vec3) -> EmitterDef {
    EmitterDef {
        origin: Some(origin),
        path: None,
        rate: Some(10.0),
        speed: 4.0,
        lifespan: 3.0,
        shape: ParticleShape::sphere(),
    }
}

fn sky() -> [String; 6] {
    ["px", "nx", "py", "ny", "pz", "nz"].map(|face| format!("assets/sky/{face}.jpg"))
}

fn model(url: &str, position: Vec3, scale: f32, rotation: Vec3) -> ModelDef {
    ModelDef {
        url: url.to_string(),
        position,
        scale: Vec3::splat(scale),
        rotation,
        auto_rotate: None,
    }
}

/// The full demo: models, labels, spirals, props, a piano and four emitters.
fn stage1() -> StageDef {
    use std::f32::consts::{FRAC_PI_3, PI};

    let mut models = vec![
        ModelDef {
            auto_rotate: Some(1.5),
            ..model("assets/models/optimus.glb", Vec3::new(0.0, 0.0, -15.0), 0.25, Vec3::new(0.0, FRAC_PI_3, 0.0))
        },
        model("assets/models/optimus.glb", Vec3::new(0.0, 0.0, -45.0), 2.0, Vec3::ZERO),
        model("assets/models/optimus.glb", Vec3::new(0.0, 0.0, -75.0), 2.0, Vec3::ZERO),
    ];
    for i in (0..50).step_by(5) {
        let z = 2.5 - i as f32;
        models.push(model("assets/models/takio.glb", Vec3::new(2.5, 0.65, z), 0.5, Vec3::new(0.0, PI, PI)));
        models.push(model("assets/models/takio.glb", Vec3::new(-2.5, -0.65, z), 0.5, Vec3::ZERO));
    }

    let mut keys = vec![PianoKeyDef {
        note: "slab".into(),
        position: Vec3::new(0.0, 0.1, 0.0),
        size: Vec3::new(2.0, 0.2, 2.0),
        color: 0x999999,
        sound: None,
    }];
    for (i, note) in ["c4", "d4", "e4", "f4", "g4", "a4", "b4"].iter().enumerate() {
        keys.push(PianoKeyDef {
            note: note.to_string(),
            position: Vec3::new(-3.3 + i as f32 * 1.1, 0.1, 8.0),
            size: key_size(),
            color: 0xffffff,
            sound: None,
        });
    }

    StageDef {
        name: "stage1".into(),
        skybox: Some(sky()),
        lights: vec![
            LightDef::Ambient {
                color: 0xffffff,
                intensity: 0.7,
            },
            LightDef::Hemisphere {
                sky: 0xffffff,
                ground: 0x444444,
                intensity: 0.3,
                position: Vec3::new(0.0, 50.0, 0.0),
            },
            LightDef::Directional {
                color: 0xffffff,
                intensity: 0.5,
                position: Vec3::new(10.0, 20.0, 10.0),
            },
        ],
        ground: Some(GroundDef {
            texture: "assets/textures/asphalt.jpg".into(),
            width: 100.0,
            depth: 100.0,
            position: Vec3::ZERO,
            repeat: [20.0, 20.0],
        }),
        models,
        labels: vec![
            LabelDef {
                text: "ハローワールド！".into(),
                position: Vec3::new(0.0, 2.0, -2.0),
                size: 1.0,
                color: 0xffff00,
                bubble: None,
            },
            LabelDef {
                text: "Let’s enjoy!".into(),
                position: Vec3::new(0.0, 3.0, -5.0),
                size: 1.0,
                color: 0xffffff,
                bubble: Some(BubbleDef {
                    style: BubbleStyle::Square,
                    background: [0.0, 0.0, 0.0, 0.8],
                }),
            },
            LabelDef {
                text: "こんにちは！".into(),
                position: Vec3::new(10.0, 10.0, -5.0),
                size: 0.8,
                color: 0x000000,
                bubble: Some(BubbleDef {
                    style: BubbleStyle::Rounded {
                        corner_radius: 30.0,
                        tail_size: 15.0,
                    },
                    background: [1.0, 1.0, 1.0, 0.9],
                }),
            },
        ],
        props: vec![
            PropDef {
                shape: ParticleShape::Cube { size: 1.0 },
                position: Vec3::new(-3.0, 0.5, 3.0),
                color: 0xff0000,
                mass: 1.0,
                damping: PROP_DAMPING,
            },
            PropDef {
                shape: ParticleShape::Sphere { radius: 0.5 },
                position: Vec3::new(3.0, 2.0, 3.0),
                color: 0x0000ff,
                mass: 1.0,
                damping: PROP_DAMPING,
            },
            PropDef {
                shape: ParticleShape::Cube { size: 1.0 },
                position: Vec3::new(2.0, 1.5, 0.0),
                color: 0xff0000,
                mass: 1.0,
                damping: 0.01,
            },
            PropDef {
                shape: ParticleShape::Sphere { radius: 0.7 },
                position: Vec3::new(-2.0, 1.7, 0.0),
                color: 0x0000ff,
                mass: 1.0,
                damping: 0.01,
            },
            PropDef {
                shape: ParticleShape::Sphere { radius: 0.2 },
                position: Vec3::new(0.0, 5.0, 0.0),
                color: 0xff0000,
                mass: 1.0,
                damping: 0.01,
            },
        ],
        spirals: vec![
            SpiralDef {
                turns: 6.0,
                height: 12.0,
                radius: 2.0,
                segments: 300,
                start_y: 0.0,
                origin: Vec3::new(0.0, 100.0, -5.0),
                tube_radius: 0.1,
                color: gold(),
            },
            SpiralDef {
                turns: 6.0,
                height: 10.0,
                radius: 0.5,
                segments: 300,
                start_y: 0.0,
                origin: Vec3::ZERO,
                tube_radius: 0.1,
                color: gold(),
            },
        ],
        piano: Some(PianoDef {
            sound: "assets/sounds/piano_note.wav".into(),
            keys,
        }),
        emitters: vec![
            ring_emitter(Vec3::new(0.0, 6.0, 0.0), 2.0, 1.5),
            ring_emitter(Vec3::new(0.0, 6.0, 0.0), 3.0, 1.0),
            fountain(Vec3::new(0.0, 6.0, 0.0)),
            fountain(Vec3::new(-5.0, 6.0, 0.0)),
        ],
        decor: Vec::new(),
    }
}

/// Sample stage: one model, a static cube and a title.
fn stage2() -> StageDef {
    StageDef {
        name: "stage2".into(),
        skybox: Some(sky()),
        lights: vec![
            LightDef::Hemisphere {
                sky: 0xffe0bd,
                ground: 0x223322,
                intensity: 0.8,
                position: Vec3::new(0.0, 50.0, 0.0),
            },
            LightDef::Directional {
                color: 0xffee88,
                intensity: 0.6,
                position: Vec3::new(-10.0, 15.0, 5.0),
            },
        ],
        ground: Some(GroundDef {
            texture: "assets/textures/stone.jpg".into(),
            width: 50.0,
            depth: 50.0,
            position: Vec3::ZERO,
            repeat: [10.0, 10.0],
        }),
        models: vec![model("assets/models/optimus.glb", Vec3::new(-3.0, 0.0, 0.0), 0.8, Vec3::ZERO)],
        labels: vec![LabelDef {
            text: "サンプルステージ".into(),
            position: Vec3::new(0.0, 3.0, 0.0),
            size: 1.5,
            color: 0xff00ff,
            bubble: None,
        }],
        decor: vec![DecorDef {
            shape: ParticleShape::Cube { size: 2.0 },
            position: Vec3::new(0.0, 0.5, 3.0),
            color: 0x00ffff,
        }],
        ..StageDef::default()
    }
}

fn test_stage() -> StageDef {
    StageDef {
        name: "test".into(),
        skybox: Some(sky()),
        lights: vec![LightDef::Hemisphere {
            sky: 0x888888,
            ground: 0x333333,
            intensity: 1.0,
            position: Vec3::new(0.0, 50.0, 0.0),
        }],
        ground: Some(GroundDef {
            texture: "assets/textures/testground.jpg".into(),
            width: 50.0,
            depth: 50.0,
            position: Vec3::ZERO,
            repeat: [5.0, 5.0],
        }),
        labels: vec![LabelDef {
            text: "Test".into(),
            position: Vec3::new(0.0, 2.0, 0.0),
            size: 1.0,
            color: 0xffffff,
            bubble: None,
        }],
        decor: vec![DecorDef {
            shape: ParticleShape::Cube { size: 1.0 },
            position: Vec3::new(0.0, 0.5, 0.0),
            color: 0xffff00,
        }],
        ..StageDef::default()
    }
}
