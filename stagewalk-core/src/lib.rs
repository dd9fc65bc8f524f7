//! Stagewalk simulation core.
//!
//! Platform-independent pieces of a walkable 3D stage: a scene graph the
//! host renders, a small rigid-body world, particle emitters, collision
//! notes and the frame loop tying them together in a [`Session`].

pub mod assets;
pub mod audio;
pub mod config;
pub mod emitter;
pub mod error;
mod handle;
pub mod math;
pub mod physics;
pub mod player;
pub mod registry;
pub mod render;
pub mod session;
pub mod stage;

pub use assets::{AssetLoad, AssetSender, ImmediateModels, LoadPoll, ModelAsset, ModelSource};
pub use audio::{AudioSink, NoteTrigger, SilentSink, SoundId};
pub use config::SessionConfig;
pub use emitter::{Emitter, EmitterConfig, EmitterId, ParticleShape, SpawnSource};
pub use error::{AssetError, AudioError, StageError};
pub use handle::Handle;
pub use physics::{BodyHandle, PhysicsWorld};
pub use player::PlayerInput;
pub use registry::{EntityKind, EntityRegistry};
pub use render::{InstanceRecord, RenderHandle, SceneGraph, INSTANCE_FLOATS};
pub use session::{FrameStats, Session};
pub use stage::{StageDef, BUILTIN_STAGES};
