//! One running stage and the per-frame loop that drives it.

use glam::{EulerRot, Quat, Vec3};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::assets::{AssetLoad, LoadPoll, ModelAsset};
use crate::audio::{AudioSink, NoteTrigger, SoundId};
use crate::config::SessionConfig;
use crate::emitter::{EmitContext, Emitter, EmitterConfig, EmitterId, SpawnSource};
use crate::physics::{BodyHandle, PhysicsWorld};
use crate::player::{Player, PlayerInput};
use crate::registry::{EntityKind, EntityRegistry, Entry};
use crate::render::{RenderHandle, SceneGraph, SceneNode};

/// A node spun about its Y axis every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoRotate {
    pub node: RenderHandle,
    /// XYZ Euler angles; only `y` advances.
    pub euler: Vec3,
    /// Radians per second.
    pub speed: f32,
}

/// A model waiting on its load. The node is added once the load resolves.
pub struct PendingModel {
    pub load: AssetLoad<ModelAsset>,
    pub node: SceneNode,
    pub euler: Vec3,
    pub auto_rotate: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub substeps: u32,
    pub spawned: usize,
    pub retired: usize,
    pub plays: usize,
    /// Notes of the piano keys that sounded, in play order.
    pub keys_played: Vec<String>,
    pub live_particles: usize,
    pub models_loaded: usize,
}

/// Everything a running stage owns. Passed explicitly to whatever needs it.
pub struct Session {
    config: SessionConfig,
    pub scene: SceneGraph,
    pub physics: PhysicsWorld,
    pub registry: EntityRegistry,
    pub notes: NoteTrigger,
    emitters: Vec<Emitter>,
    spinners: Vec<AutoRotate>,
    pending: Vec<PendingModel>,
    player: Player,
    rng: SmallRng,
    frames: u64,
    ended: bool,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let mut physics = PhysicsWorld::new(config.gravity);
        let player = Player::spawn(
            &mut physics,
            config.camera_start,
            config.player_radius,
            config.player_speed,
            config.look_sensitivity,
        );
        Self {
            scene: SceneGraph::new(),
            registry: EntityRegistry::new(),
            notes: NoteTrigger::new(config.note_debounce),
            emitters: Vec::new(),
            spinners: Vec::new(),
            pending: Vec::new(),
            rng: SmallRng::seed_from_u64(config.seed),
            frames: 0,
            ended: false,
            physics,
            player,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn spinners(&self) -> &[AutoRotate] {
        &self.spinners
    }

    pub fn pending_models(&self) -> usize {
        self.pending.len()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn live_particles(&self) -> usize {
        self.emitters.iter().map(Emitter::live_count).sum()
    }

    /// Add a node with an optional body and record the pair.
    pub fn spawn_entity(&mut self, node: SceneNode, body: Option<BodyHandle>, kind: EntityKind) -> RenderHandle {
        let handle = self.scene.add(node);
        self.registry.register(handle, body, kind);
        handle
    }

    pub fn add_emitter(&mut self, source: SpawnSource, config: EmitterConfig) -> EmitterId {
        let id = EmitterId(self.emitters.len() as u32);
        self.emitters.push(Emitter::new(id, source, config));
        id
    }

    pub fn add_spinner(&mut self, node: RenderHandle, euler: Vec3, speed: f32) {
        self.spinners.push(AutoRotate { node, euler, speed });
    }

    pub fn attach_note(&mut self, body: BodyHandle, sound: SoundId) {
        self.notes.attach(body, sound);
    }

    pub fn request_model(&mut self, pending: PendingModel) {
        self.pending.push(pending);
    }

    /// Advance the stage by `delta` seconds.
    pub fn frame(&mut self, delta: f32, input: &PlayerInput, audio: &mut dyn AudioSink) -> FrameStats {
        let mut stats = FrameStats::default();
        if self.ended {
            return stats;
        }
        self.frames += 1;

        stats.models_loaded = self.poll_models();

        self.player.update(delta, input, &mut self.physics);

        for spin in &mut self.spinners {
            spin.euler.y += spin.speed * delta;
            if let Some(node) = self.scene.get_mut(spin.node) {
                node.transform.rotation =
                    Quat::from_euler(EulerRot::XYZ, spin.euler.x, spin.euler.y, spin.euler.z);
            }
        }

        let notes = &mut self.notes;
        let mut plays = 0;
        stats.substeps = self.physics.step(
            self.config.fixed_step,
            delta,
            self.config.max_substeps,
            |contacts, now| plays += notes.on_contacts(contacts, now, audio),
        );
        stats.plays = plays;
        stats.keys_played = self
            .notes
            .take_played()
            .into_iter()
            .filter_map(|body| match self.registry.find_by_body(body) {
                Some((_, Entry { kind: EntityKind::PianoKey { note }, .. })) => Some(note.clone()),
                _ => None,
            })
            .collect();

        for emitter in &mut self.emitters {
            let mut ctx = EmitContext {
                scene: &mut self.scene,
                physics: &mut self.physics,
                registry: &mut self.registry,
                rng: &mut self.rng,
            };
            let tick = emitter.update(delta, &mut ctx);
            stats.spawned += tick.spawned;
            stats.retired += tick.retired;
        }

        self.registry.sync_poses(&self.physics, &mut self.scene);

        stats.live_particles = self.live_particles();
        stats
    }

    fn poll_models(&mut self) -> usize {
        let mut loaded = 0;
        let mut i = 0;
        while i < self.pending.len() {
            match self.pending[i].load.poll() {
                LoadPoll::Pending => {
                    i += 1;
                    continue;
                }
                LoadPoll::Ready(asset) => {
                    let pending = self.pending.swap_remove(i);
                    let handle = self.spawn_entity(pending.node, None, EntityKind::Marker);
                    if let Some(speed) = pending.auto_rotate {
                        self.add_spinner(handle, pending.euler, speed);
                    }
                    log::info!("model {} ready ({} bytes)", asset.url, asset.byte_len);
                    loaded += 1;
                }
                LoadPoll::Failed(e) => {
                    let pending = self.pending.swap_remove(i);
                    log::error!("failed to load model {}: {e}", pending.load.url());
                }
            }
        }
        loaded
    }

    /// Retire every live particle and stop the loop. Returns how many
    /// particles were retired.
    pub fn end(&mut self) -> usize {
        if self.ended {
            return 0;
        }
        let mut retired = 0;
        for emitter in &mut self.emitters {
            let mut ctx = EmitContext {
                scene: &mut self.scene,
                physics: &mut self.physics,
                registry: &mut self.registry,
                rng: &mut self.rng,
            };
            retired += emitter.teardown(&mut ctx);
        }
        self.pending.clear();
        self.ended = true;
        log::info!("session ended after {} frames, {retired} particles retired", self.frames);
        retired
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
