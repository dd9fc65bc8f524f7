//! Particle emitters that spawn short-lived physics bodies.
//!
//! Spawning is driven by a fractional accumulator, so the long-run spawn
//! count tracks `rate * elapsed` no matter how the frame deltas jitter.

use glam::Vec3;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::math::{launch_velocity, random_rgb};
use crate::physics::{BodyHandle, Collider, PhysicsWorld, RigidBody};
use crate::registry::{EntityKind, EntityRegistry};
use crate::render::{Primitive, RenderHandle, Rgb, SceneGraph, SceneNode};

/// Spawn rate for emitters that do not set one.
pub const DEFAULT_RATE: f32 = 0.25;
/// The other stock rate, selectable through
/// [`SessionConfig::default_emitter_rate`](crate::config::SessionConfig).
pub const BRISK_RATE: f32 = 5.0;
pub const DEFAULT_SPEED: f32 = 5.0;
pub const DEFAULT_LIFESPAN: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterId(pub u32);

/// Spawn position as a function of total emitter time and live count.
pub type PathFn = Box<dyn Fn(f32, usize) -> Vec3>;

pub enum SpawnSource {
    /// Every particle starts at the same origin.
    Point(Vec3),
    /// Particles start wherever the function says, e.g. along a rotating ring.
    Path(PathFn),
}

impl SpawnSource {
    fn position(&self, total_time: f32, live: usize) -> Vec3 {
        match self {
            SpawnSource::Point(origin) => *origin,
            SpawnSource::Path(f) => f(total_time, live),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParticleShape {
    Sphere { radius: f32 },
    Cube { size: f32 },
}

impl ParticleShape {
    pub fn sphere() -> Self {
        ParticleShape::Sphere { radius: 0.5 }
    }

    pub fn cube() -> Self {
        ParticleShape::Cube { size: 0.5 }
    }

    pub(crate) fn primitive(self) -> Primitive {
        match self {
            ParticleShape::Sphere { radius } => Primitive::Sphere { radius },
            ParticleShape::Cube { size } => Primitive::Cuboid { size: Vec3::splat(size) },
        }
    }

    pub(crate) fn collider(self) -> Collider {
        match self {
            ParticleShape::Sphere { radius } => Collider::Sphere { radius },
            ParticleShape::Cube { size } => Collider::Cuboid {
                half_extents: Vec3::splat(size / 2.0),
            },
        }
    }
}

impl Default for ParticleShape {
    fn default() -> Self {
        Self::sphere()
    }
}

/// Emitter tuning. Nothing is validated: a negative rate never spawns and
/// a lifespan no longer than one frame retires particles in the frame that
/// spawned them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterConfig {
    pub rate: f32,
    pub speed: f32,
    pub lifespan: f32,
    pub shape: ParticleShape,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            speed: DEFAULT_SPEED,
            lifespan: DEFAULT_LIFESPAN,
            shape: ParticleShape::default(),
        }
    }
}

/// Everything a spawn or retire touches, borrowed from the session.
pub struct EmitContext<'a> {
    pub scene: &'a mut SceneGraph,
    pub physics: &'a mut PhysicsWorld,
    pub registry: &'a mut EntityRegistry,
    pub rng: &'a mut dyn RngCore,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub render: RenderHandle,
    pub body: BodyHandle,
    pub age: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitterTick {
    pub spawned: usize,
    pub retired: usize,
}

pub struct Emitter {
    id: EmitterId,
    source: SpawnSource,
    config: EmitterConfig,
    accumulator: f32,
    total_time: f32,
    particles: Vec<Particle>,
}

impl Emitter {
    pub fn new(id: EmitterId, source: SpawnSource, config: EmitterConfig) -> Self {
        Self {
            id,
            source,
            config,
            accumulator: 0.0,
            total_time: 0.0,
            particles: Vec::new(),
        }
    }

    pub fn point(id: EmitterId, origin: Vec3, config: EmitterConfig) -> Self {
        Self::new(id, SpawnSource::Point(origin), config)
    }

    pub fn path<F>(id: EmitterId, path: F, config: EmitterConfig) -> Self
    where
        F: Fn(f32, usize) -> Vec3 + 'static,
    {
        Self::new(id, SpawnSource::Path(Box::new(path)), config)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn live_count(&self) -> usize {
        self.particles.len()
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Advance by `delta` seconds: spawn what the accumulator owes, then
    /// age every live particle and retire those past their lifespan.
    pub fn update(&mut self, delta: f32, ctx: &mut EmitContext<'_>) -> EmitterTick {
        let mut tick = EmitterTick::default();

        self.total_time += delta;
        self.accumulator += delta * self.config.rate;
        while self.accumulator >= 1.0 {
            self.spawn(ctx);
            self.accumulator -= 1.0;
            tick.spawned += 1;
        }

        let lifespan = self.config.lifespan;
        for i in (0..self.particles.len()).rev() {
            self.particles[i].age += delta;
            if self.particles[i].age >= lifespan {
                let particle = self.particles.remove(i);
                retire(particle, ctx);
                tick.retired += 1;
            }
        }

        if tick.spawned > 0 || tick.retired > 0 {
            log::debug!(
                "emitter {:?}: +{} -{} ({} live)",
                self.id,
                tick.spawned,
                tick.retired,
                self.particles.len()
            );
        }
        tick
    }

    /// Retire every live particle. Called when the session ends.
    pub fn teardown(&mut self, ctx: &mut EmitContext<'_>) -> usize {
        let count = self.particles.len();
        for particle in self.particles.drain(..).rev() {
            retire(particle, ctx);
        }
        count
    }

    fn spawn(&mut self, ctx: &mut EmitContext<'_>) {
        let position = self.source.position(self.total_time, self.particles.len());
        let color = Rgb(random_rgb(&mut *ctx.rng));
        let shape = self.config.shape;

        let render = ctx.scene.add(SceneNode::new(shape.primitive(), position, color));
        let velocity = launch_velocity(&mut *ctx.rng, self.config.speed);
        let body = ctx.physics.add_body(
            RigidBody::dynamic(shape.collider(), 1.0, position).with_velocity(velocity),
        );
        ctx.registry
            .register(render, Some(body), EntityKind::Particle { emitter: self.id });

        self.particles.push(Particle {
            render,
            body,
            age: 0.0,
        });
    }
}

fn retire(particle: Particle, ctx: &mut EmitContext<'_>) {
    ctx.scene.remove(particle.render);
    ctx.physics.remove_body(particle.body);
    ctx.registry.unregister(particle.render);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    struct Harness {
        scene: SceneGraph,
        physics: PhysicsWorld,
        registry: EntityRegistry,
        rng: SmallRng,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                scene: SceneGraph::new(),
                physics: PhysicsWorld::default(),
                registry: EntityRegistry::new(),
                rng: SmallRng::seed_from_u64(42),
            }
        }

        fn tick(&mut self, emitter: &mut Emitter, delta: f32) -> EmitterTick {
            let mut ctx = EmitContext {
                scene: &mut self.scene,
                physics: &mut self.physics,
                registry: &mut self.registry,
                rng: &mut self.rng,
            };
            emitter.update(delta, &mut ctx)
        }
    }

    fn config(rate: f32, lifespan: f32) -> EmitterConfig {
        EmitterConfig {
            rate,
            speed: 4.0,
            lifespan,
            shape: ParticleShape::sphere(),
        }
    }

    // ── spawn rate ──

    #[test]
    fn test_spawn_count_tracks_rate() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(0), Vec3::Y, config(10.0, 100.0));
        let mut spawned = 0;
        for _ in 0..30 {
            spawned += h.tick(&mut e, 0.1).spawned;
        }
        // floor(rate * T) within the accumulator fencepost.
        assert!((29..=31).contains(&spawned), "spawned {spawned}");
        assert_eq!(e.live_count(), spawned);
    }

    #[test]
    fn test_spawn_count_exact_with_binary_deltas() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(0), Vec3::Y, config(8.0, 100.0));
        let ticks: Vec<usize> = (0..16).map(|_| h.tick(&mut e, 0.125).spawned).collect();
        assert!(ticks.iter().all(|&n| n == 1));
        assert_eq!(e.accumulator(), 0.0);
    }

    #[test]
    fn test_fractional_rate_accumulates_across_frames() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(0), Vec3::Y, config(0.25, 100.0));
        let spawned: usize = (0..32).map(|_| h.tick(&mut e, 0.25).spawned).sum();
        assert_eq!(spawned, 2);
    }

    #[test]
    fn test_jittered_deltas_match_rate() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(0), Vec3::Y, config(5.0, 100.0));
        let deltas = [0.016, 0.033, 0.008, 0.05, 0.017];
        let mut total_time = 0.0;
        let mut spawned = 0;
        for i in 0..200 {
            let d = deltas[i % deltas.len()];
            total_time += d;
            spawned += h.tick(&mut e, d).spawned;
        }
        let expected = (5.0f32 * total_time).floor() as usize;
        assert!(spawned + 1 >= expected && spawned <= expected + 1);
    }

    #[test]
    fn test_large_delta_spawns_burst() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(0), Vec3::Y, config(10.0, 100.0));
        assert_eq!(h.tick(&mut e, 2.0).spawned, 20);
    }

    #[test]
    fn test_negative_rate_never_spawns() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(0), Vec3::Y, config(-3.0, 1.0));
        for _ in 0..10 {
            assert_eq!(h.tick(&mut e, 0.5).spawned, 0);
        }
    }

    // ── lifecycle ──

    #[test]
    fn test_spawn_registers_node_body_and_entry() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(3), Vec3::new(0.0, 1.0, 0.0), config(1.0, 10.0));
        h.tick(&mut e, 1.0);
        let p = e.particles()[0];
        assert!(h.scene.contains(p.render));
        assert!(h.physics.body(p.body).is_some());
        let entry = h.registry.get(p.render).unwrap();
        assert_eq!(entry.body, Some(p.body));
        assert_eq!(entry.kind, EntityKind::Particle { emitter: EmitterId(3) });

        let body = h.physics.body(p.body).unwrap();
        assert_eq!(body.position, Vec3::new(0.0, 1.0, 0.0));
        assert!((body.linear_velocity.length() - 4.0).abs() < 1e-4);
        assert_eq!(body.inverse_mass(), 1.0);
    }

    #[test]
    fn test_age_grows_by_delta() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(0), Vec3::Y, config(1.0, 10.0));
        h.tick(&mut e, 1.0);
        assert_eq!(e.particles()[0].age, 1.0);
        h.tick(&mut e, 0.5);
        assert_eq!(e.particles()[0].age, 1.5);
    }

    #[test]
    fn test_retires_in_the_tick_lifespan_is_reached() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(0), Vec3::Y, config(1.0, 2.0));
        // Spawned and aged to 0.5 in the first tick.
        assert_eq!(h.tick(&mut e, 0.5).spawned, 0);
        assert_eq!(h.tick(&mut e, 0.5).spawned, 1);
        assert_eq!(e.particles()[0].age, 0.5);
        assert_eq!(h.tick(&mut e, 0.5).retired, 0);
        assert_eq!(h.tick(&mut e, 0.5).retired, 0);
        let t = h.tick(&mut e, 0.5);
        assert_eq!(t.retired, 1);
        assert!(e.particles().iter().all(|p| p.age < 2.0));
    }

    #[test]
    fn test_fountain_keeps_everything_for_three_seconds() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(0), Vec3::new(0.0, 1.0, 0.0), config(10.0, 3.0));
        let mut spawned = 0;
        for tick in 1..=30 {
            let t = h.tick(&mut e, 0.1);
            spawned += t.spawned;
            assert_eq!(t.retired, 0, "retired at tick {tick}");
        }
        assert_eq!(spawned, 30);
        assert_eq!(e.live_count(), 30);
        assert!(e.particles()[0].age < 3.0);

        // The first particle crosses its lifespan on the next tick.
        let t = h.tick(&mut e, 0.1);
        assert_eq!(t, EmitterTick { spawned: 1, retired: 1 });
        assert_eq!(e.live_count(), 30);
    }

    #[test]
    fn test_retire_removes_node_body_and_entry() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(0), Vec3::Y, config(4.0, 1.0));
        h.tick(&mut e, 0.25);
        let first = e.particles()[0];
        for _ in 0..4 {
            h.tick(&mut e, 0.25);
        }
        assert!(!h.scene.contains(first.render));
        assert!(h.physics.body(first.body).is_none());
        assert!(h.registry.get(first.render).is_none());
        assert_eq!(h.registry.len(), e.live_count());
        assert_eq!(h.physics.len(), e.live_count());
        assert_eq!(h.scene.len(), e.live_count());
    }

    #[test]
    fn test_zero_lifespan_retires_immediately() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(0), Vec3::Y, config(2.0, 0.0));
        let t = h.tick(&mut e, 1.0);
        assert_eq!(t, EmitterTick { spawned: 2, retired: 2 });
        assert_eq!(e.live_count(), 0);
        assert!(h.registry.is_empty());
    }

    #[test]
    fn test_steady_state_population() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(0), Vec3::Y, config(8.0, 3.0));
        for _ in 0..200 {
            h.tick(&mut e, 0.125);
        }
        // One spawn per tick; a particle is aged in its spawning tick and
        // retired on the 24th, so 23 remain alive between ticks.
        assert_eq!(e.live_count(), 23);
    }

    #[test]
    fn test_teardown_removes_everything() {
        let mut h = Harness::new();
        let mut e = Emitter::point(EmitterId(0), Vec3::Y, config(10.0, 5.0));
        h.tick(&mut e, 1.0);
        let mut ctx = EmitContext {
            scene: &mut h.scene,
            physics: &mut h.physics,
            registry: &mut h.registry,
            rng: &mut h.rng,
        };
        assert_eq!(e.teardown(&mut ctx), 10);
        assert_eq!(e.live_count(), 0);
        assert!(h.scene.is_empty());
        assert!(h.physics.is_empty());
        assert!(h.registry.is_empty());
    }

    // ── path source ──

    #[test]
    fn test_path_source_receives_time_and_live_count() {
        let mut h = Harness::new();
        let mut e = Emitter::path(
            EmitterId(1),
            |t, live| Vec3::new(t, live as f32, 0.0),
            EmitterConfig {
                shape: ParticleShape::cube(),
                ..config(4.0, 100.0)
            },
        );
        h.tick(&mut e, 0.25);
        h.tick(&mut e, 0.25);
        let p0 = h.physics.body(e.particles()[0].body).unwrap().position;
        let p1 = h.physics.body(e.particles()[1].body).unwrap().position;
        assert_eq!(p0, Vec3::new(0.25, 0.0, 0.0));
        assert_eq!(p1, Vec3::new(0.5, 1.0, 0.0));
        assert!(matches!(
            h.scene.get(e.particles()[0].render).unwrap().primitive,
            Primitive::Cuboid { .. }
        ));
    }
}
