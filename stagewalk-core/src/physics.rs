//! Simplified rigid-body world.
//!
//! Bodies are integrated with semi-implicit Euler at a fixed step. Boxes
//! collide as axis-aligned boxes (their orientation is integrated and synced
//! to the scene but ignored by the narrow phase), which is plenty for props
//! and particles tumbling across a flat stage.

use glam::{Quat, Vec3};

use crate::handle::{define_handle, HandleStore};
use crate::math::{damping_factor, integrate_rotation};

define_handle!(
    /// Handle to a body in the [`PhysicsWorld`].
    BodyHandle
);

pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.82, 0.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    Sphere { radius: f32 },
    Cuboid { half_extents: Vec3 },
    /// Infinite plane `normal · x = offset`. The body position is ignored.
    Plane { normal: Vec3, offset: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyKind {
    Dynamic { mass: f32 },
    Static,
    /// Moved by its velocity only; never pushed by contacts.
    Kinematic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub collider: Collider,
    pub kind: BodyKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl RigidBody {
    fn new(collider: Collider, kind: BodyKind, position: Vec3) -> Self {
        Self {
            collider,
            kind,
            position,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            linear_damping: 0.01,
            angular_damping: 0.01,
        }
    }

    pub fn dynamic(collider: Collider, mass: f32, position: Vec3) -> Self {
        Self::new(collider, BodyKind::Dynamic { mass }, position)
    }

    pub fn fixed(collider: Collider, position: Vec3) -> Self {
        Self::new(collider, BodyKind::Static, position)
    }

    pub fn kinematic(collider: Collider, position: Vec3) -> Self {
        Self::new(collider, BodyKind::Kinematic, position)
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn inverse_mass(&self) -> f32 {
        match self.kind {
            BodyKind::Dynamic { mass } if mass > 0.0 => 1.0 / mass,
            _ => 0.0,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, BodyKind::Static)
    }
}

/// One touching pair from the most recent sub-step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    /// Unit normal pointing from `body_a` towards `body_b`.
    pub normal: Vec3,
    pub depth: f32,
}

impl Contact {
    pub fn bodies(&self) -> [BodyHandle; 2] {
        [self.body_a, self.body_b]
    }
}

/// Surface response shared by every contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self {
            friction: 0.3,
            restitution: 0.0,
        }
    }
}

pub struct PhysicsWorld {
    bodies: HandleStore<BodyHandle, RigidBody>,
    pub gravity: Vec3,
    pub material: ContactMaterial,
    accumulator: f32,
    time: f64,
    contacts: Vec<Contact>,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            bodies: HandleStore::new(),
            gravity,
            material: ContactMaterial::default(),
            accumulator: 0.0,
            time: 0.0,
            contacts: Vec::new(),
        }
    }

    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        self.bodies.insert(body)
    }

    /// Remove a body. Contacts recorded for it in the last sub-step are
    /// dropped as well.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let removed = self.bodies.remove(handle);
        if removed.is_some() {
            self.contacts
                .retain(|c| c.body_a != handle && c.body_b != handle);
        }
        removed
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Contacts found by the most recent sub-step.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Total simulated seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Cover `elapsed` seconds of wall-clock time with fixed sub-steps.
    ///
    /// At most `max_substeps` steps run per call; any time left over beyond
    /// that cap is dropped rather than carried into the next call.
    /// `on_substep` sees the contact list and simulated time after every
    /// sub-step. Returns the number of sub-steps taken.
    pub fn step<F>(&mut self, fixed_dt: f32, elapsed: f32, max_substeps: u32, mut on_substep: F) -> u32
    where
        F: FnMut(&[Contact], f64),
    {
        if fixed_dt <= 0.0 {
            return 0;
        }
        self.accumulator += elapsed.max(0.0);
        let mut substeps = 0;
        while self.accumulator >= fixed_dt && substeps < max_substeps {
            self.internal_step(fixed_dt);
            self.accumulator -= fixed_dt;
            substeps += 1;
            on_substep(&self.contacts, self.time);
        }
        self.accumulator %= fixed_dt;
        substeps
    }

    fn internal_step(&mut self, dt: f32) {
        self.integrate(dt);
        self.detect_contacts();
        self.resolve_contacts();
        self.time += dt as f64;
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for (_, body) in self.bodies.iter_mut() {
            match body.kind {
                BodyKind::Dynamic { .. } => {
                    body.linear_velocity += gravity * dt;
                    body.linear_velocity *= damping_factor(body.linear_damping, dt);
                    body.angular_velocity *= damping_factor(body.angular_damping, dt);
                }
                BodyKind::Kinematic => {}
                BodyKind::Static => continue,
            }
            body.position += body.linear_velocity * dt;
            body.rotation = integrate_rotation(body.rotation, body.angular_velocity, dt);
        }
    }

    fn detect_contacts(&mut self) {
        self.contacts.clear();
        let handles = self.bodies.sorted_handles();
        for (i, &ha) in handles.iter().enumerate() {
            for &hb in &handles[i + 1..] {
                let (Some(a), Some(b)) = (self.bodies.get(ha), self.bodies.get(hb)) else {
                    continue;
                };
                if a.is_static() && b.is_static() {
                    continue;
                }
                if let Some((normal, depth)) = collide(a, b) {
                    self.contacts.push(Contact {
                        body_a: ha,
                        body_b: hb,
                        normal,
                        depth,
                    });
                }
            }
        }
    }

    fn resolve_contacts(&mut self) {
        let material = self.material;
        for contact in &self.contacts {
            let (Some(a), Some(b)) = (
                self.bodies.get(contact.body_a),
                self.bodies.get(contact.body_b),
            ) else {
                continue;
            };
            let (ia, ib) = (a.inverse_mass(), b.inverse_mass());
            let total = ia + ib;
            if total <= 0.0 {
                continue;
            }

            let n = contact.normal;
            let correction = n * contact.depth / total;
            let relative = b.linear_velocity - a.linear_velocity;
            let closing = relative.dot(n);

            let mut impulse = Vec3::ZERO;
            if closing < 0.0 {
                let j = -(1.0 + material.restitution) * closing / total;
                impulse = n * j;

                let tangent = relative - n * closing;
                let slip = tangent.length();
                if slip > 1e-6 {
                    let jt = (slip / total).min(material.friction * j);
                    impulse -= tangent / slip * jt;
                }
            }

            if let Some(a) = self.bodies.get_mut(contact.body_a) {
                a.position -= correction * ia;
                a.linear_velocity -= impulse * ia;
            }
            if let Some(b) = self.bodies.get_mut(contact.body_b) {
                b.position += correction * ib;
                b.linear_velocity += impulse * ib;
            }
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY)
    }
}

/// Narrow phase. Returns the normal from `a` to `b` and the penetration depth.
fn collide(a: &RigidBody, b: &RigidBody) -> Option<(Vec3, f32)> {
    use Collider::*;
    match (a.collider, b.collider) {
        (Sphere { radius: ra }, Sphere { radius: rb }) => {
            sphere_sphere(a.position, ra, b.position, rb)
        }
        (Sphere { radius }, Cuboid { half_extents }) => {
            sphere_box(a.position, radius, b.position, half_extents)
        }
        (Cuboid { half_extents }, Sphere { radius }) => {
            sphere_box(b.position, radius, a.position, half_extents).map(|(n, d)| (-n, d))
        }
        (Cuboid { half_extents: ha }, Cuboid { half_extents: hb }) => {
            box_box(a.position, ha, b.position, hb)
        }
        (Plane { normal, offset }, _) => {
            shape_plane(b, normal, offset).map(|(n, d)| (-n, d))
        }
        (_, Plane { normal, offset }) => shape_plane(a, normal, offset),
    }
}

fn sphere_sphere(pa: Vec3, ra: f32, pb: Vec3, rb: f32) -> Option<(Vec3, f32)> {
    let delta = pb - pa;
    let dist = delta.length();
    let depth = ra + rb - dist;
    if depth <= 0.0 {
        return None;
    }
    let normal = if dist > 1e-6 { delta / dist } else { Vec3::Y };
    Some((normal, depth))
}

fn sphere_box(center: Vec3, radius: f32, box_pos: Vec3, half: Vec3) -> Option<(Vec3, f32)> {
    let min = box_pos - half;
    let max = box_pos + half;
    let closest = center.clamp(min, max);
    let delta = closest - center;
    let dist = delta.length();
    if dist > 1e-6 {
        let depth = radius - dist;
        return (depth > 0.0).then(|| (delta / dist, depth));
    }
    // Centre inside the box: push out along the shallowest face.
    let sphere_half = Vec3::splat(radius);
    box_box(center, sphere_half, box_pos, half)
}

fn box_box(pa: Vec3, ha: Vec3, pb: Vec3, hb: Vec3) -> Option<(Vec3, f32)> {
    let delta = pb - pa;
    let overlap = ha + hb - delta.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 || overlap.z <= 0.0 {
        return None;
    }
    let sign = |v: f32| if v < 0.0 { -1.0 } else { 1.0 };
    if overlap.x <= overlap.y && overlap.x <= overlap.z {
        Some((Vec3::new(sign(delta.x), 0.0, 0.0), overlap.x))
    } else if overlap.y <= overlap.z {
        Some((Vec3::new(0.0, sign(delta.y), 0.0), overlap.y))
    } else {
        Some((Vec3::new(0.0, 0.0, sign(delta.z)), overlap.z))
    }
}

/// Contact between a non-plane body and a plane, normal from body to plane.
fn shape_plane(body: &RigidBody, plane_normal: Vec3, offset: f32) -> Option<(Vec3, f32)> {
    let n = plane_normal.normalize_or_zero();
    let reach = match body.collider {
        Collider::Sphere { radius } => radius,
        Collider::Cuboid { half_extents } => (half_extents * n).abs().element_sum(),
        Collider::Plane { .. } => return None,
    };
    let depth = reach - (n.dot(body.position) - offset);
    (depth > 0.0).then(|| (-n, depth))
}
