//! First-person walker with pointer-lock mouse look.

use glam::{EulerRot, Quat, Vec3};

use crate::physics::{BodyHandle, Collider, PhysicsWorld, RigidBody};

const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Input sampled for one frame. Look deltas are in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub look_dx: f32,
    pub look_dy: f32,
    /// Movement and look only apply while the pointer is locked.
    pub pointer_locked: bool,
}

pub struct Player {
    position: Vec3,
    last_position: Vec3,
    yaw: f32,
    pitch: f32,
    speed: f32,
    sensitivity: f32,
    body: BodyHandle,
}

impl Player {
    /// Place the camera at `start` and add its kinematic collision sphere.
    pub fn spawn(physics: &mut PhysicsWorld, start: Vec3, radius: f32, speed: f32, sensitivity: f32) -> Self {
        let body = physics.add_body(RigidBody::kinematic(Collider::Sphere { radius }, start));
        Self {
            position: start,
            last_position: start,
            yaw: 0.0,
            pitch: 0.0,
            speed,
            sensitivity,
            body,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Horizontal forward direction. The camera looks down -Z at zero yaw.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Apply look and WASD movement, then hand the camera displacement to
    /// the collision sphere as a velocity so the physics step carries it
    /// along.
    pub fn update(&mut self, delta: f32, input: &PlayerInput, physics: &mut PhysicsWorld) {
        if input.pointer_locked {
            self.yaw -= input.look_dx * self.sensitivity;
            self.pitch = (self.pitch - input.look_dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);

            let dist = self.speed * delta;
            let mut step = Vec3::ZERO;
            if input.forward {
                step += self.forward() * dist;
            }
            if input.backward {
                step -= self.forward() * dist;
            }
            if input.left {
                step -= self.right() * dist;
            }
            if input.right {
                step += self.right() * dist;
            }
            self.position += step;
        }

        let velocity = if delta > 0.0 {
            (self.position - self.last_position) / delta
        } else {
            Vec3::ZERO
        };
        if let Some(body) = physics.body_mut(self.body) {
            body.position = self.last_position;
            body.linear_velocity = velocity;
        }
        self.last_position = self.position;
    }
}
