use std::collections::HashMap;

use crate::emitter::EmitterId;
use crate::physics::{BodyHandle, PhysicsWorld};
use crate::render::{RenderHandle, SceneGraph};

/// What an entity is, fixed when it is created.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    /// Static level geometry (ground, piano slab).
    Scenery,
    /// Free-standing physics prop.
    Prop,
    /// Decorative anchor without a body.
    Marker,
    PianoKey { note: String },
    Particle { emitter: EmitterId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub body: Option<BodyHandle>,
    pub kind: EntityKind,
}

/// Association between scene nodes and the bodies that drive them.
///
/// The registry only tracks pairs. Removing the node from the scene and the
/// body from the physics world is the caller's job.
#[derive(Default)]
pub struct EntityRegistry {
    entries: HashMap<RenderHandle, Entry>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `render` with `body`. Re-registering a handle replaces its
    /// previous entry.
    pub fn register(&mut self, render: RenderHandle, body: Option<BodyHandle>, kind: EntityKind) {
        if let Some(prev) = self.entries.insert(render, Entry { body, kind }) {
            log::debug!("registry: replaced entry for {render:?} (was {:?})", prev.kind);
        }
    }

    pub fn unregister(&mut self, render: RenderHandle) -> Option<Entry> {
        self.entries.remove(&render)
    }

    pub fn get(&self, render: RenderHandle) -> Option<&Entry> {
        self.entries.get(&render)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(RenderHandle, Option<BodyHandle>),
    {
        for (render, entry) in &self.entries {
            f(*render, entry.body);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RenderHandle, &Entry)> {
        self.entries.iter().map(|(h, e)| (*h, e))
    }

    pub fn count_where<P>(&self, mut pred: P) -> usize
    where
        P: FnMut(&EntityKind) -> bool,
    {
        self.entries.values().filter(|e| pred(&e.kind)).count()
    }

    /// Find the entity whose body is `body`.
    pub fn find_by_body(&self, body: BodyHandle) -> Option<(RenderHandle, &Entry)> {
        self.iter().find(|(_, e)| e.body == Some(body))
    }

    /// Copy every body's pose onto its scene node.
    ///
    /// Entries without a body, and entries whose node or body has already
    /// gone, are skipped. This is a pure copy, so repeating it without a
    /// physics step in between changes nothing.
    pub fn sync_poses(&self, physics: &PhysicsWorld, scene: &mut SceneGraph) -> usize {
        let mut synced = 0;
        self.for_each(|render, body| {
            let Some(body) = body.and_then(|b| physics.body(b)) else {
                return;
            };
            if let Some(node) = scene.get_mut(render) {
                node.transform.position = body.position;
                node.transform.rotation = body.rotation;
                synced += 1;
            }
        });
        synced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Collider, RigidBody};
    use crate::render::{Primitive, Rgb, SceneNode};
    use glam::{Quat, Vec3};

    fn node(scene: &mut SceneGraph) -> RenderHandle {
        scene.add(SceneNode::new(Primitive::Sphere { radius: 0.5 }, Vec3::ZERO, Rgb::WHITE))
    }

    #[test]
    fn test_register_unregister_counts() {
        let mut scene = SceneGraph::new();
        let mut reg = EntityRegistry::new();
        let handles: Vec<_> = (0..5).map(|_| node(&mut scene)).collect();
        for h in &handles {
            reg.register(*h, None, EntityKind::Marker);
        }
        assert_eq!(reg.len(), 5);
        assert!(reg.unregister(handles[1]).is_some());
        assert!(reg.unregister(handles[3]).is_some());
        assert!(reg.unregister(handles[3]).is_none());
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_reregister_overwrites() {
        let mut scene = SceneGraph::new();
        let mut physics = PhysicsWorld::default();
        let mut reg = EntityRegistry::new();
        let h = node(&mut scene);
        let body = physics.add_body(RigidBody::dynamic(Collider::Sphere { radius: 0.5 }, 1.0, Vec3::ZERO));
        reg.register(h, None, EntityKind::Marker);
        reg.register(h, Some(body), EntityKind::Prop);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(h).unwrap().body, Some(body));
        assert_eq!(reg.get(h).unwrap().kind, EntityKind::Prop);
    }

    #[test]
    fn test_for_each_visits_each_entry_once() {
        let mut scene = SceneGraph::new();
        let mut reg = EntityRegistry::new();
        for _ in 0..20 {
            let h = node(&mut scene);
            reg.register(h, None, EntityKind::Marker);
        }
        let mut seen = std::collections::HashSet::new();
        reg.for_each(|h, _| assert!(seen.insert(h), "{h:?} visited twice"));
        assert_eq!(seen.len(), 20);
    }

    #[test]
    fn test_sync_copies_pose_and_skips_markers() {
        let mut scene = SceneGraph::new();
        let mut physics = PhysicsWorld::default();
        let mut reg = EntityRegistry::new();

        let prop = node(&mut scene);
        let body = physics.add_body(RigidBody::dynamic(
            Collider::Sphere { radius: 0.5 },
            1.0,
            Vec3::new(1.0, 2.0, 3.0),
        ));
        physics.body_mut(body).unwrap().rotation = Quat::from_rotation_y(0.5);
        reg.register(prop, Some(body), EntityKind::Prop);

        let marker = node(&mut scene);
        scene.get_mut(marker).unwrap().transform.position = Vec3::new(0.0, 3.0, -5.0);
        reg.register(marker, None, EntityKind::Marker);

        assert_eq!(reg.sync_poses(&physics, &mut scene), 1);
        let t = scene.get(prop).unwrap().transform;
        assert_eq!(t.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.rotation, Quat::from_rotation_y(0.5));
        assert_eq!(scene.get(marker).unwrap().transform.position, Vec3::new(0.0, 3.0, -5.0));
    }

    #[test]
    fn test_sync_is_idempotent() {
        let mut scene = SceneGraph::new();
        let mut physics = PhysicsWorld::default();
        let mut reg = EntityRegistry::new();
        for i in 0..4 {
            let h = node(&mut scene);
            let b = physics.add_body(RigidBody::dynamic(
                Collider::Sphere { radius: 0.5 },
                1.0,
                Vec3::splat(i as f32),
            ));
            reg.register(h, Some(b), EntityKind::Prop);
        }
        reg.sync_poses(&physics, &mut scene);
        let first = scene.snapshot();
        reg.sync_poses(&physics, &mut scene);
        assert_eq!(scene.snapshot(), first);
    }

    #[test]
    fn test_sync_tolerates_removed_body() {
        let mut scene = SceneGraph::new();
        let mut physics = PhysicsWorld::default();
        let mut reg = EntityRegistry::new();
        let h = node(&mut scene);
        let b = physics.add_body(RigidBody::dynamic(Collider::Sphere { radius: 0.5 }, 1.0, Vec3::ONE));
        reg.register(h, Some(b), EntityKind::Prop);
        physics.remove_body(b);
        assert_eq!(reg.sync_poses(&physics, &mut scene), 0);
    }

    #[test]
    fn test_find_by_body_and_count_where() {
        let mut scene = SceneGraph::new();
        let mut physics = PhysicsWorld::default();
        let mut reg = EntityRegistry::new();
        let key = node(&mut scene);
        let kb = physics.add_body(RigidBody::fixed(Collider::Cuboid { half_extents: Vec3::ONE }, Vec3::ZERO));
        reg.register(key, Some(kb), EntityKind::PianoKey { note: "c4".into() });
        reg.register(node(&mut scene), None, EntityKind::Marker);

        let (found, entry) = reg.find_by_body(kb).unwrap();
        assert_eq!(found, key);
        assert!(matches!(entry.kind, EntityKind::PianoKey { .. }));
        assert_eq!(reg.count_where(|k| matches!(k, EntityKind::Marker)), 1);
    }
}
