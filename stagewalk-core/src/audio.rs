//! Collision-triggered sounds.

use std::collections::HashMap;

use crate::error::AudioError;
use crate::physics::{BodyHandle, Contact};

pub const DEFAULT_DEBOUNCE: f64 = 0.3;

/// Identifies a sound buffer owned by an [`AudioSink`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(pub String);

impl SoundId {
    pub fn new(name: impl Into<String>) -> Self {
        SoundId(name.into())
    }
}

/// Plays decoded buffers. Implemented by the browser's WebAudio bridge and
/// by recording sinks in headless runs.
pub trait AudioSink {
    /// Start `sound` now. Returns [`AudioError::NotReady`] while the buffer
    /// is still loading.
    fn play(&mut self, sound: &SoundId) -> Result<(), AudioError>;
}

/// Sink that plays nothing. Every sound counts as ready.
#[derive(Debug, Default)]
pub struct SilentSink {
    pub played: Vec<SoundId>,
}

impl AudioSink for SilentSink {
    fn play(&mut self, sound: &SoundId) -> Result<(), AudioError> {
        self.played.push(sound.clone());
        Ok(())
    }
}

/// Plays a body's attached sound when it touches anything, at most once
/// per debounce window per body.
pub struct NoteTrigger {
    window: f64,
    attached: HashMap<BodyHandle, SoundId>,
    last_played: HashMap<BodyHandle, f64>,
    /// Bodies that sounded since the last [`NoteTrigger::take_played`].
    played: Vec<BodyHandle>,
}

impl NoteTrigger {
    pub fn new(window: f64) -> Self {
        Self {
            window,
            attached: HashMap::new(),
            last_played: HashMap::new(),
            played: Vec::new(),
        }
    }

    pub fn attach(&mut self, body: BodyHandle, sound: SoundId) {
        self.attached.insert(body, sound);
    }

    pub fn detach(&mut self, body: BodyHandle) -> Option<SoundId> {
        self.last_played.remove(&body);
        self.attached.remove(&body)
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    fn in_window(&self, body: BodyHandle, now: f64) -> bool {
        self.last_played
            .get(&body)
            .is_some_and(|&t| now - t < self.window)
    }

    /// Inspect one sub-step's contacts at simulated time `now`.
    /// Returns how many sounds started.
    pub fn on_contacts(&mut self, contacts: &[Contact], now: f64, sink: &mut dyn AudioSink) -> usize {
        let mut plays = 0;
        for contact in contacts {
            for body in contact.bodies() {
                let Some(sound) = self.attached.get(&body) else {
                    continue;
                };
                if self.in_window(body, now) {
                    continue;
                }
                match sink.play(sound) {
                    Ok(()) => {
                        log::debug!("note {} on {body:?} at {now:.3}s", sound.0);
                        self.last_played.insert(body, now);
                        self.played.push(body);
                        plays += 1;
                    }
                    Err(AudioError::NotReady(_)) => {}
                    Err(e) => log::warn!("failed to play {}: {e}", sound.0),
                }
            }
        }
        plays
    }

    /// Drain the bodies that played, in play order.
    pub fn take_played(&mut self) -> Vec<BodyHandle> {
        std::mem::take(&mut self.played)
    }
}

impl Default for NoteTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Collider, PhysicsWorld, RigidBody};
    use glam::Vec3;

    fn bodies() -> (BodyHandle, BodyHandle) {
        let mut world = PhysicsWorld::default();
        let key = world.add_body(RigidBody::fixed(Collider::Cuboid { half_extents: Vec3::ONE }, Vec3::ZERO));
        let ball = world.add_body(RigidBody::dynamic(Collider::Sphere { radius: 0.5 }, 1.0, Vec3::Y));
        (key, ball)
    }

    fn contact(a: BodyHandle, b: BodyHandle) -> Contact {
        Contact {
            body_a: a,
            body_b: b,
            normal: Vec3::Y,
            depth: 0.01,
        }
    }

    struct PendingSink;

    impl AudioSink for PendingSink {
        fn play(&mut self, sound: &SoundId) -> Result<(), AudioError> {
            Err(AudioError::NotReady(sound.0.clone()))
        }
    }

    #[test]
    fn test_contacts_100ms_apart_play_once() {
        let (key, ball) = bodies();
        let mut trigger = NoteTrigger::default();
        trigger.attach(key, SoundId::new("piano"));
        let mut sink = SilentSink::default();
        let c = [contact(key, ball)];
        assert_eq!(trigger.on_contacts(&c, 1.0, &mut sink), 1);
        assert_eq!(trigger.on_contacts(&c, 1.1, &mut sink), 0);
        assert_eq!(sink.played.len(), 1);
    }

    #[test]
    fn test_contacts_400ms_apart_play_twice() {
        let (key, ball) = bodies();
        let mut trigger = NoteTrigger::default();
        trigger.attach(key, SoundId::new("piano"));
        let mut sink = SilentSink::default();
        let c = [contact(ball, key)];
        assert_eq!(trigger.on_contacts(&c, 1.0, &mut sink), 1);
        assert_eq!(trigger.on_contacts(&c, 1.4, &mut sink), 1);
        assert_eq!(sink.played.len(), 2);
    }

    #[test]
    fn test_contacts_at_0_100_500ms() {
        let (key, ball) = bodies();
        let mut trigger = NoteTrigger::default();
        trigger.attach(key, SoundId::new("piano"));
        let mut sink = SilentSink::default();
        let c = [contact(key, ball)];
        let plays: Vec<usize> = [0.0, 0.1, 0.5]
            .iter()
            .map(|&t| trigger.on_contacts(&c, t, &mut sink))
            .collect();
        assert_eq!(plays, vec![1, 0, 1]);
    }

    #[test]
    fn test_debounce_is_per_body() {
        let (key, ball) = bodies();
        let mut trigger = NoteTrigger::default();
        trigger.attach(key, SoundId::new("low"));
        trigger.attach(ball, SoundId::new("high"));
        let mut sink = SilentSink::default();
        // Same contact, both bodies tagged: each plays once.
        assert_eq!(trigger.on_contacts(&[contact(key, ball)], 0.0, &mut sink), 2);
        assert_eq!(trigger.on_contacts(&[contact(key, ball)], 0.1, &mut sink), 0);
        assert_eq!(sink.played, vec![SoundId::new("low"), SoundId::new("high")]);
    }

    #[test]
    fn test_repeated_contacts_in_one_substep_play_once() {
        let (key, ball) = bodies();
        let mut trigger = NoteTrigger::default();
        trigger.attach(key, SoundId::new("piano"));
        let mut sink = SilentSink::default();
        let c = [contact(key, ball), contact(ball, key)];
        assert_eq!(trigger.on_contacts(&c, 0.0, &mut sink), 1);
    }

    #[test]
    fn test_untagged_bodies_are_silent() {
        let (key, ball) = bodies();
        let mut trigger = NoteTrigger::default();
        let mut sink = SilentSink::default();
        assert_eq!(trigger.on_contacts(&[contact(key, ball)], 0.0, &mut sink), 0);
        assert!(sink.played.is_empty());
    }

    #[test]
    fn test_not_ready_sound_is_skipped_without_window() {
        let (key, ball) = bodies();
        let mut trigger = NoteTrigger::default();
        trigger.attach(key, SoundId::new("piano"));
        let c = [contact(key, ball)];
        assert_eq!(trigger.on_contacts(&c, 0.0, &mut PendingSink), 0);
        // Once decoded, the very next contact plays.
        let mut sink = SilentSink::default();
        assert_eq!(trigger.on_contacts(&c, 0.05, &mut sink), 1);
    }

    #[test]
    fn test_take_played_lists_bodies_once() {
        let (key, ball) = bodies();
        let mut trigger = NoteTrigger::default();
        trigger.attach(key, SoundId::new("low"));
        trigger.attach(ball, SoundId::new("high"));
        let mut sink = SilentSink::default();
        trigger.on_contacts(&[contact(key, ball)], 0.0, &mut sink);
        trigger.on_contacts(&[contact(key, ball)], 0.1, &mut sink);
        assert_eq!(trigger.take_played(), vec![key, ball]);
        assert!(trigger.take_played().is_empty());
        assert_eq!(trigger.on_contacts(&[contact(key, ball)], 1.0, &mut PendingSink), 0);
        assert!(trigger.take_played().is_empty());
    }

    #[test]
    fn test_detach_silences_body() {
        let (key, ball) = bodies();
        let mut trigger = NoteTrigger::default();
        trigger.attach(key, SoundId::new("piano"));
        assert_eq!(trigger.detach(key), Some(SoundId::new("piano")));
        let mut sink = SilentSink::default();
        assert_eq!(trigger.on_contacts(&[contact(key, ball)], 0.0, &mut sink), 0);
        assert_eq!(trigger.attached_count(), 0);
    }
}
