use stagewalk_core::PlayerInput;

/// Keys the walker reacts to, by `KeyboardEvent.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkKey {
    Forward,
    Backward,
    Left,
    Right,
}

impl WalkKey {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "KeyW" | "ArrowUp" => Some(WalkKey::Forward),
            "KeyS" | "ArrowDown" => Some(WalkKey::Backward),
            "KeyA" | "ArrowLeft" => Some(WalkKey::Left),
            "KeyD" | "ArrowRight" => Some(WalkKey::Right),
            _ => None,
        }
    }
}

/// Browser input state, fed by DOM event handlers on the JS side.
#[derive(Debug, Default)]
pub struct InputState {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    mouse_dx: f64,
    mouse_dy: f64,
    pointer_locked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false for keys the walker ignores.
    pub fn set_key(&mut self, code: &str, down: bool) -> bool {
        let Some(key) = WalkKey::from_code(code) else {
            return false;
        };
        match key {
            WalkKey::Forward => self.forward = down,
            WalkKey::Backward => self.backward = down,
            WalkKey::Left => self.left = down,
            WalkKey::Right => self.right = down,
        }
        true
    }

    /// Accumulate pointer movement until the next frame.
    pub fn add_mouse_delta(&mut self, dx: f64, dy: f64) {
        self.mouse_dx += dx;
        self.mouse_dy += dy;
    }

    /// Releasing the lock also releases held keys, since their key-up
    /// events go elsewhere.
    pub fn set_pointer_locked(&mut self, locked: bool) {
        self.pointer_locked = locked;
        if !locked {
            self.forward = false;
            self.backward = false;
            self.left = false;
            self.right = false;
        }
    }

    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    pub fn player_input(&self) -> PlayerInput {
        PlayerInput {
            forward: self.forward,
            backward: self.backward,
            left: self.left,
            right: self.right,
            look_dx: self.mouse_dx as f32,
            look_dy: self.mouse_dy as f32,
            pointer_locked: self.pointer_locked,
        }
    }

    /// Reset per-frame deltas.
    pub fn update(&mut self) {
        self.mouse_dx = 0.0;
        self.mouse_dy = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasd_maps_to_player_input() {
        let mut input = InputState::new();
        assert!(input.set_key("KeyW", true));
        assert!(input.set_key("KeyD", true));
        assert!(!input.set_key("Space", true));
        let p = input.player_input();
        assert!(p.forward && p.right);
        assert!(!p.backward && !p.left);

        input.set_key("KeyW", false);
        assert!(!input.player_input().forward);
    }

    #[test]
    fn test_mouse_delta_accumulates_until_update() {
        let mut input = InputState::new();
        input.add_mouse_delta(3.0, -1.0);
        input.add_mouse_delta(2.0, -1.0);
        let p = input.player_input();
        assert_eq!((p.look_dx, p.look_dy), (5.0, -2.0));
        input.update();
        assert_eq!(input.player_input().look_dx, 0.0);
    }

    #[test]
    fn test_unlock_releases_keys() {
        let mut input = InputState::new();
        input.set_pointer_locked(true);
        input.set_key("KeyA", true);
        input.set_pointer_locked(false);
        let p = input.player_input();
        assert!(!p.left);
        assert!(!p.pointer_locked);
    }
}
