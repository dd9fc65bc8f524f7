use stagewalk_core::render::Primitive;
use stagewalk_core::{Handle, RenderHandle, Session, SessionConfig, StageDef};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::audio::WebAudio;
use crate::clock::FrameClock;
use crate::input::InputState;
use crate::loader::WebModels;

/// Main application state for the WASM runtime.
#[wasm_bindgen]
pub struct App {
    session: Session,
    input: InputState,
    audio: WebAudio,
    clock: FrameClock,
    canvas: HtmlCanvasElement,
}

/// Accept either a built-in stage name or a whole stage file.
fn resolve_stage(stage: &str) -> Result<StageDef, JsValue> {
    let def = if stage.contains('=') || stage.contains('[') {
        StageDef::from_toml(stage)
    } else {
        StageDef::builtin(stage)
    };
    def.map_err(|e| JsValue::from_str(&format!("Failed to load stage: {e}")))
}

#[wasm_bindgen]
impl App {
    /// Create an App rendering into `canvas_id` with the given stage.
    pub fn new(canvas_id: &str, stage: &str) -> Result<App, JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("Canvas not found")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| "Element is not a canvas")?;

        let def = resolve_stage(stage)?;
        let mut audio = WebAudio::new()?;
        for url in def.sound_urls() {
            audio.load(&url);
        }

        let mut session = Session::new(SessionConfig {
            seed: js_sys::Date::now() as u64,
            ..SessionConfig::default()
        });
        let summary = def
            .build(&mut session, &mut WebModels)
            .map_err(|e| JsValue::from_str(&format!("Failed to build stage: {e}")))?;

        log::info!(
            "Loaded stage '{}': {} nodes, {} bodies, {} models loading",
            def.name,
            summary.nodes,
            summary.bodies,
            summary.models_requested,
        );

        Ok(App {
            session,
            input: InputState::new(),
            audio,
            clock: FrameClock::new(),
            canvas,
        })
    }

    /// Run one frame of the game loop. Called from requestAnimationFrame
    /// with its timestamp in milliseconds.
    pub fn frame(&mut self, time: f64) {
        if self.session.is_ended() {
            return;
        }
        let dt = self.clock.tick(time);
        let input = self.input.player_input();
        self.session.frame(dt as f32, &input, &mut self.audio);
        self.input.update();
    }

    pub fn key_down(&mut self, code: &str) -> bool {
        self.input.set_key(code, true)
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        self.input.set_key(code, false)
    }

    pub fn mouse_move(&mut self, dx: f64, dy: f64) {
        if self.input.pointer_locked() {
            self.input.add_mouse_delta(dx, dy);
        }
    }

    pub fn set_pointer_locked(&mut self, locked: bool) {
        self.input.set_pointer_locked(locked);
    }

    /// Call from the click that requests pointer lock.
    pub fn resume_audio(&self) {
        self.audio.resume();
    }

    /// Visible nodes flattened to `INSTANCE_FLOATS` floats each. The first
    /// two floats of a record are the handle's low 16 bits and the rest.
    pub fn snapshot(&self) -> Vec<f32> {
        let records = self.session.scene.snapshot();
        bytemuck::cast_slice(&records).to_vec()
    }

    /// Text, model URL, ground texture or newline-separated skybox faces
    /// behind a snapshot handle (`high * 65536 + low`).
    pub fn node_content(&self, handle: f64) -> Option<String> {
        let node = self.session.scene.get(RenderHandle::from_raw(handle as u64))?;
        match &node.primitive {
            Primitive::Text { text, .. } | Primitive::Bubble { text, .. } => Some(text.clone()),
            Primitive::Model { url } => Some(url.clone()),
            Primitive::Ground { texture, .. } => Some(texture.clone()),
            Primitive::Skybox { faces } => Some(faces.join("\n")),
            _ => None,
        }
    }

    /// Camera position followed by its orientation quaternion (x, y, z, w).
    pub fn camera(&self) -> Vec<f32> {
        let player = self.session.player();
        let position: glam::Vec3 = player.position();
        let rotation: glam::Quat = player.orientation();
        let mut out = position.to_array().to_vec();
        out.extend_from_slice(&rotation.to_array());
        out
    }

    /// Models still loading.
    pub fn models_pending(&self) -> usize {
        self.session.pending_models()
    }

    pub fn live_particles(&self) -> usize {
        self.session.live_particles()
    }

    /// Tear the stage down. The App does nothing afterwards.
    pub fn end(&mut self) {
        self.session.end();
    }

    /// Get the canvas width.
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    /// Get the canvas height.
    pub fn height(&self) -> u32 {
        self.canvas.height()
    }
}
