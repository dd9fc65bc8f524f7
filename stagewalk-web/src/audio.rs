//! WebAudio playback for collision notes.

use std::collections::HashMap;

use stagewalk_core::{AssetError, AssetLoad, AudioError, AudioSink, LoadPoll, SoundId};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioBuffer, AudioContext, AudioContextState};

use crate::loader::fetch_bytes;

enum Slot {
    Loading(AssetLoad<AudioBuffer>),
    Ready(AudioBuffer),
    Failed,
}

/// Decodes sounds by URL and plays them on one shared context.
pub struct WebAudio {
    ctx: AudioContext,
    sounds: HashMap<SoundId, Slot>,
}

impl WebAudio {
    pub fn new() -> Result<Self, JsValue> {
        Ok(Self {
            ctx: AudioContext::new()?,
            sounds: HashMap::new(),
        })
    }

    /// Start fetching and decoding `url`. The sound reports `NotReady`
    /// until decoding finishes.
    pub fn load(&mut self, url: &str) {
        let id = SoundId::new(url);
        if self.sounds.contains_key(&id) {
            return;
        }
        let (tx, load) = AssetLoad::channel(url);
        let ctx = self.ctx.clone();
        let url = url.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            let result = decode(&ctx, &url).await;
            tx.complete(result);
        });
        self.sounds.insert(id, Slot::Loading(load));
    }

    /// Browsers keep a new context suspended until a user gesture.
    pub fn resume(&self) {
        if self.ctx.state() == AudioContextState::Suspended {
            match self.ctx.resume() {
                Ok(promise) => {
                    wasm_bindgen_futures::spawn_local(async move {
                        if JsFuture::from(promise).await.is_ok() {
                            log::info!("AudioContext resumed");
                        }
                    });
                }
                Err(e) => log::warn!("AudioContext resume failed: {e:?}"),
            }
        }
    }

    fn start(&self, buffer: &AudioBuffer) -> Result<(), JsValue> {
        let source = self.ctx.create_buffer_source()?;
        source.set_buffer(Some(buffer));
        source.connect_with_audio_node(&self.ctx.destination())?;
        source.start()?;
        Ok(())
    }
}

async fn decode(ctx: &AudioContext, url: &str) -> Result<AudioBuffer, AssetError> {
    let bytes = fetch_bytes(url).await?;
    let decode_err = |e: JsValue| AssetError::Decode {
        url: url.to_string(),
        reason: e.as_string().unwrap_or_else(|| format!("{e:?}")),
    };
    let promise = ctx.decode_audio_data(&bytes).map_err(decode_err)?;
    let buffer = JsFuture::from(promise).await.map_err(decode_err)?;
    buffer
        .dyn_into::<AudioBuffer>()
        .map_err(decode_err)
}

impl AudioSink for WebAudio {
    fn play(&mut self, sound: &SoundId) -> Result<(), AudioError> {
        let slot = self
            .sounds
            .get_mut(sound)
            .ok_or_else(|| AudioError::Unknown(sound.0.clone()))?;

        if let Slot::Loading(load) = slot {
            match load.poll() {
                LoadPoll::Pending => return Err(AudioError::NotReady(sound.0.clone())),
                LoadPoll::Ready(buffer) => {
                    log::info!("sound {} decoded", sound.0);
                    *slot = Slot::Ready(buffer);
                }
                LoadPoll::Failed(e) => {
                    log::error!("failed to load sound {}: {e}", sound.0);
                    *slot = Slot::Failed;
                }
            }
        }

        match slot {
            Slot::Ready(buffer) => {
                let buffer = buffer.clone();
                self.start(&buffer)
                    .map_err(|e| AudioError::Backend(format!("{e:?}")))
            }
            Slot::Loading(_) => Err(AudioError::NotReady(sound.0.clone())),
            // A sound that failed to load stays silent, like a missing one.
            Slot::Failed => Err(AudioError::NotReady(sound.0.clone())),
        }
    }
}
