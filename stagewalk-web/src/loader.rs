//! Fetch-backed asset loads.

use js_sys::ArrayBuffer;
use stagewalk_core::{AssetError, AssetLoad, ModelAsset, ModelSource};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

fn js_reason(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// Fetch `url` and resolve to its body.
pub async fn fetch_bytes(url: &str) -> Result<ArrayBuffer, AssetError> {
    let fetch_err = |reason: String| AssetError::Fetch {
        url: url.to_string(),
        reason,
    };
    let window = web_sys::window().ok_or_else(|| fetch_err("no window".into()))?;
    let resp = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| fetch_err(js_reason(e)))?;
    let resp: Response = resp
        .dyn_into()
        .map_err(|_| fetch_err("fetch did not return a Response".into()))?;
    if !resp.ok() {
        return Err(fetch_err(format!("HTTP {}", resp.status())));
    }
    let body = resp.array_buffer().map_err(|e| fetch_err(js_reason(e)))?;
    let body = JsFuture::from(body).await.map_err(|e| fetch_err(js_reason(e)))?;
    body.dyn_into::<ArrayBuffer>()
        .map_err(|_| fetch_err("body is not an ArrayBuffer".into()))
}

/// Requests model files over `fetch`. The bytes go to the renderer; the
/// session only learns that the model is there.
#[derive(Debug, Default)]
pub struct WebModels;

impl ModelSource for WebModels {
    fn request(&mut self, url: &str) -> AssetLoad<ModelAsset> {
        let (tx, load) = AssetLoad::channel(url);
        let url = url.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            let fetched = fetch_bytes(&url).await;
            let result = fetched.map(|buf| ModelAsset {
                byte_len: buf.byte_length() as usize,
                url,
            });
            tx.complete(result);
        });
        load
    }
}
