//! One-shot asset loads that resolve while the frame loop keeps running.
//!
//! The platform layer does the actual fetching on its own event loop and
//! completes an [`AssetSender`]; the session polls the matching
//! [`AssetLoad`] once per frame and never blocks on it.

use futures::channel::oneshot;

use crate::error::AssetError;

/// A fetched model file. Decoding it is left to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    pub url: String,
    pub byte_len: usize,
}

/// Starts model loads for a stage being built.
pub trait ModelSource {
    fn request(&mut self, url: &str) -> AssetLoad<ModelAsset>;
}

/// Resolves every request on the spot, for headless runs.
#[derive(Debug, Default)]
pub struct ImmediateModels {
    pub requested: Vec<String>,
}

impl ModelSource for ImmediateModels {
    fn request(&mut self, url: &str) -> AssetLoad<ModelAsset> {
        self.requested.push(url.to_string());
        AssetLoad::ready(
            url,
            ModelAsset {
                url: url.to_string(),
                byte_len: 0,
            },
        )
    }
}

#[derive(Debug, PartialEq)]
pub enum LoadPoll<T> {
    Pending,
    Ready(T),
    Failed(AssetError),
}

/// Completing half of a load.
pub struct AssetSender<T> {
    tx: oneshot::Sender<Result<T, AssetError>>,
}

impl<T> AssetSender<T> {
    pub fn complete(self, result: Result<T, AssetError>) {
        // The receiver is gone when the session ended first; nothing to do.
        let _ = self.tx.send(result);
    }

    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    pub fn fail(self, err: AssetError) {
        self.complete(Err(err));
    }
}

/// Polling half of a load, tagged with the URL it was requested for.
pub struct AssetLoad<T> {
    url: String,
    rx: Option<oneshot::Receiver<Result<T, AssetError>>>,
}

impl<T> AssetLoad<T> {
    pub fn channel(url: impl Into<String>) -> (AssetSender<T>, AssetLoad<T>) {
        let (tx, rx) = oneshot::channel();
        (
            AssetSender { tx },
            AssetLoad {
                url: url.into(),
                rx: Some(rx),
            },
        )
    }

    /// A load that has already finished.
    pub fn ready(url: impl Into<String>, value: T) -> Self {
        let (tx, load) = Self::channel(url);
        tx.succeed(value);
        load
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check for a result without blocking. After `Ready` or `Failed` has
    /// been returned once, further polls report `Failed(Cancelled)`.
    pub fn poll(&mut self) -> LoadPoll<T> {
        let Some(rx) = self.rx.as_mut() else {
            return LoadPoll::Failed(AssetError::Cancelled);
        };
        match rx.try_recv() {
            Ok(None) => LoadPoll::Pending,
            Ok(Some(result)) => {
                self.rx = None;
                match result {
                    Ok(value) => LoadPoll::Ready(value),
                    Err(e) => LoadPoll::Failed(e),
                }
            }
            Err(oneshot::Canceled) => {
                self.rx = None;
                LoadPoll::Failed(AssetError::Cancelled)
            }
        }
    }
}
