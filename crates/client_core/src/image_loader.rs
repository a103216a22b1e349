//! Reads user-selected files into data URLs.
//!
//! Each [`ImageSlot`] has at most one read in flight. Starting a new read for
//! a slot aborts the previous one, and every outcome carries the generation it
//! was started with so a late completion can still be recognized as stale by
//! whoever applies it (see [`crate::wizard::Wizard::finish_image_load`]).

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use shared::domain::{DataUrl, ImageSlot};
use thiserror::Error;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageLoadError {
    #[error("could not read '{path}': {reason}")]
    Read { path: String, reason: String },
    #[error("'{path}' is empty")]
    Empty { path: String },
}

#[derive(Debug, Clone)]
pub struct ImageLoadOutcome {
    pub slot: ImageSlot,
    pub generation: u64,
    pub result: Result<DataUrl, ImageLoadError>,
}

pub fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DataUrl::FALLBACK_MIME)
        .to_string()
}

pub async fn read_data_url(path: &Path) -> Result<DataUrl, ImageLoadError> {
    let shown = path.display().to_string();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ImageLoadError::Read {
            path: shown.clone(),
            reason: err.to_string(),
        })?;
    if bytes.is_empty() {
        return Err(ImageLoadError::Empty { path: shown });
    }
    let mime = guess_mime(path);
    debug!(path = %shown, mime = %mime, bytes = bytes.len(), "image: read file");
    Ok(DataUrl::from_bytes(&mime, &bytes))
}

pub struct ImageLoader {
    runtime: Handle,
    inflight: HashMap<ImageSlot, (u64, JoinHandle<()>)>,
}

impl ImageLoader {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            inflight: HashMap::new(),
        }
    }

    /// Starts reading `path` for `slot`, superseding any read already running
    /// for that slot. `on_done` is not called for a read that was aborted
    /// before it finished.
    pub fn load<F>(&mut self, slot: ImageSlot, generation: u64, path: PathBuf, on_done: F)
    where
        F: FnOnce(ImageLoadOutcome) + Send + 'static,
    {
        if let Some((previous, handle)) = self.inflight.remove(&slot) {
            if !handle.is_finished() {
                info!(%slot, superseded = previous, generation, "image: superseding in-flight read");
                handle.abort();
            }
        }

        let handle = self.runtime.spawn(async move {
            let result = read_data_url(&path).await;
            if let Err(err) = &result {
                warn!(%slot, generation, "image: read failed: {err}");
            }
            on_done(ImageLoadOutcome {
                slot,
                generation,
                result,
            });
        });
        self.inflight.insert(slot, (generation, handle));
    }

    pub fn cancel(&mut self, slot: ImageSlot) {
        if let Some((generation, handle)) = self.inflight.remove(&slot) {
            debug!(%slot, generation, "image: cancelling read");
            handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for slot in ImageSlot::ALL {
            self.cancel(slot);
        }
    }

    pub fn in_flight(&self, slot: ImageSlot) -> Option<u64> {
        self.inflight
            .get(&slot)
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(generation, _)| *generation)
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
#[path = "tests/image_loader_tests.rs"]
mod tests;
