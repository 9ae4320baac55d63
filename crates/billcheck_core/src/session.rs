//! The upload-and-inference session: one selected file, its preview, and the
//! lifecycle of at most one in-flight prediction request.
//!
//! All mutation goes through the transition methods below; background work
//! (preview decode, HTTP round trip) reports back over channels that
//! [`Session::poll`] drains on the interface thread. Every spawned task
//! carries the session generation at spawn time, and its result is applied
//! only if that token still matches — a completion for a replaced or cleared
//! selection is discarded, never displayed.

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::thread;

use anyhow::Context;

use crate::client::{InferenceClient, PredictError, Prediction};
use crate::preview::{self, PreviewImage};

/// Fixed user-visible message for any submission failure. The actual cause
/// goes to the log, not the screen.
pub const SUBMIT_FAILED_MESSAGE: &str = "Prediction failed. Please try again.";

/// A candidate file: name plus its raw bytes. Cloning shares the bytes.
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    bytes: Arc<Vec<u8>>,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Reads a file eagerly. Used by the GUI for both the picker and drop
    /// paths; a failure here produces no selection and no error surface.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn bytes(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.bytes)
    }
}

/// Lifecycle of a prediction request for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPhase {
    Idle,
    InFlight,
    Succeeded(Prediction),
    Failed(String),
}

/// Read-only view of the session for the presentation layer. Owned and
/// cheap: strings are short, pixels are shared via `Arc`.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub preview: Option<Arc<PreviewImage>>,
    pub phase: RequestPhase,
    pub is_submittable: bool,
    pub drag_active: bool,
    /// Changes on every select/clear; lets the GUI invalidate its texture.
    pub generation: u64,
}

struct PendingTask<T> {
    token: u64,
    rx: Receiver<T>,
}

type PreviewResult = Result<PreviewImage, image::ImageError>;
type SubmitResult = Result<Prediction, PredictError>;

/// Session state container. Single-threaded: all methods are called from the
/// interface thread; workers only ever talk back through their channel.
pub struct Session {
    client: InferenceClient,
    selection: Option<FileHandle>,
    preview: Option<Arc<PreviewImage>>,
    phase: RequestPhase,
    drag_active: bool,
    generation: u64,
    pending_preview: Option<PendingTask<PreviewResult>>,
    pending_submit: Option<PendingTask<SubmitResult>>,
}

impl Session {
    pub fn new(client: InferenceClient) -> Self {
        Self {
            client,
            selection: None,
            preview: None,
            phase: RequestPhase::Idle,
            drag_active: false,
            generation: 0,
            pending_preview: None,
            pending_submit: None,
        }
    }

    /// Replaces the selection, resets preview and result, and kicks off the
    /// preview decode for the new file.
    pub fn select_file(&mut self, file: FileHandle) {
        self.generation += 1;
        tracing::info!("selected {} ({} bytes)", file.name(), file.size());

        self.preview = None;
        self.phase = RequestPhase::Idle;

        let (tx, rx) = channel();
        let token = self.generation;
        let bytes = file.bytes();
        thread::spawn(move || {
            let _ = tx.send(preview::decode(&bytes));
        });
        self.pending_preview = Some(PendingTask { token, rx });
        self.selection = Some(file);
    }

    /// Resets selection, preview, and request lifecycle in one step. Any
    /// in-flight work becomes stale and is discarded on arrival.
    pub fn clear_selection(&mut self) {
        self.generation += 1;
        self.selection = None;
        self.preview = None;
        self.phase = RequestPhase::Idle;
        self.pending_preview = None;
    }

    pub fn drag_enter(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_over(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_leave(&mut self) {
        self.drag_active = false;
    }

    /// A drop ends the drag and selects the dropped file.
    pub fn drop_file(&mut self, file: FileHandle) {
        self.drag_active = false;
        self.select_file(file);
    }

    /// Starts a prediction request for the current selection. A no-op
    /// without a selection or while a request is already in flight; allowed
    /// again once a result (or failure) has arrived.
    pub fn submit(&mut self) {
        if self.phase == RequestPhase::InFlight {
            tracing::debug!("submit ignored: request already in flight");
            return;
        }
        let Some(file) = &self.selection else {
            tracing::debug!("submit ignored: no file selected");
            return;
        };

        tracing::info!("submitting {} to {}", file.name(), self.client.url());
        let (tx, rx) = channel();
        let token = self.generation;
        let client = self.client.clone();
        let name = file.name().to_owned();
        let bytes = file.bytes();
        thread::spawn(move || {
            let _ = tx.send(client.predict(&name, &bytes));
        });
        self.pending_submit = Some(PendingTask { token, rx });
        self.phase = RequestPhase::InFlight;
    }

    /// Drains completed background work and applies results that still
    /// belong to the current selection. Called once per frame by the GUI.
    pub fn poll(&mut self) {
        if let Some(pending) = self.pending_preview.take() {
            match pending.rx.try_recv() {
                Ok(result) => self.apply_preview(pending.token, result),
                Err(TryRecvError::Empty) => self.pending_preview = Some(pending),
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("preview decode worker dropped without a result");
                }
            }
        }

        if let Some(pending) = self.pending_submit.take() {
            match pending.rx.try_recv() {
                Ok(result) => self.apply_submit(pending.token, result),
                Err(TryRecvError::Empty) => self.pending_submit = Some(pending),
                Err(TryRecvError::Disconnected) => {
                    // The lifecycle must never stay stuck in InFlight.
                    tracing::warn!("prediction worker dropped without a result");
                    if pending.token == self.generation && self.phase == RequestPhase::InFlight {
                        self.phase = RequestPhase::Failed(SUBMIT_FAILED_MESSAGE.to_string());
                    }
                }
            }
        }
    }

    fn apply_preview(&mut self, token: u64, result: PreviewResult) {
        if token != self.generation {
            tracing::debug!("discarding stale preview decode");
            return;
        }
        match result {
            Ok(image) => self.preview = Some(Arc::new(image)),
            // Deliberately silent at the user surface: no preview, no message.
            Err(err) => tracing::warn!("preview decode failed: {err}"),
        }
    }

    fn apply_submit(&mut self, token: u64, result: SubmitResult) {
        if token != self.generation {
            tracing::debug!("discarding prediction response for a replaced selection");
            return;
        }
        match result {
            Ok(prediction) => {
                tracing::info!(
                    "prediction: {} (confidence {:?})",
                    prediction.label,
                    prediction.confidence
                );
                self.phase = RequestPhase::Succeeded(prediction);
            }
            Err(err) => {
                tracing::warn!("prediction request failed: {err}");
                self.phase = RequestPhase::Failed(SUBMIT_FAILED_MESSAGE.to_string());
            }
        }
    }

    pub fn is_submittable(&self) -> bool {
        self.selection.is_some() && self.phase != RequestPhase::InFlight
    }

    pub fn drag_active(&self) -> bool {
        self.drag_active
    }

    /// True while a decode or request is outstanding; the GUI keeps
    /// repainting while this holds.
    pub fn is_busy(&self) -> bool {
        self.pending_preview.is_some() || self.phase == RequestPhase::InFlight
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            file_name: self.selection.as_ref().map(|f| f.name().to_owned()),
            file_size: self.selection.as_ref().map(|f| f.size()),
            preview: self.preview.clone(),
            phase: self.phase.clone(),
            is_submittable: self.is_submittable(),
            drag_active: self.drag_active,
            generation: self.generation,
        }
    }
}
