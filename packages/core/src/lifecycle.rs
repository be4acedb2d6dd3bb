//! Lazy, single-flight model acquisition with accelerated-to-CPU fallback.
//!
//! ```text
//! Unloaded ──ensure_ready──▶ Loading(Accelerated) ──ok──▶ Ready(Accelerated)
//!                                   │ err
//!                                   ▼
//!                            Loading(Fallback) ──ok──▶ Ready(Fallback)
//!                                   │ err
//!                                   ▼
//!                                 Failed ──ensure_ready──▶ Loading(Accelerated) …
//! ```
//!
//! Only one acquisition runs at a time. Callers that arrive while it is in
//! flight wait for it and share its outcome, including a failure. A caller
//! that arrives after a failure has settled starts a fresh attempt.

use parking_lot::RwLock;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sightline_model_provider::{ImageClassifierLogic, ModelLoader};
use sightline_types::DeviceMode;
use sightline_types::sync::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{SightlineError, SightlineResult};
use crate::notice::{NoticeKind, NoticeSender};

struct HandleInner {
    device: DeviceMode,
    model_id: String,
    model: Mutex<Box<dyn ImageClassifierLogic>>,
}

/// Shared reference to a loaded model.
///
/// Clones point at the same model. Inference needs exclusive access, so
/// [`ModelHandle::lock`] serializes concurrent classifications.
#[derive(Clone)]
pub struct ModelHandle {
    inner: Arc<HandleInner>,
}

impl ModelHandle {
    pub fn new(device: DeviceMode, model: Box<dyn ImageClassifierLogic>) -> Self {
        let model_id = model.model_id().to_string();
        Self {
            inner: Arc::new(HandleInner {
                device,
                model_id,
                model: Mutex::new(model),
            }),
        }
    }

    pub fn device(&self) -> DeviceMode {
        self.inner.device
    }

    pub fn model_id(&self) -> &str {
        &self.inner.model_id
    }

    /// Whether both handles refer to the same loaded model.
    pub fn same_model(&self, other: &ModelHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub async fn lock(&self) -> MutexGuard<'_, Box<dyn ImageClassifierLogic>> {
        self.inner.model.lock().await
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("device", &self.inner.device)
            .field("model_id", &self.inner.model_id)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub enum LifecycleState {
    Unloaded,
    Loading(DeviceMode),
    Ready(DeviceMode, ModelHandle),
    Failed(String),
}

impl LifecycleState {
    pub fn status(&self) -> LifecycleStatus {
        match self {
            LifecycleState::Unloaded => LifecycleStatus::Unloaded,
            LifecycleState::Loading(device) => LifecycleStatus::Loading { device: *device },
            LifecycleState::Ready(device, handle) => LifecycleStatus::Ready {
                device: *device,
                model_id: handle.model_id().to_string(),
            },
            LifecycleState::Failed(reason) => LifecycleStatus::Failed {
                reason: reason.clone(),
            },
        }
    }
}

/// Serializable view of [`LifecycleState`] without the handle.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifecycleStatus {
    Unloaded,
    Loading { device: DeviceMode },
    Ready { device: DeviceMode, model_id: String },
    Failed { reason: String },
}

enum Admission {
    Ready(ModelHandle),
    SharedFailure(String),
    Acquire(LifecycleState),
}

pub struct ModelLifecycleManager {
    loader: Arc<dyn ModelLoader>,
    state: RwLock<LifecycleState>,
    /// Serializes acquisition attempts
    flight: Mutex<()>,
    /// Bumped whenever an attempt settles (Ready or Failed)
    settled: AtomicU64,
    notices: NoticeSender,
}

impl ModelLifecycleManager {
    pub fn new(loader: Arc<dyn ModelLoader>, notices: NoticeSender) -> Self {
        Self {
            loader,
            state: RwLock::new(LifecycleState::Unloaded),
            flight: Mutex::new(()),
            settled: AtomicU64::new(0),
            notices,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state.read().clone()
    }

    pub fn status(&self) -> LifecycleStatus {
        self.state.read().status()
    }

    /// The loaded model, if any. Never triggers a load.
    pub fn handle(&self) -> Option<ModelHandle> {
        match &*self.state.read() {
            LifecycleState::Ready(_, handle) => Some(handle.clone()),
            _ => None,
        }
    }

    pub fn device(&self) -> Option<DeviceMode> {
        self.handle().map(|h| h.device())
    }

    /// Return the loaded model, acquiring it first if needed.
    pub async fn ensure_ready(&self) -> SightlineResult<ModelHandle> {
        if let Some(handle) = self.handle() {
            return Ok(handle);
        }

        let observed = self.settled.load(Ordering::Acquire);
        let _flight = self.flight.lock().await;

        let admission = {
            let state = self.state.read();
            match &*state {
                LifecycleState::Ready(_, handle) => Admission::Ready(handle.clone()),
                LifecycleState::Failed(reason)
                    if self.settled.load(Ordering::Acquire) != observed =>
                {
                    Admission::SharedFailure(reason.clone())
                }
                other => Admission::Acquire(other.clone()),
            }
        };

        match admission {
            Admission::Ready(handle) => Ok(handle),
            Admission::SharedFailure(reason) => {
                tracing::debug!(%reason, "Sharing outcome of concurrent model acquisition");
                Err(SightlineError::ModelUnavailable { reason })
            }
            Admission::Acquire(previous) => self.acquire(previous).await,
        }
    }

    /// Forget the loaded model or the last failure so the next
    /// [`ensure_ready`](Self::ensure_ready) starts over. Ignored while an
    /// acquisition is in flight; returns whether the state changed.
    pub fn reset(&self) -> bool {
        let mut state = self.state.write();
        match &*state {
            LifecycleState::Loading(_) => false,
            LifecycleState::Unloaded => false,
            _ => {
                *state = LifecycleState::Unloaded;
                tracing::info!("Model lifecycle reset");
                true
            }
        }
    }

    fn set_state(&self, next: LifecycleState) {
        *self.state.write() = next;
    }

    async fn acquire(&self, previous: LifecycleState) -> SightlineResult<ModelHandle> {
        let mut guard = AttemptGuard {
            manager: self,
            previous: Some(previous),
            device: None,
        };
        let mut failures: Vec<String> = Vec::new();

        for device in DeviceMode::ACQUISITION_ORDER {
            self.set_state(LifecycleState::Loading(device));
            guard.device = Some(device);
            self.notices.emit(NoticeKind::ModelLoading { device });
            tracing::info!(device = %device, "Loading classification model");

            match self.loader.load(device).await {
                Ok(model) => {
                    let handle = ModelHandle::new(device, model);
                    self.set_state(LifecycleState::Ready(device, handle.clone()));
                    guard.settle();

                    tracing::info!(
                        device = %device,
                        model = %handle.model_id(),
                        "Classification model ready"
                    );
                    self.notices.emit(NoticeKind::ModelLoaded {
                        device,
                        model_id: handle.model_id().to_string(),
                        accelerated_error: failures.first().cloned(),
                    });
                    return Ok(handle);
                }
                Err(e) => {
                    tracing::warn!(device = %device, error = %e, "Model acquisition failed");
                    failures.push(format!("{device}: {e}"));
                }
            }
        }

        let reason = failures.join("; ");
        self.set_state(LifecycleState::Failed(reason.clone()));
        guard.settle();

        tracing::error!(%reason, "Model unavailable on every device");
        self.notices.emit(NoticeKind::ModelUnavailable {
            reason: reason.clone(),
        });
        Err(SightlineError::ModelUnavailable { reason })
    }
}

/// Restores the pre-attempt state if the acquiring future is dropped midway,
/// so a waiting caller can take over instead of finding a stale `Loading`.
/// Observers get a `ModelLoadAbandoned` to close the open `ModelLoading`.
struct AttemptGuard<'a> {
    manager: &'a ModelLifecycleManager,
    previous: Option<LifecycleState>,
    /// Device of the load currently in flight
    device: Option<DeviceMode>,
}

impl AttemptGuard<'_> {
    fn settle(&mut self) {
        self.previous = None;
        self.manager.settled.fetch_add(1, Ordering::Release);
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            tracing::warn!(device = ?self.device, "Model acquisition abandoned, restoring previous state");
            self.manager.set_state(previous);
            if let Some(device) = self.device {
                self.manager
                    .notices
                    .emit(NoticeKind::ModelLoadAbandoned { device });
            }
        }
    }
}
