//! User-facing notices.
//!
//! Everything a UI would surface as a toast flows through here: model
//! loading progress, the fallback warning, terminal unavailability and the
//! outcome of each classification. Notices are fire-and-forget; a dropped
//! [`NoticeStream`] never fails the operation that emitted them.

use chrono::{DateTime, Utc};
use futures::Stream;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sightline_types::DeviceMode;
use sightline_types::json;
use sightline_types::sync::mpsc;
use std::pin::Pin;
use std::task::{Context, Poll};
use uuid::Uuid;

use crate::error::ErrorKind;

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoticeKind {
    ModelLoading {
        device: DeviceMode,
    },
    /// `accelerated_error` is set when this load is the CPU fallback
    ModelLoaded {
        device: DeviceMode,
        model_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        accelerated_error: Option<String>,
    },
    ModelUnavailable {
        reason: String,
    },
    /// The caller driving a load went away before it finished. Closes the
    /// preceding `ModelLoading`; the state is back to what it was before.
    ModelLoadAbandoned {
        device: DeviceMode,
    },
    ClassificationComplete {
        request_id: Uuid,
        top_label: String,
        top_percentage: u8,
        latency_ms: u64,
    },
    ClassificationFailed {
        request_id: Uuid,
        kind: ErrorKind,
        message: String,
    },
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct Notice {
    #[serde(flatten)]
    pub kind: NoticeKind,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(kind: NoticeKind) -> Self {
        Self {
            kind,
            created_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self.kind,
            NoticeKind::ModelUnavailable { .. } | NoticeKind::ClassificationFailed { .. }
        )
    }

    pub fn is_fallback(&self) -> bool {
        matches!(
            self.kind,
            NoticeKind::ModelLoaded {
                device: DeviceMode::Fallback,
                ..
            }
        )
    }

    pub fn to_ndjson(&self) -> String {
        json::to_string(self).unwrap_or_default() + "\n"
    }
}

/// Sending half. A disabled sender drops every notice.
#[derive(Clone, Debug, Default)]
pub struct NoticeSender {
    tx: Option<mpsc::UnboundedSender<Notice>>,
}

impl NoticeSender {
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, kind: NoticeKind) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Notice::new(kind));
        }
    }
}

/// Stream of notices in emission order
pub struct NoticeStream {
    rx: mpsc::UnboundedReceiver<Notice>,
}

impl NoticeStream {
    pub async fn recv(&mut self) -> Option<Notice> {
        self.rx.recv().await
    }

    /// Drain whatever has been emitted so far without waiting.
    pub fn drain(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.rx.try_recv() {
            notices.push(notice);
        }
        notices
    }
}

impl Stream for NoticeStream {
    type Item = Notice;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_recv(cx)
    }
}

pub fn notice_channel() -> (NoticeSender, NoticeStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NoticeSender { tx: Some(tx) }, NoticeStream { rx })
}
