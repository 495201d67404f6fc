//! # Confirmations
//!
//! Yes/no prompts with at most one pending at a time.
//!
//! ## Single-Pending Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caller A ── confirm() ──► gate (tokio Mutex, FIFO) ──► slot: prompt A │
//! │  caller B ── confirm() ──► waits on gate                               │
//! │                                                                         │
//! │  UI ── watch() sees prompt A ── respond(true) ──► A resolves true      │
//! │                                                                         │
//! │  gate released ──► slot: prompt B ──► watch() sees prompt B            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The slot is cleared when `confirm` finishes or is dropped, so a cancelled
//! caller never leaves a stale prompt behind.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::{oneshot, watch};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};

/// Title used when the caller gives none.
pub const DEFAULT_TITLE: &str = "Are you sure?";

/// The prompt as a renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConfirmPrompt {
    pub id: String,
    pub title: String,
    pub message: String,
}

struct Pending {
    prompt: ConfirmPrompt,
    responder: oneshot::Sender<bool>,
}

pub struct ConfirmationService {
    gate: tokio::sync::Mutex<()>,
    slot: Mutex<Option<Pending>>,
    prompts: watch::Sender<Option<ConfirmPrompt>>,
}

impl ConfirmationService {
    pub fn new() -> Self {
        let (prompts, _) = watch::channel(None);
        ConfirmationService {
            gate: tokio::sync::Mutex::new(()),
            slot: Mutex::new(None),
            prompts,
        }
    }

    /// Asks the user and waits for the answer.
    ///
    /// Queues behind any prompt already pending. Resolves to `false` if the
    /// prompt is cancelled.
    pub async fn confirm(&self, message: &str, title: Option<&str>) -> bool {
        let _turn = self.gate.lock().await;

        let prompt = ConfirmPrompt {
            id: Uuid::new_v4().to_string(),
            title: title.unwrap_or(DEFAULT_TITLE).to_string(),
            message: message.to_string(),
        };
        let (responder, answer) = oneshot::channel();

        debug!(title = %prompt.title, message = %prompt.message, "Confirmation requested");
        let _clear = SlotGuard {
            service: self,
            id: prompt.id.clone(),
        };
        *self.slot() = Some(Pending {
            prompt: prompt.clone(),
            responder,
        });
        self.prompts.send_replace(Some(prompt));

        answer.await.unwrap_or(false)
    }

    /// Answers the pending prompt.
    pub fn respond(&self, answer: bool) -> ClientResult<()> {
        let pending = self.slot().take().ok_or(ClientError::NothingPending)?;
        debug!(answer, title = %pending.prompt.title, "Confirmation answered");
        let _ = pending.responder.send(answer);
        Ok(())
    }

    /// Drops the pending prompt; its caller sees `false`.
    pub fn cancel(&self) -> ClientResult<()> {
        self.slot()
            .take()
            .map(drop)
            .ok_or(ClientError::NothingPending)
    }

    pub fn pending(&self) -> Option<ConfirmPrompt> {
        self.slot().as_ref().map(|p| p.prompt.clone())
    }

    pub fn watch(&self) -> watch::Receiver<Option<ConfirmPrompt>> {
        self.prompts.subscribe()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Pending>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ConfirmationService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfirmationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationService")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Clears the slot and the published prompt when `confirm` ends.
struct SlotGuard<'a> {
    service: &'a ConfirmationService,
    id: String,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.service.slot();
        if slot.as_ref().is_some_and(|p| p.prompt.id == self.id) {
            *slot = None;
        }
        drop(slot);
        self.service.prompts.send_if_modified(|current| {
            if current.as_ref().is_some_and(|p| p.id == self.id) {
                *current = None;
                true
            } else {
                false
            }
        });
    }
}
