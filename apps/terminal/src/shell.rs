//! # Shell
//!
//! Reads commands line by line and prints everything the client layer
//! publishes while they run.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                             select! loop                               │
//! │                                                                         │
//! │   confirmations.watch() ──► "? Are you sure?: ... [y/n]"                │
//! │   notifications (broadcast) ──► "! Warning: ..."                        │
//! │   session.subscribe() ──► "Session expired. Please log in again."       │
//! │   finished commands (mpsc) ──► rendered output / "✗ [CODE] message"     │
//! │   input lines ──► y/n answer, or parse + spawn dispatch                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One command runs at a time. While it runs, input is only read when a
//! question is waiting for an answer. At end of input a waiting question is
//! cancelled (its caller sees "no") and the shell exits once the running
//! command finishes.

use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use pharmadesk_client::{AppContext, AuthState, SignOutReason, ToastEvent, Transport};

use crate::commands::{dispatch, Command};
use crate::error::{ApiError, ErrorCode};
use crate::render;

pub const GREETING: &str = "PharmaDesk. Type 'help' for commands.";
pub const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

type Finished = Result<String, ApiError>;

pub struct Shell<T: Transport> {
    ctx: Arc<AppContext<T>>,
}

impl<T: Transport> Shell<T> {
    pub fn new(ctx: Arc<AppContext<T>>) -> Self {
        Shell { ctx }
    }

    /// Runs until `quit` or end of input.
    pub async fn run<R, W>(&self, input: R, out: &mut W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        let mut prompts = self.ctx.confirmations.watch();
        let mut toasts = self.ctx.notifications.subscribe();
        let mut auth = self.ctx.session.subscribe();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Finished>();

        let mut busy = false;
        let mut input_open = true;

        writeln!(out, "{}", GREETING)?;
        if let Some(user) = self.ctx.auth.current_user() {
            writeln!(out, "Signed in as {}", render::user(&user))?;
        }

        while input_open || busy {
            let awaiting_answer = self.ctx.confirmations.pending().is_some();

            tokio::select! {
                biased;

                Ok(()) = prompts.changed() => {
                    let prompt = prompts.borrow_and_update().clone();
                    if let Some(prompt) = prompt {
                        writeln!(out, "{}", render::prompt(&prompt))?;
                    }
                }

                event = toasts.recv() => match event {
                    Ok(ToastEvent::Shown(toast)) => writeln!(out, "{}", render::toast(&toast))?,
                    Ok(ToastEvent::Dismissed(_)) => {}
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Missed notifications"),
                    Err(RecvError::Closed) => {}
                },

                Ok(()) = auth.changed() => {
                    let state = auth.borrow_and_update().clone();
                    if let AuthState::SignedOut {
                        reason: Some(SignOutReason::Expired | SignOutReason::Unauthorized),
                    } = state
                    {
                        writeln!(out, "{}", SESSION_EXPIRED)?;
                    }
                }

                Some(result) = done_rx.recv() => {
                    busy = false;
                    match result {
                        Ok(text) if text.is_empty() => {}
                        Ok(text) => writeln!(out, "{}", text)?,
                        Err(err) if err.notified => debug!(error = %err, "Already shown"),
                        Err(err) => writeln!(out, "{}", render::error(&err))?,
                    }
                }

                line = lines.next_line(), if input_open && (!busy || awaiting_answer) => match line {
                    Ok(Some(line)) => {
                        if awaiting_answer {
                            self.answer(&line, out)?;
                        } else if !self.execute(&line, &mut busy, &done_tx, out)? {
                            break;
                        }
                    }
                    Ok(None) | Err(_) => {
                        input_open = false;
                        if self.ctx.confirmations.cancel().is_ok() {
                            debug!("Pending question cancelled at end of input");
                        }
                    }
                },
            }
        }

        out.flush()
    }

    fn answer<W: Write>(&self, line: &str, out: &mut W) -> std::io::Result<()> {
        let answer = match line.trim().to_lowercase().as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => return writeln!(out, "Please answer y or n"),
        };
        if let Err(e) = self.ctx.confirmations.respond(answer) {
            debug!(error = %e, "Answer arrived after the question closed");
        }
        Ok(())
    }

    /// Returns `false` on quit.
    fn execute<W: Write>(
        &self,
        line: &str,
        busy: &mut bool,
        done: &mpsc::UnboundedSender<Finished>,
        out: &mut W,
    ) -> std::io::Result<bool> {
        if line.trim().is_empty() {
            return Ok(true);
        }

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(err) => {
                writeln!(out, "{}", render::error(&err))?;
                return Ok(true);
            }
        };

        match command {
            Command::Quit => Ok(false),
            Command::Help => {
                writeln!(out, "{}", render::HELP)?;
                Ok(true)
            }
            command => {
                *busy = true;
                let ctx = self.ctx.clone();
                let done = done.clone();
                tokio::spawn(async move {
                    let task = tokio::spawn(async move { dispatch(&ctx, command).await });
                    let result = task.await.unwrap_or_else(|e| {
                        error!(error = %e, "Command task failed");
                        Err(ApiError::new(ErrorCode::Internal, "Command failed unexpectedly"))
                    });
                    let _ = done.send(result);
                });
                Ok(true)
            }
        }
    }
}
