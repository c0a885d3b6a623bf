//! Ordered progress reporting for a single lending action.
//!
//! Every action owns exactly one [`Reporter`], the only writer of its status
//! sequence. Any number of readers observe the sequence through the
//! cloneable [`Log`]. Updates are never removed, carry strictly increasing
//! timestamps and the sequence ends with exactly one terminal update
//! (`is_processing == false`). Terminal updates consume the reporter, so no
//! update can follow them.

use {
    crate::domain::eth,
    chrono::{DateTime, Utc},
    futures::{Stream, StreamExt, channel::mpsc},
    serde::Serialize,
    serde_with::serde_as,
    std::{
        pin::Pin,
        sync::{Arc, Mutex, MutexGuard, PoisonError},
        task::{Context, Poll},
    },
};

/// A lifecycle phase of an action.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    ApprovalRequired,
    ApprovalConfirmed,
    GasEstimated,
    Submitted,
    Confirmed,
    Reverted,
    Timeout,
    Failed,
}

impl Step {
    pub fn label(self) -> &'static str {
        match self {
            Step::ApprovalRequired => "approval-required",
            Step::ApprovalConfirmed => "approval-confirmed",
            Step::GasEstimated => "gas-estimated",
            Step::Submitted => "submitted",
            Step::Confirmed => "confirmed",
            Step::Reverted => "reverted",
            Step::Timeout => "timeout",
            Step::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Step::Confirmed | Step::Reverted | Step::Timeout | Step::Failed
        )
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub step: Step,
    /// Human readable description of the update.
    pub message: String,
    pub is_processing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<eth::TxHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<serde_with::DisplayFromStr>")]
    pub explorer_url: Option<reqwest::Url>,
    pub timestamp: DateTime<Utc>,
}

/// A transaction an update refers to.
#[derive(Clone, Debug)]
pub struct Link {
    pub hash: eth::TxHash,
    pub explorer_url: Option<reqwest::Url>,
}

#[derive(Default)]
struct State {
    history: Vec<StatusUpdate>,
    subscribers: Vec<mpsc::UnboundedSender<StatusUpdate>>,
    closed: bool,
}

/// Creates the status sequence of a new action.
pub fn channel() -> (Reporter, Log) {
    let state = Arc::new(Mutex::new(State::default()));
    (
        Reporter {
            state: state.clone(),
        },
        Log { state },
    )
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The single writer of an action's status sequence.
pub struct Reporter {
    state: Arc<Mutex<State>>,
}

impl Reporter {
    /// Records a non-terminal update.
    pub fn progress(&mut self, step: Step, message: impl Into<String>, link: Option<Link>) {
        debug_assert!(!step.is_terminal(), "{step:?} is terminal");
        self.push(step, message.into(), None, None, link);
    }

    /// Records the successful terminal update.
    pub fn succeed(self, message: impl Into<String>, link: Option<Link>) {
        self.push(Step::Confirmed, message.into(), Some(true), None, link);
        self.close();
    }

    /// Records a failed terminal update.
    pub fn fail(self, step: Step, error: impl Into<String>, link: Option<Link>) {
        debug_assert!(
            step.is_terminal() && step != Step::Confirmed,
            "{step:?} is not a failure"
        );
        let error = error.into();
        self.push(step, error.clone(), Some(false), Some(error), link);
        self.close();
    }

    fn push(
        &self,
        step: Step,
        message: String,
        success: Option<bool>,
        error: Option<String>,
        link: Option<Link>,
    ) {
        let mut state = lock(&self.state);
        if state.closed {
            return;
        }

        let now = Utc::now();
        let timestamp = match state.history.last() {
            Some(last) if last.timestamp >= now => last.timestamp + chrono::Duration::microseconds(1),
            _ => now,
        };
        let (transaction_hash, explorer_url) = match link {
            Some(link) => (Some(link.hash), link.explorer_url),
            None => (None, None),
        };
        let update = StatusUpdate {
            step,
            message,
            is_processing: success.is_none(),
            success,
            error,
            transaction_hash,
            explorer_url,
            timestamp,
        };

        tracing::debug!(step = step.label(), message = %update.message, "status update");
        state
            .subscribers
            .retain(|subscriber| subscriber.unbounded_send(update.clone()).is_ok());
        state.history.push(update);
    }

    fn close(&self) {
        let mut state = lock(&self.state);
        state.closed = true;
        state.subscribers.clear();
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        if !state.closed {
            tracing::warn!(
                updates = state.history.len(),
                "action abandoned without a terminal status"
            );
            state.closed = true;
            state.subscribers.clear();
        }
    }
}

/// Read access to an action's status sequence.
#[derive(Clone)]
pub struct Log {
    state: Arc<Mutex<State>>,
}

impl Log {
    /// All updates recorded so far, oldest first.
    pub fn history(&self) -> Vec<StatusUpdate> {
        lock(&self.state).history.clone()
    }

    pub fn last(&self) -> Option<StatusUpdate> {
        lock(&self.state).history.last().cloned()
    }

    /// Whether the terminal update was recorded.
    pub fn is_finished(&self) -> bool {
        lock(&self.state)
            .history
            .last()
            .is_some_and(|update| !update.is_processing)
    }

    /// Whether the writer went away without recording a terminal update.
    pub fn is_abandoned(&self) -> bool {
        let state = lock(&self.state);
        state.closed && state.history.last().is_none_or(|update| update.is_processing)
    }

    /// Streams the full history followed by live updates. The stream ends
    /// after the terminal update.
    pub fn subscribe(&self) -> Updates {
        let (sender, receiver) = mpsc::unbounded();
        let mut state = lock(&self.state);
        for update in &state.history {
            let _ = sender.unbounded_send(update.clone());
        }
        if !state.closed {
            state.subscribers.push(sender);
        }
        Updates(receiver)
    }
}

/// A stream of status updates.
pub struct Updates(mpsc::UnboundedReceiver<StatusUpdate>);

impl Stream for Updates {
    type Item = StatusUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.0.poll_next_unpin(cx)
    }
}
