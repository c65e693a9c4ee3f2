use crate::models::{GenerationResult, Mode, RunState};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct SlotSnapshot {
    #[serde(flatten)]
    pub state: RunState,
    pub mode: Option<Mode>,
    pub result: Option<GenerationResult>,
}

#[derive(Debug)]
struct Inner {
    latest_seq: u64,
    latest_mode: Option<Mode>,
    state: RunState,
    result: Option<GenerationResult>,
}

/// Holds the one result the shell displays.
///
/// Every submission takes a sequence number from [`ResultSlot::begin`]. A finished run is
/// only accepted if no newer submission has started since, so completion order never
/// decides what is shown.
#[derive(Debug)]
pub struct ResultSlot {
    inner: RwLock<Inner>,
}

impl Default for ResultSlot {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner { latest_seq: 0, latest_mode: None, state: RunState::Idle, result: None }),
        }
    }
}

impl ResultSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a run and empties the displayed output until it finishes.
    pub fn begin(&self, mode: Mode) -> u64 {
        let mut inner = self.inner.write();
        inner.latest_seq += 1;
        inner.latest_mode = Some(mode);
        inner.state = RunState::Running { seq: inner.latest_seq };
        inner.result = None;
        inner.latest_seq
    }

    /// Returns `false` when the result is stale and was dropped.
    pub fn complete(&self, result: GenerationResult) -> bool {
        let mut inner = self.inner.write();
        let seq = result.seq;
        if seq != inner.latest_seq {
            debug!("Discarding stale result #{} (latest is #{})", seq, inner.latest_seq);
            return false;
        }
        inner.state = if result.is_success() {
            RunState::Succeeded { seq }
        } else {
            RunState::Failed { seq }
        };
        inner.result = Some(result);
        true
    }

    pub fn snapshot(&self) -> SlotSnapshot {
        let inner = self.inner.read();
        SlotSnapshot { state: inner.state, mode: inner.latest_mode, result: inner.result.clone() }
    }

    /// Markup worth saving or copying: the last accepted result, if it succeeded with content.
    pub fn markup_to_save(&self) -> Option<String> {
        let inner = self.inner.read();
        inner
            .result
            .as_ref()
            .filter(|r| r.is_success() && !r.markup.trim().is_empty())
            .map(|r| r.markup.clone())
    }
}
