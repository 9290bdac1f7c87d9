//! Change coalescing: the throttle gate in front of snapshot assembly and
//! the remote push.
//!
//! The coalescer absorbs an unbounded stream of triggers (filesystem events
//! and the periodic tick) and runs the injected [`SyncAction`] at a bounded
//! rate with at most one attempt in flight. It is a three-state machine
//! behind a single mutex:
//!
//! ```text
//! Idle --trigger--> Pending --timer--> InFlight --done--> Idle
//!                      ^                  |  (dirty)
//!                      '------------------'
//! ```
//!
//! Throttling is leading-edge: the first trigger of a window arms a timer
//! for one full interval, and later triggers in the same window do not reset
//! it, so under continuous churn a sync still fires once per interval.
//! Triggers landing while a sync is in flight only mark the state dirty;
//! the re-armed sync re-reads the filesystem at its own start time, so the
//! intent to sync is never lost and no stale arguments are replayed.
//!
//! A failed action is logged and the machine proceeds exactly as if the
//! attempt had completed — the next natural trigger retries with fresh
//! state.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::watcher::ChangeEvent;

/// One sync attempt: assemble a fresh snapshot and push it. Injected so the
/// state machine is testable with synthetic actions and triggers.
#[async_trait]
pub trait SyncAction: Send + Sync + 'static {
    async fn run_sync(&self) -> anyhow::Result<()>;
}

/// What asked for a sync. Only used for logging; the action always re-reads
/// current state rather than replaying trigger arguments.
#[derive(Debug, Clone)]
pub enum Trigger {
    File(ChangeEvent),
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Pending,
    InFlight { dirty: bool },
}

pub struct Coalescer<A: SyncAction> {
    inner: Arc<Inner<A>>,
}

struct Inner<A> {
    state: Mutex<State>,
    interval: Duration,
    action: A,
}

impl<A: SyncAction> Coalescer<A> {
    pub fn new(interval: Duration, action: A) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Idle),
                interval,
                action,
            }),
        }
    }

    /// The single synchronized entry point for all triggers. Never blocks
    /// and never starts a second concurrent attempt.
    pub fn trigger(&self, trigger: Trigger) {
        let arm = {
            let mut state = self.inner.state.lock().expect("coalescer state poisoned");
            match *state {
                State::Idle => {
                    tracing::debug!(?trigger, "sync scheduled");
                    *state = State::Pending;
                    true
                }
                State::Pending => {
                    tracing::debug!(?trigger, "coalesced into pending window");
                    false
                }
                State::InFlight { ref mut dirty } => {
                    tracing::debug!(?trigger, "recorded during in-flight sync");
                    *dirty = true;
                    false
                }
            }
        };

        if arm {
            Inner::arm(Arc::clone(&self.inner));
        }
    }
}

impl<A: SyncAction> Inner<A> {
    /// Arm the throttle timer. Exactly one timer exists per Pending window:
    /// only the Idle->Pending transition and a dirty completion call this.
    fn arm(inner: Arc<Self>) {
        tokio::spawn(async move {
            tokio::time::sleep(inner.interval).await;
            Inner::fire(inner).await;
        });
    }

    async fn fire(inner: Arc<Self>) {
        {
            let mut state = inner.state.lock().expect("coalescer state poisoned");
            *state = State::InFlight { dirty: false };
        }

        if let Err(e) = inner.action.run_sync().await {
            tracing::warn!(error = %e, "sync attempt failed, continuing");
        }

        let rearm = {
            let mut state = inner.state.lock().expect("coalescer state poisoned");
            match *state {
                State::InFlight { dirty: true } => {
                    *state = State::Pending;
                    true
                }
                _ => {
                    *state = State::Idle;
                    false
                }
            }
        };

        if rearm {
            tracing::debug!("re-arming sync for triggers coalesced in flight");
            Inner::arm(inner);
        }
    }
}
