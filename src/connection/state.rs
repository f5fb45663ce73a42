//! Connection lifecycle state machine
//!
//! Pure transitions over the link state; the session runtime owns the
//! socket and the retry timer and carries out the returned effects.

use serde::Serialize;
use std::time::Duration;

/// Delay between a closure and the next connection attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);

/// How the manager retries after a closure: a fixed delay, forever
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}

/// Where the connection is in its lifecycle.
///
/// `attempt` counts consecutive attempts since the last successful open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkState {
    /// Never connected yet
    #[default]
    Disconnected,
    /// An attempt is in flight
    Connecting { attempt: u32 },
    /// A live connection exists
    Connected,
    /// Waiting for the retry timer before the next attempt
    AwaitingRetry { attempt: u32 },
    /// Torn down; nothing happens any more
    ShutDown,
}

impl LinkState {
    pub fn is_connected(self) -> bool {
        matches!(self, LinkState::Connected)
    }

    pub fn is_shut_down(self) -> bool {
        matches!(self, LinkState::ShutDown)
    }
}

/// Inputs to the link state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Someone asked for a connection
    ConnectRequested,
    /// The pending attempt produced a live connection
    Opened,
    /// The attempt failed, or the live connection closed or errored
    Closed,
    /// The retry timer fired
    RetryElapsed,
    /// The owning session is going away
    Shutdown,
}

/// I/O requested by a link transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEffect {
    /// Start a connection attempt
    OpenConnection { attempt: u32 },
    /// Arm the retry timer
    ScheduleRetry { delay: Duration, attempt: u32 },
    /// Disarm the retry timer if armed
    CancelRetry,
    /// Close the live connection and abandon any pending attempt
    CloseConnection,
    /// The connected flag changed
    PublishConnected(bool),
}

/// Result of a link transition
#[derive(Debug)]
pub struct LinkTransition {
    pub new_state: LinkState,
    pub effects: Vec<LinkEffect>,
}

impl LinkTransition {
    fn new(state: LinkState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    fn with_effect(mut self, effect: LinkEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Pure transition function for the connection lifecycle
pub fn transition(state: LinkState, policy: &ReconnectPolicy, event: LinkEvent) -> LinkTransition {
    // Nothing leaves ShutDown
    if state.is_shut_down() {
        return LinkTransition::new(state);
    }

    match (state, event) {
        (_, LinkEvent::Shutdown) => LinkTransition::new(LinkState::ShutDown)
            .with_effect(LinkEffect::CancelRetry)
            .with_effect(LinkEffect::CloseConnection)
            .with_effect(LinkEffect::PublishConnected(false)),

        // ============================================================
        // Connecting
        // ============================================================
        (LinkState::Disconnected, LinkEvent::ConnectRequested) => {
            LinkTransition::new(LinkState::Connecting { attempt: 1 })
                .with_effect(LinkEffect::OpenConnection { attempt: 1 })
        }

        // An explicit request pre-empts the timer
        (
            LinkState::AwaitingRetry { attempt },
            LinkEvent::ConnectRequested | LinkEvent::RetryElapsed,
        ) => LinkTransition::new(LinkState::Connecting { attempt })
            .with_effect(LinkEffect::CancelRetry)
            .with_effect(LinkEffect::OpenConnection { attempt }),

        (LinkState::Connecting { .. }, LinkEvent::Opened) => {
            LinkTransition::new(LinkState::Connected)
                .with_effect(LinkEffect::CancelRetry)
                .with_effect(LinkEffect::PublishConnected(true))
        }

        // ============================================================
        // Closure: exactly one retry, after the fixed delay
        // ============================================================
        (LinkState::Connecting { attempt }, LinkEvent::Closed) => {
            let attempt = attempt.saturating_add(1);
            LinkTransition::new(LinkState::AwaitingRetry { attempt })
                .with_effect(LinkEffect::PublishConnected(false))
                .with_effect(LinkEffect::ScheduleRetry {
                    delay: policy.delay,
                    attempt,
                })
        }

        (LinkState::Connected, LinkEvent::Closed) => {
            LinkTransition::new(LinkState::AwaitingRetry { attempt: 1 })
                .with_effect(LinkEffect::PublishConnected(false))
                .with_effect(LinkEffect::ScheduleRetry {
                    delay: policy.delay,
                    attempt: 1,
                })
        }

        // Already connecting or connected: never start a second attempt.
        // Everything else is a stale event from a superseded attempt or timer.
        (
            LinkState::Connecting { .. } | LinkState::Connected,
            LinkEvent::ConnectRequested | LinkEvent::RetryElapsed,
        )
        | (
            LinkState::Disconnected | LinkState::Connected | LinkState::AwaitingRetry { .. },
            LinkEvent::Opened,
        )
        | (LinkState::Disconnected | LinkState::AwaitingRetry { .. }, LinkEvent::Closed)
        | (LinkState::Disconnected, LinkEvent::RetryElapsed)
        | (LinkState::ShutDown, _) => LinkTransition::new(state),
    }
}
