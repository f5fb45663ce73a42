//! Property-based tests for the connection lifecycle

use super::*;
use proptest::prelude::*;
use std::time::Duration;

fn arb_event() -> impl Strategy<Value = LinkEvent> {
    prop_oneof![
        3 => Just(LinkEvent::ConnectRequested),
        3 => Just(LinkEvent::Opened),
        3 => Just(LinkEvent::Closed),
        3 => Just(LinkEvent::RetryElapsed),
        1 => Just(LinkEvent::Shutdown),
    ]
}

/// What the runtime would be holding after applying effects
#[derive(Debug, Default)]
struct Resources {
    timer_armed: bool,
    connected: bool,
}

impl Resources {
    fn apply(&mut self, effects: &[LinkEffect]) {
        for effect in effects {
            match effect {
                LinkEffect::OpenConnection { .. } => {}
                LinkEffect::ScheduleRetry { .. } => self.timer_armed = true,
                LinkEffect::CancelRetry => self.timer_armed = false,
                LinkEffect::CloseConnection => self.connected = false,
                LinkEffect::PublishConnected(flag) => self.connected = *flag,
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Never a second attempt while one is pending or a connection is live
    #[test]
    fn prop_no_concurrent_attempts(events in proptest::collection::vec(arb_event(), 0..60)) {
        let policy = ReconnectPolicy::default();
        let mut state = LinkState::Disconnected;

        for event in events {
            let result = transition(state, &policy, event);
            let opens = result
                .effects
                .iter()
                .filter(|e| matches!(e, LinkEffect::OpenConnection { .. }))
                .count();
            prop_assert!(opens <= 1);
            if matches!(state, LinkState::Connecting { .. } | LinkState::Connected) {
                prop_assert_eq!(opens, 0, "opened from {:?} on {:?}", state, event);
            }
            state = result.new_state;
        }
    }

    // The retry timer and a live connection never coexist, and the
    // published flag always matches the state
    #[test]
    fn prop_timer_and_connection_exclusive(events in proptest::collection::vec(arb_event(), 0..60)) {
        let policy = ReconnectPolicy::default();
        let mut state = LinkState::Disconnected;
        let mut resources = Resources::default();

        for event in events {
            let result = transition(state, &policy, event);
            state = result.new_state;
            resources.apply(&result.effects);

            prop_assert!(!(resources.timer_armed && resources.connected));
            prop_assert_eq!(resources.connected, state.is_connected());
            prop_assert_eq!(
                resources.timer_armed,
                matches!(state, LinkState::AwaitingRetry { .. })
            );
        }
    }

    // Every retry uses the configured delay, whatever the attempt count
    #[test]
    fn prop_fixed_delay(
        delay_ms in 1u64..10_000,
        events in proptest::collection::vec(arb_event(), 0..60),
    ) {
        let policy = ReconnectPolicy::fixed(Duration::from_millis(delay_ms));
        let mut state = LinkState::Disconnected;

        for event in events {
            let result = transition(state, &policy, event);
            for effect in &result.effects {
                if let LinkEffect::ScheduleRetry { delay, .. } = effect {
                    prop_assert_eq!(*delay, Duration::from_millis(delay_ms));
                }
            }
            state = result.new_state;
        }
    }

    // After teardown nothing is opened or scheduled again
    #[test]
    fn prop_shutdown_is_final(
        before in proptest::collection::vec(arb_event(), 0..30),
        after in proptest::collection::vec(arb_event(), 0..30),
    ) {
        let policy = ReconnectPolicy::default();
        let mut state = LinkState::Disconnected;
        for event in before {
            state = transition(state, &policy, event).new_state;
        }
        state = transition(state, &policy, LinkEvent::Shutdown).new_state;

        for event in after {
            let result = transition(state, &policy, event);
            prop_assert_eq!(result.new_state, LinkState::ShutDown);
            prop_assert!(result.effects.is_empty());
            state = result.new_state;
        }
    }
}
