//! Property-based tests for transcript assembly
//!
//! These tests verify key invariants hold across arbitrary frame sequences.

use super::*;
use crate::protocol::{ChartSpec, InboundFrame, TokenUsage};
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_chart() -> impl Strategy<Value = ChartSpec> {
    (0u32..100).prop_map(|n| ChartSpec::new(json!({ "chart": n })))
}

fn arb_usage() -> impl Strategy<Value = TokenUsage> {
    ("[a-z]{1,8}", 0u64..10_000, 0u64..10_000)
        .prop_map(|(model, input, output)| TokenUsage::new(model, input, output))
}

fn arb_frame() -> impl Strategy<Value = InboundFrame> {
    prop_oneof![
        4 => "[a-zA-Z0-9 ]{0,12}".prop_map(|content| InboundFrame::TextDelta { content }),
        2 => arb_chart().prop_map(|data| InboundFrame::Chart { data }),
        1 => "[a-zA-Z .]{1,16}".prop_map(|content| InboundFrame::ToolStatus { content }),
        1 => arb_usage().prop_map(InboundFrame::TokenUsage),
        2 => (
            proptest::option::of(proptest::collection::vec(arb_chart(), 0..3)),
            proptest::option::of(arb_usage())
        )
            .prop_map(|(charts, token_usage)| InboundFrame::MessageEnd { charts, token_usage }),
        1 => "[a-z ]{1,16}".prop_map(|content| InboundFrame::Error { content }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        10 => arb_frame().prop_map(Event::Frame),
        2 => "[a-z ]{0,10}".prop_map(|text| Event::UserSend { text }),
        1 => Just(Event::Reset),
        1 => Just(Event::ConnectionLost),
    ]
}

// ============================================================================
// Invariant Checkers
// ============================================================================

/// The in-progress reference and the streaming flags agree
fn state_matches_transcript(assembler: &Assembler) -> bool {
    let streaming: Vec<&Turn> = assembler
        .transcript()
        .iter()
        .filter(|t| t.streaming)
        .collect();

    match assembler.state() {
        AssemblyState::Idle => streaming.is_empty(),
        AssemblyState::Streaming { turn_id } => {
            let newest_assistant = assembler
                .transcript()
                .iter()
                .rev()
                .find(|t| t.is_assistant())
                .map(|t| t.id);
            streaming.len() == 1 && streaming[0].id == turn_id && newest_assistant == Some(turn_id)
        }
    }
}

fn ids_ascending(transcript: &Transcript) -> bool {
    transcript.turns().windows(2).all(|w| w[0].id < w[1].id)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: at most one in-progress turn, always the newest assistant turn
    #[test]
    fn prop_single_in_progress_turn(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut assembler = Assembler::new();
        let ctx = AssemblyContext::new(true);

        for event in events {
            let _ = assembler.handle(&ctx, event);
            prop_assert!(state_matches_transcript(&assembler), "state {:?} vs {:?}", assembler.state(), assembler.transcript());
            prop_assert!(ids_ascending(assembler.transcript()));
        }
    }

    // Invariant 2: streamed text is the concatenation of the deltas
    #[test]
    fn prop_deltas_concatenate(deltas in proptest::collection::vec("[a-zA-Z0-9 ]{0,12}", 1..20)) {
        let mut assembler = Assembler::new();
        let ctx = AssemblyContext::new(true);

        for delta in &deltas {
            assembler.handle_frame(&ctx, InboundFrame::TextDelta { content: delta.clone() });
        }
        assembler.handle_frame(&ctx, InboundFrame::MessageEnd { charts: None, token_usage: None });

        let turns = assembler.transcript().turns();
        prop_assert_eq!(turns.len(), 1);
        prop_assert_eq!(&turns[0].content, &deltas.concat());
        prop_assert!(!turns[0].streaming);
    }

    // Invariant 3: message_end always leaves the assembler idle with nothing streaming
    #[test]
    fn prop_message_end_finalizes(
        events in proptest::collection::vec(arb_event(), 0..30),
        charts in proptest::option::of(proptest::collection::vec(arb_chart(), 0..3)),
    ) {
        let mut assembler = Assembler::new();
        let ctx = AssemblyContext::new(true);
        for event in events {
            let _ = assembler.handle(&ctx, event);
        }

        let before = assembler.transcript().len();
        let trailing = charts.as_ref().map_or(0, Vec::len);
        assembler.handle_frame(&ctx, InboundFrame::MessageEnd { charts, token_usage: None });

        prop_assert_eq!(assembler.state(), AssemblyState::Idle);
        prop_assert!(!assembler.is_busy());
        prop_assert!(assembler.transcript().iter().all(|t| !t.streaming));
        prop_assert!(assembler.transcript().iter().all(|t| t.tool_status.is_none()));
        prop_assert_eq!(assembler.transcript().len(), before + trailing);
    }

    // Invariant 4: a chart joins the in-progress turn, or starts exactly one new turn
    #[test]
    fn prop_chart_targets_in_progress_turn(
        events in proptest::collection::vec(arb_event(), 0..30),
        chart in arb_chart(),
    ) {
        let mut assembler = Assembler::new();
        let ctx = AssemblyContext::new(true);
        for event in events {
            let _ = assembler.handle(&ctx, event);
        }

        let in_progress = assembler.state().in_progress();
        let before = assembler.transcript().len();
        assembler.handle_frame(&ctx, InboundFrame::Chart { data: chart.clone() });

        if let Some(turn_id) = in_progress {
            let target = assembler.transcript().get(turn_id).unwrap();
            prop_assert_eq!(assembler.transcript().len(), before);
            prop_assert_eq!(target.charts.last(), Some(&chart));
        } else {
            let last = assembler.transcript().last().unwrap();
            prop_assert_eq!(assembler.transcript().len(), before + 1);
            prop_assert_eq!(&last.charts, &vec![chart]);
            prop_assert!(last.content.is_empty());
            prop_assert!(last.streaming);
        }
    }

    // Invariant 5: user turns are never mutated once appended
    #[test]
    fn prop_user_turns_immutable(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut assembler = Assembler::new();
        let ctx = AssemblyContext::new(true);

        for event in events {
            let users_before: Vec<Turn> = assembler
                .transcript()
                .iter()
                .filter(|t| t.is_user())
                .cloned()
                .collect();
            let is_reset = matches!(event, Event::Reset);
            let _ = assembler.handle(&ctx, event);

            if !is_reset {
                for user in &users_before {
                    prop_assert_eq!(assembler.transcript().get(user.id), Some(user));
                }
            }
        }
    }

    // Invariant 6: nothing is appended or sent while disconnected
    #[test]
    fn prop_disconnected_send_is_noop(
        events in proptest::collection::vec(arb_event(), 0..20),
        text in "[a-z]{1,10}",
    ) {
        let mut assembler = Assembler::new();
        let ctx = AssemblyContext::new(true);
        for event in events {
            let _ = assembler.handle(&ctx, event);
        }

        let before = assembler.transcript().clone();
        let busy = assembler.is_busy();
        let result = assembler.handle(&AssemblyContext::new(false), Event::UserSend { text });

        prop_assert_eq!(result, Err(TransitionError::NotConnected));
        prop_assert_eq!(assembler.transcript(), &before);
        prop_assert_eq!(assembler.is_busy(), busy);
    }
}
