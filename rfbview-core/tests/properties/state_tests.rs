//! Property tests for the connection state stream

use proptest::prelude::*;
use rfbview_core::{ConnectionState, StatePublisher};

fn arb_state() -> impl Strategy<Value = ConnectionState> {
    prop_oneof![
        Just(ConnectionState::Disconnected),
        Just(ConnectionState::Connecting),
        Just(ConnectionState::Connected),
    ]
}

const fn rank(state: ConnectionState) -> u8 {
    match state {
        ConnectionState::Disconnected => 0,
        ConnectionState::Connecting => 1,
        ConnectionState::Connected => 2,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Whatever the engine reports, the published states only move forward
    /// and never leave the final `Disconnected`
    #[test]
    fn published_states_are_monotonic(reports in prop::collection::vec(arb_state(), 0..20)) {
        let publisher = StatePublisher::new(ConnectionState::Disconnected);
        let mut published = vec![publisher.current()];

        for state in reports {
            if publisher.publish(state) {
                published.push(publisher.current());
            }
        }

        let ended = published.iter().skip(1).position(|s| *s == ConnectionState::Disconnected);
        if let Some(end) = ended {
            prop_assert_eq!(end + 2, published.len());
            prop_assert!(publisher.has_ended());
        }
        let live = &published[1..ended.map_or(published.len(), |end| end + 1)];
        for pair in live.windows(2) {
            prop_assert!(rank(pair[0]) < rank(pair[1]));
        }
    }

    /// `Connected` is entered at most once per attempt
    #[test]
    fn connected_entered_at_most_once(reports in prop::collection::vec(arb_state(), 0..20)) {
        let publisher = StatePublisher::new(ConnectionState::Disconnected);
        let entered = reports
            .into_iter()
            .filter(|state| publisher.publish(*state) && state.is_connected())
            .count();
        prop_assert!(entered <= 1);
    }

    /// Nothing is published after sealing
    #[test]
    fn sealed_publisher_rejects_everything(reports in prop::collection::vec(arb_state(), 0..10)) {
        let publisher = StatePublisher::new(ConnectionState::Disconnected);
        publisher.publish(ConnectionState::Connecting);
        publisher.seal();

        for state in reports {
            prop_assert!(!publisher.publish(state));
        }
        prop_assert_eq!(publisher.current(), ConnectionState::Disconnected);
    }
}
