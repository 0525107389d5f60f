use tracker_core::{update, Msg, TrackerState};

#[test]
fn ticks_without_a_session_are_noops() {
    let state = TrackerState::new(Default::default());
    let (next, effects) = update(state.clone(), Msg::TickerFired { generation: 0 });

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
