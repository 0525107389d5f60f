use crate::{Effect, Msg, TrackerState};

/// Pure update function: applies a message to state and returns any effects.
///
/// This is the single entry point through which fetch results, subscription
/// notifications, ticker ticks and caller requests reach a session, so they
/// are always applied one at a time.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    let effects = match msg {
        Msg::JobSelected(job) => state.select(job),
        Msg::SnapshotFetched { epoch, result } => state.apply_fetch(epoch, result),
        Msg::SnapshotChanged { epoch, snapshot } => state.apply_notification(epoch, snapshot),
        Msg::TickerFired { generation } => state.apply_tick(generation),
        Msg::Disposed => state.dispose(),
    };

    (state, effects)
}
