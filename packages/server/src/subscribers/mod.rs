pub mod anchor;
pub mod booking;
pub mod notifier;

use std::sync::Arc;

use crate::chain::AnchorClient;
use crate::state::AppState;

/// Spawn every event-bus subscriber. Subscriber failures are logged and
/// never propagate to the requests that emitted the events.
pub fn spawn_all(state: &AppState, anchor_client: Option<AnchorClient>) {
    tokio::spawn(booking::run(state.clone()));
    tokio::spawn(notifier::run(
        state.clone(),
        Arc::new(notifier::LogDispatcher),
    ));
    if let Some(client) = anchor_client {
        tokio::spawn(anchor::run(state.clone(), client));
    }
}
