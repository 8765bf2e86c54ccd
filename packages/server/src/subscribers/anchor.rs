//! Blockchain anchoring subscriber.
//!
//! Forwards `(sha256, entity)` pairs from evidence uploads to the external
//! middleware. Strictly fire-and-forget: failures are logged and never
//! surface to the upload that produced the event.

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::chain::AnchorClient;
use crate::events::DomainEvent;
use crate::state::AppState;
use crate::utils::qr::UploadKind;

pub async fn run(state: AppState, client: AnchorClient) {
    let mut rx = state.events.subscribe();
    info!("Starting evidence anchoring subscriber");

    loop {
        match rx.recv().await {
            Ok(DomainEvent::EvidenceAttached {
                kind,
                entity_id,
                project_id,
                sha256,
            }) => {
                let result = match kind {
                    UploadKind::Milestone => {
                        client.anchor_milestone(entity_id, project_id, &sha256).await
                    }
                    UploadKind::Property => {
                        client.anchor_property(entity_id, project_id, &sha256).await
                    }
                };
                match result {
                    Ok(()) => info!(entity_id, sha256 = %sha256, "Anchored evidence"),
                    Err(e) => {
                        warn!(entity_id, sha256 = %sha256, error = %e, "Anchoring failed")
                    }
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Anchor subscriber lagged behind the bus");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
