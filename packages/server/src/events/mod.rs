pub mod bus;

pub use bus::EventBus;

use common::BookingStatus;
use serde::Serialize;

use crate::utils::qr::UploadKind;

/// Events carried by the in-process bus.
///
/// Events from the same aggregate (one booking, one payment) are emitted
/// after each committed transition, and the single broadcast channel
/// preserves emission order. Subscribers recompute from the store rather
/// than trusting event payloads, so cross-aggregate interleaving is benign.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    BookingCreated {
        booking_id: i32,
        property_id: i32,
        buyer_id: i32,
    },
    BookingStateChanged {
        booking_id: i32,
        buyer_id: i32,
        old: BookingStatus,
        new: BookingStatus,
    },
    PaymentCompleted {
        payment_id: i32,
        booking_id: Option<i32>,
        user_id: i32,
    },
    PaymentFailed {
        payment_id: i32,
        booking_id: Option<i32>,
        user_id: i32,
    },
    RefundProcessed {
        refund_id: i32,
        payment_id: i32,
        user_id: i32,
    },
    EvidenceAttached {
        kind: UploadKind,
        entity_id: i32,
        project_id: i32,
        sha256: String,
    },
    ConstructionUpdatePosted {
        update_id: i32,
        project_id: i32,
    },
}

impl DomainEvent {
    /// The event topic, used as notification `event_type` and in logs.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::BookingCreated { .. } => "booking_created",
            Self::BookingStateChanged { .. } => "booking_state_changed",
            Self::PaymentCompleted { .. } => "payment_completed",
            Self::PaymentFailed { .. } => "payment_failed",
            Self::RefundProcessed { .. } => "refund_processed",
            Self::EvidenceAttached { .. } => "evidence_attached",
            Self::ConstructionUpdatePosted { .. } => "construction_update_posted",
        }
    }
}
