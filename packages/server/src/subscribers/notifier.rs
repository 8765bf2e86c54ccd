//! Notification dispatcher.
//!
//! For each event: resolve recipients, consult the user's preferences
//! (channel toggles, quiet hours, type toggles), attempt each enabled
//! channel once and record the outcome on the notification row. Channel
//! transport is out of scope; the default dispatcher logs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Timelike, Utc};
use sea_orm::*;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::entity::notification::ChannelAttempt;
use crate::entity::{notification, notification_preference, project, property};
use crate::error::AppError;
use crate::events::DomainEvent;
use crate::state::AppState;

/// Abstract channel transport: attempt once, report the outcome.
#[async_trait]
pub trait ChannelDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        channel: &str,
        user_id: i32,
        title: &str,
        message: &str,
    ) -> anyhow::Result<()>;
}

/// Tracing-backed stand-in for real channel transports.
pub struct LogDispatcher;

#[async_trait]
impl ChannelDispatcher for LogDispatcher {
    async fn dispatch(
        &self,
        channel: &str,
        user_id: i32,
        title: &str,
        _message: &str,
    ) -> anyhow::Result<()> {
        info!(channel, user_id, title, "Dispatching notification");
        Ok(())
    }
}

/// What to send a single recipient.
struct Outgoing {
    user_id: i32,
    title: String,
    message: String,
}

/// Channels to attempt, after preference filtering.
#[derive(Debug, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub channels: Vec<&'static str>,
    /// Quiet hours: channels are recorded as suppressed, not attempted.
    pub suppressed: bool,
}

/// Whether `hour` falls inside a possibly-wrapping quiet window.
fn in_quiet_hours(start: i32, end: i32, hour: i32) -> bool {
    if start == end {
        return false;
    }
    if start < end {
        (start..end).contains(&hour)
    } else {
        hour >= start || hour < end
    }
}

/// Apply a user's preferences to an event type.
///
/// Returns `None` when the type is disabled (nothing is materialized);
/// missing preferences mean everything is enabled.
pub fn plan_delivery(
    pref: Option<&notification_preference::Model>,
    event_type: &str,
    hour_now: i32,
) -> Option<DeliveryPlan> {
    let Some(pref) = pref else {
        return Some(DeliveryPlan {
            channels: vec!["email", "sms", "push"],
            suppressed: false,
        });
    };

    let disabled: Vec<String> = serde_json::from_value(pref.disabled_types.clone())
        .unwrap_or_default();
    if disabled.iter().any(|t| t == event_type) {
        return None;
    }

    let mut channels = Vec::new();
    if pref.email_enabled {
        channels.push("email");
    }
    if pref.sms_enabled {
        channels.push("sms");
    }
    if pref.push_enabled {
        channels.push("push");
    }

    let suppressed = match (pref.quiet_hours_start, pref.quiet_hours_end) {
        (Some(start), Some(end)) => in_quiet_hours(start, end, hour_now),
        _ => false,
    };

    Some(DeliveryPlan {
        channels,
        suppressed,
    })
}

/// Consume events and materialize notifications.
pub async fn run(state: AppState, dispatcher: Arc<dyn ChannelDispatcher>) {
    let mut rx = state.events.subscribe();
    info!("Starting notification subscriber");

    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Err(e) = handle_event(&state, dispatcher.as_ref(), &event).await {
                    error!(topic = event.topic(), error = ?e, "Notification handling failed");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Notification subscriber lagged behind the bus");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn handle_event(
    state: &AppState,
    dispatcher: &dyn ChannelDispatcher,
    event: &DomainEvent,
) -> Result<(), AppError> {
    let outgoing = resolve_recipients(state, event).await?;
    let hour_now = Utc::now().hour() as i32;

    for out in outgoing {
        let pref = notification_preference::Entity::find()
            .filter(notification_preference::Column::UserId.eq(out.user_id))
            .one(&state.db)
            .await?;

        let Some(plan) = plan_delivery(pref.as_ref(), event.topic(), hour_now) else {
            continue;
        };

        let mut attempts = Vec::with_capacity(plan.channels.len());
        for channel in &plan.channels {
            let outcome = if plan.suppressed {
                "suppressed_quiet_hours"
            } else {
                match dispatcher
                    .dispatch(channel, out.user_id, &out.title, &out.message)
                    .await
                {
                    Ok(()) => "sent",
                    Err(e) => {
                        warn!(channel, user_id = out.user_id, error = %e, "Channel dispatch failed");
                        "failed"
                    }
                }
            };
            attempts.push(ChannelAttempt {
                channel: ToString::to_string(channel),
                outcome: outcome.to_string(),
            });
        }

        let row = notification::ActiveModel {
            user_id: Set(out.user_id),
            event_type: Set(event.topic().to_string()),
            title: Set(out.title),
            message: Set(out.message),
            channels: Set(serde_json::to_value(&attempts)
                .unwrap_or(serde_json::Value::Array(vec![]))),
            read: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        row.insert(&state.db).await?;
    }

    Ok(())
}

async fn resolve_recipients(
    state: &AppState,
    event: &DomainEvent,
) -> Result<Vec<Outgoing>, AppError> {
    use crate::entity::construction_update::{self, UpdateAudience};

    let outgoing = match event {
        DomainEvent::BookingCreated {
            booking_id,
            property_id,
            buyer_id,
        } => {
            let mut out = vec![Outgoing {
                user_id: *buyer_id,
                title: "Booking created".into(),
                message: format!("Your booking #{booking_id} is pending token payment."),
            }];
            // The developer hears about new bookings on their units.
            if let Some(dev_user) = developer_user_for_property(state, *property_id).await? {
                out.push(Outgoing {
                    user_id: dev_user,
                    title: "New booking received".into(),
                    message: format!("A buyer reserved a unit (booking #{booking_id})."),
                });
            }
            out
        }
        DomainEvent::BookingStateChanged {
            booking_id, buyer_id, new, ..
        } => vec![Outgoing {
            user_id: *buyer_id,
            title: format!("Booking {new}"),
            message: format!("Your booking #{booking_id} is now {new}."),
        }],
        DomainEvent::PaymentCompleted {
            payment_id,
            user_id,
            ..
        } => vec![Outgoing {
            user_id: *user_id,
            title: "Payment received".into(),
            message: format!("Payment #{payment_id} completed."),
        }],
        DomainEvent::PaymentFailed {
            payment_id,
            user_id,
            ..
        } => vec![Outgoing {
            user_id: *user_id,
            title: "Payment failed".into(),
            message: format!("Payment #{payment_id} failed. Please retry."),
        }],
        DomainEvent::RefundProcessed {
            refund_id, user_id, ..
        } => vec![Outgoing {
            user_id: *user_id,
            title: "Refund processed".into(),
            message: format!("Refund #{refund_id} has been processed."),
        }],
        // The construction-update event carries the audience; the raw
        // evidence event is for the anchor subscriber.
        DomainEvent::EvidenceAttached { .. } => vec![],
        DomainEvent::ConstructionUpdatePosted { update_id, .. } => {
            let Some(update) = construction_update::Entity::find_by_id(*update_id)
                .one(&state.db)
                .await?
            else {
                return Ok(vec![]);
            };

            let recipients: Vec<i32> = match update.audience {
                UpdateAudience::Project => {
                    let buyers: Vec<Option<i32>> = property::Entity::find()
                        .filter(property::Column::ProjectId.eq(update.project_id))
                        .filter(property::Column::BuyerId.is_not_null())
                        .select_only()
                        .column(property::Column::BuyerId)
                        .distinct()
                        .into_tuple()
                        .all(&state.db)
                        .await?;
                    buyers.into_iter().flatten().collect()
                }
                UpdateAudience::PropertyOwner => match update.property_id {
                    Some(property_id) => property::Entity::find_by_id(property_id)
                        .one(&state.db)
                        .await?
                        .and_then(|p| p.buyer_id)
                        .into_iter()
                        .collect(),
                    None => vec![],
                },
            };

            recipients
                .into_iter()
                .map(|user_id| Outgoing {
                    user_id,
                    title: update.title.clone(),
                    message: update.body.clone(),
                })
                .collect()
        }
    };

    Ok(outgoing)
}

async fn developer_user_for_property(
    state: &AppState,
    property_id: i32,
) -> Result<Option<i32>, AppError> {
    use crate::entity::developer;

    let Some(prop) = property::Entity::find_by_id(property_id)
        .one(&state.db)
        .await?
    else {
        return Ok(None);
    };
    let Some(proj) = project::Entity::find_by_id(prop.project_id)
        .one(&state.db)
        .await?
    else {
        return Ok(None);
    };
    Ok(developer::Entity::find_by_id(proj.developer_id)
        .one(&state.db)
        .await?
        .map(|d| d.user_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pref(
        email: bool,
        sms: bool,
        push: bool,
        quiet: Option<(i32, i32)>,
        disabled: &[&str],
    ) -> notification_preference::Model {
        notification_preference::Model {
            id: 1,
            user_id: 1,
            email_enabled: email,
            sms_enabled: sms,
            push_enabled: push,
            quiet_hours_start: quiet.map(|q| q.0),
            quiet_hours_end: quiet.map(|q| q.1),
            disabled_types: serde_json::json!(disabled),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn missing_preferences_enable_everything() {
        let plan = plan_delivery(None, "booking_created", 12).unwrap();
        assert_eq!(plan.channels, vec!["email", "sms", "push"]);
        assert!(!plan.suppressed);
    }

    #[test]
    fn disabled_type_materializes_nothing() {
        let p = pref(true, true, true, None, &["payment_failed"]);
        assert!(plan_delivery(Some(&p), "payment_failed", 12).is_none());
        assert!(plan_delivery(Some(&p), "payment_completed", 12).is_some());
    }

    #[test]
    fn only_enabled_channels_are_attempted() {
        let p = pref(true, false, true, None, &[]);
        let plan = plan_delivery(Some(&p), "booking_created", 12).unwrap();
        assert_eq!(plan.channels, vec!["email", "push"]);
    }

    #[test]
    fn quiet_hours_suppress_delivery() {
        let p = pref(true, true, true, Some((22, 7)), &[]);
        assert!(plan_delivery(Some(&p), "booking_created", 23).unwrap().suppressed);
        assert!(plan_delivery(Some(&p), "booking_created", 3).unwrap().suppressed);
        assert!(!plan_delivery(Some(&p), "booking_created", 12).unwrap().suppressed);
    }

    #[test]
    fn non_wrapping_quiet_window() {
        let p = pref(true, true, true, Some((9, 17)), &[]);
        assert!(plan_delivery(Some(&p), "booking_created", 9).unwrap().suppressed);
        assert!(!plan_delivery(Some(&p), "booking_created", 17).unwrap().suppressed);
        assert!(!plan_delivery(Some(&p), "booking_created", 20).unwrap().suppressed);
    }

    #[test]
    fn degenerate_quiet_window_never_suppresses() {
        let p = pref(true, true, true, Some((8, 8)), &[]);
        assert!(!plan_delivery(Some(&p), "booking_created", 8).unwrap().suppressed);
    }
}
