use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::notification::{self, ChannelAttempt};

use super::shared::Pagination;

/// Query parameters for notification listing.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct NotificationListQuery {
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
    /// Only unread notifications.
    pub unread: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    #[schema(example = "booking_created")]
    pub event_type: String,
    pub title: String,
    pub message: String,
    pub channels: Vec<ChannelAttempt>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(m: notification::Model) -> Self {
        Self {
            id: m.id,
            event_type: m.event_type,
            title: m.title,
            message: m.message,
            channels: serde_json::from_value(m.channels).unwrap_or_default(),
            read: m.read,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationListResponse {
    pub data: Vec<NotificationResponse>,
    pub pagination: Pagination,
}
