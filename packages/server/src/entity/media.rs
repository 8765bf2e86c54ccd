use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item in a property or milestone media list.
/// Stored as a JSON array in the owning row.
///
/// Multiple entries may share a `sha256`: distinct uploads of the same bytes
/// carry their own metadata, while the storage key (and therefore `url`)
/// stays deduplicated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MediaEntry {
    /// Lowercase hex SHA-256 of the file bytes.
    pub sha256: String,
    /// Serving URL in the external store.
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
    pub description: Option<String>,
    pub capture_metadata: CaptureMetadata,
    pub device_info: DeviceInfo,
    /// Always true for entries admitted through the QR-bound upload path.
    pub qr_verified: bool,
}

/// Client-reported capture context for an evidence file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CaptureMetadata {
    /// Whether the file came straight from the camera (gallery picks are
    /// rejected at admission).
    #[serde(default)]
    pub camera_captured: bool,
    pub captured_at: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub device_model: Option<String>,
}

/// Client-reported device context for an upload request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeviceInfo {
    #[serde(default)]
    pub is_mobile: bool,
    pub platform: Option<String>,
    pub user_agent: Option<String>,
}

/// Parse a media list from its JSON column value.
pub fn media_from_json(value: &serde_json::Value) -> Vec<MediaEntry> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Serialize a media list for storage.
pub fn media_to_json(entries: &[MediaEntry]) -> serde_json::Value {
    serde_json::to_value(entries).unwrap_or(serde_json::Value::Array(vec![]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sha: &str) -> MediaEntry {
        MediaEntry {
            sha256: sha.into(),
            url: format!("https://media.test/image/milestones/{sha}"),
            uploaded_at: Utc::now(),
            description: Some("slab work".into()),
            capture_metadata: CaptureMetadata {
                camera_captured: true,
                ..Default::default()
            },
            device_info: DeviceInfo {
                is_mobile: true,
                ..Default::default()
            },
            qr_verified: true,
        }
    }

    #[test]
    fn round_trips_through_json_column() {
        let entries = vec![entry("aa"), entry("bb")];
        let json = media_to_json(&entries);
        assert_eq!(media_from_json(&json), entries);
    }

    #[test]
    fn empty_column_yields_empty_list() {
        assert!(media_from_json(&serde_json::Value::Array(vec![])).is_empty());
        assert!(media_from_json(&serde_json::Value::Null).is_empty());
    }

    #[test]
    fn duplicate_hashes_are_preserved() {
        let entries = vec![entry("aa"), entry("aa")];
        let parsed = media_from_json(&media_to_json(&entries));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].sha256, parsed[1].sha256);
        assert_eq!(parsed[0].url, parsed[1].url);
    }
}
