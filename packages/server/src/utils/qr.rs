//! The QR-bound upload protocol.
//!
//! Every milestone and property carries a printed QR code whose payload is
//! `"{kind}:{project_id}:{entity_id}:{token}"`. Scanning it and presenting
//! the payload to the verify endpoint yields an upload token: the first 32
//! characters of the entity's stored secret.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Number of secret characters handed out as the upload token.
pub const UPLOAD_TOKEN_LEN: usize = 32;

/// Which kind of entity an upload targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    Milestone,
    Property,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Milestone => "milestone",
            Self::Property => "property",
        }
    }

    /// Storage folder for this kind's media objects.
    pub fn folder(&self) -> &'static str {
        match self {
            Self::Milestone => "milestones",
            Self::Property => "units",
        }
    }
}

/// Parsed QR payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrPayload {
    pub kind: UploadKind,
    pub project_id: i32,
    pub entity_id: i32,
    pub token: String,
}

/// Parse `"{kind}:{project_id}:{entity_id}:{token}"`.
pub fn parse_qr(data: &str) -> Result<QrPayload, AppError> {
    let mut parts = data.splitn(4, ':');
    let (kind, project_id, entity_id, token) = match (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) {
        (Some(k), Some(p), Some(e), Some(t)) => (k, p, e, t),
        _ => return Err(AppError::Validation("Malformed QR payload".into())),
    };

    let kind = match kind {
        "milestone" => UploadKind::Milestone,
        "property" => UploadKind::Property,
        other => {
            return Err(AppError::Validation(format!(
                "Unknown QR entity kind '{other}'"
            )));
        }
    };

    let project_id: i32 = project_id
        .parse()
        .map_err(|_| AppError::Validation("Invalid project id in QR payload".into()))?;
    let entity_id: i32 = entity_id
        .parse()
        .map_err(|_| AppError::Validation("Invalid entity id in QR payload".into()))?;

    if token.is_empty() {
        return Err(AppError::Validation("Missing QR token".into()));
    }

    Ok(QrPayload {
        kind,
        project_id,
        entity_id,
        token: token.to_string(),
    })
}

/// Build the payload embedded into a printed QR code.
pub fn format_qr(kind: UploadKind, project_id: i32, entity_id: i32, token: &str) -> String {
    format!("{}:{project_id}:{entity_id}:{token}", kind.as_str())
}

/// The upload token derived from a stored entity secret.
pub fn upload_token(secret: &str) -> &str {
    &secret[..secret.len().min(UPLOAD_TOKEN_LEN)]
}

/// Constant set of substrings that mark a mobile user agent.
const MOBILE_UA_MARKERS: &[&str] = &["android", "iphone", "ipad", "mobile", "opera mini"];

/// Heuristic mobile detection from the User-Agent header.
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    MOBILE_UA_MARKERS.iter().any(|m| ua.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trip() {
        let data = format_qr(UploadKind::Milestone, 7, 42, "deadbeef");
        assert_eq!(data, "milestone:7:42:deadbeef");

        let payload = parse_qr(&data).unwrap();
        assert_eq!(payload.kind, UploadKind::Milestone);
        assert_eq!(payload.project_id, 7);
        assert_eq!(payload.entity_id, 42);
        assert_eq!(payload.token, "deadbeef");
    }

    #[test]
    fn token_may_contain_colons() {
        let payload = parse_qr("property:1:2:ab:cd:ef").unwrap();
        assert_eq!(payload.token, "ab:cd:ef");
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(parse_qr("document:1:2:tok").is_err());
    }

    #[test]
    fn rejects_short_payload() {
        assert!(parse_qr("milestone:1:2").is_err());
        assert!(parse_qr("").is_err());
    }

    #[test]
    fn rejects_non_numeric_ids() {
        assert!(parse_qr("milestone:x:2:tok").is_err());
        assert!(parse_qr("milestone:1:y:tok").is_err());
    }

    #[test]
    fn upload_token_is_secret_prefix() {
        let secret = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
        assert_eq!(upload_token(secret), &secret[..32]);
        // Short secrets degrade gracefully rather than panicking.
        assert_eq!(upload_token("abc"), "abc");
    }

    #[test]
    fn mobile_ua_detection() {
        assert!(is_mobile_user_agent(
            "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Mobile"
        ));
        assert!(is_mobile_user_agent(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"
        ));
        assert!(!is_mobile_user_agent(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/120.0"
        ));
    }

    #[test]
    fn upload_kind_folders() {
        assert_eq!(UploadKind::Milestone.folder(), "milestones");
        assert_eq!(UploadKind::Property.folder(), "units");
    }
}
