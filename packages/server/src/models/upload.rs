use serde::{Deserialize, Serialize};

use crate::entity::media::{DeviceInfo, MediaEntry};

/// Request body for QR verification.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct VerifyQrRequest {
    /// `"{kind}:{project_id}:{entity_id}:{token}"` as printed on site.
    #[schema(example = "milestone:7:42:a81f02c9")]
    pub qr_data: String,
    /// Client-reported device context; the User-Agent header is the fallback.
    pub device_info: Option<DeviceInfo>,
}

/// Hard limits for a secure upload, echoed to the client.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadLimits {
    pub max_images: u32,
    pub max_videos: u32,
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VerifyQrResponse {
    /// Token to present in the multipart `upload_token` field.
    pub upload_token: String,
    /// Canonical upload endpoint for the verified entity.
    #[schema(example = "/api/v1/milestones/42/secure-upload")]
    pub upload_endpoint: String,
    pub limits: UploadLimits,
}

/// Result of a secure upload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SecureUploadResponse {
    pub images: Vec<MediaEntry>,
    pub videos: Vec<MediaEntry>,
    /// The construction update projected from this upload.
    pub update_id: i32,
}
