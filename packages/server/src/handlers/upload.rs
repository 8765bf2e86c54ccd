use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use chrono::Utc;
use common::storage::{ContentHash, MediaKind, MediaStore};
use sea_orm::*;
use tracing::instrument;

use crate::config::UploadConfig;
use crate::entity::construction_update::{self, UpdateAudience};
use crate::entity::media::{
    CaptureMetadata, DeviceInfo, MediaEntry, media_from_json, media_to_json,
};
use crate::entity::{milestone, project, property};
use crate::error::{AppError, ErrorBody};
use crate::events::DomainEvent;
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::upload::{
    SecureUploadResponse, UploadLimits, VerifyQrRequest, VerifyQrResponse,
};
use crate::state::AppState;
use crate::utils::access::is_project_developer;
use crate::utils::qr::{self, UploadKind};

pub fn secure_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(512 * 1024 * 1024) // images + videos + form fields
}

/// The entity a QR-bound upload targets.
enum UploadTarget {
    Milestone(milestone::Model),
    Property(property::Model),
}

impl UploadTarget {
    fn kind(&self) -> UploadKind {
        match self {
            Self::Milestone(_) => UploadKind::Milestone,
            Self::Property(_) => UploadKind::Property,
        }
    }

    fn project_id(&self) -> i32 {
        match self {
            Self::Milestone(m) => m.project_id,
            Self::Property(p) => p.project_id,
        }
    }

    fn entity_id(&self) -> i32 {
        match self {
            Self::Milestone(m) => m.id,
            Self::Property(p) => p.id,
        }
    }

    fn secret(&self) -> Option<&str> {
        match self {
            Self::Milestone(m) => m.qr_code_secret.as_deref(),
            Self::Property(p) => p.qr_code_secret.as_deref(),
        }
    }

    fn max_images(&self, config: &UploadConfig) -> u32 {
        match self {
            Self::Milestone(_) => config.max_images_milestone,
            Self::Property(_) => config.max_images_property,
        }
    }

    fn upload_endpoint(&self) -> String {
        match self {
            Self::Milestone(m) => format!("/api/v1/milestones/{}/secure-upload", m.id),
            Self::Property(p) => format!("/api/v1/properties/{}/secure-upload", p.id),
        }
    }
}

async fn load_milestone_target<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<UploadTarget, AppError> {
    let model = milestone::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Milestone not found".into()))?;
    Ok(UploadTarget::Milestone(model))
}

async fn load_property_target<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<UploadTarget, AppError> {
    let model = property::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Property not found".into()))?;
    Ok(UploadTarget::Property(model))
}

async fn require_target_developer(
    state: &AppState,
    auth_user: &AuthUser,
    target: &UploadTarget,
) -> Result<(), AppError> {
    let proj = project::Entity::find_by_id(target.project_id())
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("Entity without project".into()))?;
    if !is_project_developer(&state.db, auth_user, &proj).await? && !auth_user.is_staff() {
        return Err(AppError::PermissionDenied);
    }
    Ok(())
}

fn request_user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok())
}

/// Mobile gate: client-reported flag OR a mobile user agent.
fn is_mobile_request(device_info: &DeviceInfo, user_agent: Option<&str>) -> bool {
    device_info.is_mobile
        || user_agent.is_some_and(qr::is_mobile_user_agent)
        || device_info
            .user_agent
            .as_deref()
            .is_some_and(qr::is_mobile_user_agent)
}

/// Admission gates for a secure upload, in the order clients observe them:
/// token, then mobile, then camera.
fn check_admission(
    upload_token: &str,
    stored_secret: Option<&str>,
    device_info: &DeviceInfo,
    user_agent: Option<&str>,
    capture: &CaptureMetadata,
) -> Result<(), AppError> {
    let Some(secret) = stored_secret else {
        return Err(AppError::forbidden(
            "invalid_token",
            "Entity has no upload secret",
        ));
    };
    if upload_token.is_empty() || upload_token != qr::upload_token(secret) {
        return Err(AppError::forbidden("invalid_token", "Invalid upload token"));
    }
    if !is_mobile_request(device_info, user_agent) {
        return Err(AppError::forbidden(
            "DESKTOP_UPLOAD_BLOCKED",
            "Evidence must be uploaded from a mobile device on site",
        ));
    }
    if !capture.camera_captured {
        return Err(AppError::forbidden(
            "GALLERY_UPLOAD_BLOCKED",
            "Evidence must come straight from the camera",
        ));
    }
    Ok(())
}

/// Per-upload count limits.
fn check_counts(
    image_count: usize,
    video_count: usize,
    max_images: u32,
    max_videos: u32,
) -> Result<(), AppError> {
    if image_count == 0 && video_count == 0 {
        return Err(AppError::Validation("No files in upload".into()));
    }
    if image_count > max_images as usize {
        return Err(AppError::Validation(format!(
            "At most {max_images} images per upload"
        )));
    }
    if video_count > max_videos as usize {
        return Err(AppError::Validation(format!(
            "At most {max_videos} videos per upload"
        )));
    }
    Ok(())
}

/// Verify a scanned QR payload and hand out the upload token.
#[utoipa::path(
    post,
    path = "/verify-qr",
    tag = "Evidence",
    operation_id = "verifyQr",
    summary = "Verify an on-site QR code",
    description = "Parses `{kind}:{project_id}:{entity_id}:{token}`, checks it against the stored \
        entity, requires the caller to be the project's developer on a mobile device, and returns \
        the upload token plus the canonical upload endpoint and limits.",
    request_body = VerifyQrRequest,
    responses(
        (status = 200, description = "QR verified", body = VerifyQrResponse),
        (status = 400, description = "Malformed QR payload (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the developer or not mobile (PERMISSION_DENIED, DESKTOP_UPLOAD_BLOCKED)", body = ErrorBody),
        (status = 404, description = "Entity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers, payload))]
pub async fn verify_qr(
    auth_user: AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(payload): AppJson<VerifyQrRequest>,
) -> Result<Json<VerifyQrResponse>, AppError> {
    let parsed = qr::parse_qr(&payload.qr_data)?;

    let target = match parsed.kind {
        UploadKind::Milestone => load_milestone_target(&state.db, parsed.entity_id).await?,
        UploadKind::Property => load_property_target(&state.db, parsed.entity_id).await?,
    };

    // The stored payload must match byte for byte: id, project and token.
    let stored_qr = match &target {
        UploadTarget::Milestone(m) => m.qr_code_data.as_deref(),
        UploadTarget::Property(p) => p.qr_code_data.as_deref(),
    };
    if target.project_id() != parsed.project_id || stored_qr != Some(payload.qr_data.as_str()) {
        return Err(AppError::NotFound("QR code does not match any entity".into()));
    }

    require_target_developer(&state, &auth_user, &target).await?;

    let device_info = payload.device_info.unwrap_or_default();
    if !is_mobile_request(&device_info, request_user_agent(&headers)) {
        return Err(AppError::forbidden(
            "DESKTOP_UPLOAD_BLOCKED",
            "QR verification requires a mobile device",
        ));
    }

    let secret = target.secret().ok_or_else(|| {
        AppError::Internal("Entity has a QR payload but no secret".into())
    })?;

    Ok(Json(VerifyQrResponse {
        upload_token: qr::upload_token(secret).to_string(),
        upload_endpoint: target.upload_endpoint(),
        limits: UploadLimits {
            max_images: target.max_images(&state.config.upload),
            max_videos: state.config.upload.max_videos,
            max_image_bytes: state.config.upload.max_image_bytes,
            max_video_bytes: state.config.upload.max_video_bytes,
        },
    }))
}

/// One buffered upload file.
struct UploadFile {
    bytes: Vec<u8>,
}

/// Everything parsed out of the multipart form.
#[derive(Default)]
struct UploadForm {
    images: Vec<UploadFile>,
    videos: Vec<UploadFile>,
    description: Option<String>,
    upload_token: String,
    capture_metadata: CaptureMetadata,
    device_info: DeviceInfo,
}

/// Buffer a multipart field, rejecting it early once it exceeds `max_size`.
async fn buffer_field(
    field: &mut axum::extract::multipart::Field<'_>,
    max_size: u64,
    what: &str,
) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (bytes.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::Validation(format!(
                "{what} exceeds maximum size of {max_size} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn parse_upload_form(
    mut multipart: Multipart,
    config: &UploadConfig,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("images") => {
                let bytes = buffer_field(&mut field, config.max_image_bytes, "Image").await?;
                form.images.push(UploadFile { bytes });
            }
            Some("videos") => {
                let bytes = buffer_field(&mut field, config.max_video_bytes, "Video").await?;
                form.videos.push(UploadFile { bytes });
            }
            Some("description") => {
                form.description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Bad description: {e}")))?,
                );
            }
            Some("upload_token") => {
                form.upload_token = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Bad upload_token: {e}")))?;
            }
            Some("capture_metadata") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Bad capture_metadata: {e}")))?;
                form.capture_metadata = serde_json::from_str(&text).map_err(|e| {
                    AppError::Validation(format!("capture_metadata is not valid JSON: {e}"))
                })?;
            }
            Some("device_info") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Bad device_info: {e}")))?;
                form.device_info = serde_json::from_str(&text).map_err(|e| {
                    AppError::Validation(format!("device_info is not valid JSON: {e}"))
                })?;
            }
            _ => {} // Ignore unknown fields.
        }
    }

    Ok(form)
}

/// Content-addressed store step: probe by key, upload only on miss.
async fn store_deduplicated(
    media: &dyn MediaStore,
    folder: &str,
    bytes: &[u8],
    kind: MediaKind,
) -> Result<(String, String), AppError> {
    let sha256 = ContentHash::compute(bytes).to_hex();
    let public_id = format!("{folder}/{sha256}");

    let url = if media.exists(&public_id, kind).await? {
        media.url_for(&public_id, kind)
    } else {
        media.upload(bytes, &public_id, kind, false).await?
    };

    Ok((sha256, url))
}

async fn process_secure_upload(
    state: AppState,
    auth_user: AuthUser,
    headers: HeaderMap,
    multipart: Multipart,
    target: UploadTarget,
) -> Result<(StatusCode, Json<SecureUploadResponse>), AppError> {
    require_target_developer(&state, &auth_user, &target).await?;

    let form = parse_upload_form(multipart, &state.config.upload).await?;

    check_admission(
        &form.upload_token,
        target.secret(),
        &form.device_info,
        request_user_agent(&headers),
        &form.capture_metadata,
    )?;
    check_counts(
        form.images.len(),
        form.videos.len(),
        target.max_images(&state.config.upload),
        state.config.upload.max_videos,
    )?;

    let folder = target.kind().folder();
    let now = Utc::now();

    let mut image_entries = Vec::with_capacity(form.images.len());
    for file in &form.images {
        let (sha256, url) =
            store_deduplicated(&*state.media, folder, &file.bytes, MediaKind::Image).await?;
        image_entries.push(MediaEntry {
            sha256,
            url,
            uploaded_at: now,
            description: form.description.clone(),
            capture_metadata: form.capture_metadata.clone(),
            device_info: form.device_info.clone(),
            qr_verified: true,
        });
    }

    let mut video_entries = Vec::with_capacity(form.videos.len());
    for file in &form.videos {
        let (sha256, url) =
            store_deduplicated(&*state.media, folder, &file.bytes, MediaKind::Video).await?;
        video_entries.push(MediaEntry {
            sha256,
            url,
            uploaded_at: now,
            description: form.description.clone(),
            capture_metadata: form.capture_metadata.clone(),
            device_info: form.device_info.clone(),
            qr_verified: true,
        });
    }

    let kind = target.kind();
    let project_id = target.project_id();
    let entity_id = target.entity_id();

    // Persist media lists and the projected feed entry together.
    let txn = state.db.begin().await?;

    let (update_title, update_property_id, update_milestone_id, audience) = match target {
        UploadTarget::Milestone(m) => {
            let mut photos = media_from_json(&m.photos);
            photos.extend(image_entries.iter().cloned());
            let mut videos = media_from_json(&m.videos);
            videos.extend(video_entries.iter().cloned());

            let title = format!("Construction update: {}", m.title);
            let milestone_id = m.id;
            let mut active: milestone::ActiveModel = m.into();
            active.photos = Set(media_to_json(&photos));
            active.videos = Set(media_to_json(&videos));
            active.updated_at = Set(now);
            active.update(&txn).await?;

            (title, None, Some(milestone_id), UpdateAudience::Project)
        }
        UploadTarget::Property(p) => {
            let mut photos = media_from_json(&p.unit_photos);
            photos.extend(image_entries.iter().cloned());
            let mut videos = media_from_json(&p.unit_videos);
            videos.extend(video_entries.iter().cloned());

            let title = format!("Update for unit {}", p.unit_number);
            let property_id = p.id;
            let mut active: property::ActiveModel = p.into();
            active.unit_photos = Set(media_to_json(&photos));
            active.unit_videos = Set(media_to_json(&videos));
            active.update(&txn).await?;

            (title, Some(property_id), None, UpdateAudience::PropertyOwner)
        }
    };

    let all_entries: Vec<MediaEntry> = image_entries
        .iter()
        .chain(video_entries.iter())
        .cloned()
        .collect();

    let update = construction_update::ActiveModel {
        project_id: Set(project_id),
        milestone_id: Set(update_milestone_id),
        property_id: Set(update_property_id),
        title: Set(update_title),
        body: Set(form.description.clone().unwrap_or_default()),
        media: Set(media_to_json(&all_entries)),
        audience: Set(audience),
        created_at: Set(now),
        ..Default::default()
    };
    let update = update.insert(&txn).await?;

    txn.commit().await?;

    for entry in &all_entries {
        state.events.publish(DomainEvent::EvidenceAttached {
            kind,
            entity_id,
            project_id,
            sha256: entry.sha256.clone(),
        });
    }
    state.events.publish(DomainEvent::ConstructionUpdatePosted {
        update_id: update.id,
        project_id,
    });

    Ok((
        StatusCode::CREATED,
        Json(SecureUploadResponse {
            images: image_entries,
            videos: video_entries,
            update_id: update.id,
        }),
    ))
}

/// Upload evidence to a milestone.
#[utoipa::path(
    post,
    path = "/{id}/secure-upload",
    tag = "Evidence",
    operation_id = "milestoneSecureUpload",
    summary = "Upload milestone evidence",
    description = "QR-bound multipart upload: `images[]`, `videos[]`, `description`, \
        `upload_token`, `capture_metadata`, `device_info`. Files are content-addressed by \
        SHA-256 and deduplicated against the external store.",
    params(("id" = i32, Path, description = "Milestone ID")),
    request_body(content_type = "multipart/form-data", description = "Evidence upload"),
    responses(
        (status = 201, description = "Evidence attached", body = SecureUploadResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Gate failed (invalid_token, DESKTOP_UPLOAD_BLOCKED, GALLERY_UPLOAD_BLOCKED)", body = ErrorBody),
        (status = 404, description = "Milestone not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers, multipart), fields(milestone_id = %id))]
pub async fn milestone_secure_upload(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let target = load_milestone_target(&state.db, id).await?;
    process_secure_upload(state, auth_user, headers, multipart, target).await
}

/// Upload evidence to a property.
#[utoipa::path(
    post,
    path = "/{id}/secure-upload",
    tag = "Evidence",
    operation_id = "propertySecureUpload",
    summary = "Upload unit evidence",
    description = "Same protocol as milestone uploads; the resulting feed entry is visible only \
        to the unit's buyer.",
    params(("id" = i32, Path, description = "Property ID")),
    request_body(content_type = "multipart/form-data", description = "Evidence upload"),
    responses(
        (status = 201, description = "Evidence attached", body = SecureUploadResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Gate failed (invalid_token, DESKTOP_UPLOAD_BLOCKED, GALLERY_UPLOAD_BLOCKED)", body = ErrorBody),
        (status = 404, description = "Property not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers, multipart), fields(property_id = %id))]
pub async fn property_secure_upload(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let target = load_property_target(&state.db, id).await?;
    process_secure_upload(state, auth_user, headers, multipart, target).await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use common::storage::StorageError;

    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    /// In-memory store that counts upload calls per key.
    #[derive(Default)]
    struct CountingStore {
        objects: Mutex<HashMap<String, usize>>,
    }

    impl CountingStore {
        fn upload_calls(&self, public_id: &str, kind: MediaKind) -> usize {
            let key = format!("{}/{public_id}", kind.segment());
            self.objects.lock().unwrap().get(&key).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl MediaStore for CountingStore {
        async fn exists(&self, public_id: &str, kind: MediaKind) -> Result<bool, StorageError> {
            let key = format!("{}/{public_id}", kind.segment());
            Ok(self.objects.lock().unwrap().contains_key(&key))
        }

        async fn upload(
            &self,
            _data: &[u8],
            public_id: &str,
            kind: MediaKind,
            _overwrite: bool,
        ) -> Result<String, StorageError> {
            let key = format!("{}/{public_id}", kind.segment());
            *self.objects.lock().unwrap().entry(key).or_insert(0) += 1;
            Ok(self.url_for(public_id, kind))
        }

        fn url_for(&self, public_id: &str, kind: MediaKind) -> String {
            format!("https://store.test/{}/{public_id}", kind.segment())
        }
    }

    #[tokio::test]
    async fn same_bytes_upload_once_and_share_a_url() {
        let store = CountingStore::default();
        let bytes = b"slab casting photo";

        let (sha_a, url_a) = store_deduplicated(&store, "milestones", bytes, MediaKind::Image)
            .await
            .unwrap();
        let (sha_b, url_b) = store_deduplicated(&store, "milestones", bytes, MediaKind::Image)
            .await
            .unwrap();

        assert_eq!(sha_a, sha_b);
        assert_eq!(url_a, url_b);
        // Probed twice, uploaded exactly once.
        assert_eq!(
            store.upload_calls(&format!("milestones/{sha_a}"), MediaKind::Image),
            1
        );
    }

    #[tokio::test]
    async fn different_bytes_get_distinct_keys() {
        let store = CountingStore::default();

        let (sha_a, _) = store_deduplicated(&store, "units", b"one", MediaKind::Image)
            .await
            .unwrap();
        let (sha_b, _) = store_deduplicated(&store, "units", b"two", MediaKind::Image)
            .await
            .unwrap();

        assert_ne!(sha_a, sha_b);
    }

    fn mobile_device() -> DeviceInfo {
        DeviceInfo {
            is_mobile: true,
            ..Default::default()
        }
    }

    fn camera_capture() -> CaptureMetadata {
        CaptureMetadata {
            camera_captured: true,
            ..Default::default()
        }
    }

    fn token() -> &'static str {
        &SECRET[..32]
    }

    #[test]
    fn admission_passes_with_all_gates_green() {
        let result = check_admission(
            token(),
            Some(SECRET),
            &mobile_device(),
            None,
            &camera_capture(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn wrong_token_is_forbidden() {
        let err = check_admission(
            "ffffffffffffffffffffffffffffffff",
            Some(SECRET),
            &mobile_device(),
            None,
            &camera_capture(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Forbidden {
                code: "invalid_token",
                ..
            }
        ));
    }

    #[test]
    fn full_secret_is_not_a_valid_token() {
        // Only the 32-char prefix is the credential.
        let err = check_admission(
            SECRET,
            Some(SECRET),
            &mobile_device(),
            None,
            &camera_capture(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Forbidden {
                code: "invalid_token",
                ..
            }
        ));
    }

    #[test]
    fn desktop_upload_is_blocked() {
        let desktop = DeviceInfo::default();
        let err = check_admission(
            token(),
            Some(SECRET),
            &desktop,
            Some("Mozilla/5.0 (X11; Linux x86_64) Chrome/120.0"),
            &camera_capture(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Forbidden {
                code: "DESKTOP_UPLOAD_BLOCKED",
                ..
            }
        ));
    }

    #[test]
    fn mobile_user_agent_alone_passes_the_mobile_gate() {
        let desktop_flag = DeviceInfo::default();
        let result = check_admission(
            token(),
            Some(SECRET),
            &desktop_flag,
            Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"),
            &camera_capture(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn gallery_upload_is_blocked() {
        let err = check_admission(
            token(),
            Some(SECRET),
            &mobile_device(),
            None,
            &CaptureMetadata::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Forbidden {
                code: "GALLERY_UPLOAD_BLOCKED",
                ..
            }
        ));
    }

    #[test]
    fn token_gate_runs_before_device_gates() {
        // A desktop request with a bad token reports the token error.
        let err = check_admission(
            "wrong",
            Some(SECRET),
            &DeviceInfo::default(),
            None,
            &CaptureMetadata::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Forbidden {
                code: "invalid_token",
                ..
            }
        ));
    }

    #[test]
    fn count_limits() {
        assert!(check_counts(10, 5, 10, 5).is_ok());
        assert!(check_counts(11, 0, 10, 5).is_err());
        assert!(check_counts(0, 6, 15, 5).is_err());
        assert!(check_counts(0, 0, 10, 5).is_err());
    }
}
