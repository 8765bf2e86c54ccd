use chrono::{DateTime, Utc};
use common::{MilestoneStatus, ProjectStatus, PropertyStatus};
use serde::{Deserialize, Serialize};

use crate::entity::construction_update::UpdateAudience;
use crate::entity::media::{MediaEntry, media_from_json};
use crate::entity::{construction_update, milestone, project, property};
use crate::error::AppError;

use super::shared::{Pagination, validate_amount, validate_title};

/// Request body for creating a project.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateProjectRequest {
    #[schema(example = "Skyline Heights")]
    pub name: String,
    pub description: String,
    #[schema(example = "apartment")]
    pub project_type: String,
    #[schema(example = "Pune")]
    pub city: String,
    pub locality: String,
    /// Price floor across units, in rupees.
    #[schema(example = 4500000)]
    pub starting_price: i64,
    pub expected_completion: Option<DateTime<Utc>>,
}

/// Query parameters for the project catalog.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ProjectListQuery {
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
    /// Filter by lifecycle status.
    pub status: Option<ProjectStatus>,
    /// Filter by project type.
    pub project_type: Option<String>,
    /// Filter by city (exact, case-insensitive).
    pub city: Option<String>,
    /// Filter by developer id.
    pub developer: Option<i32>,
    /// Only verified developers.
    pub verified: Option<bool>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Comma-separated unit types; matches projects containing any of them.
    #[param(example = "2bhk,3bhk")]
    pub property_types: Option<String>,
    /// Ordering: `starting_price`, `created_at` (default), `expected_completion`,
    /// `verification_score`, `views_count`, `popular`.
    pub ordering: Option<String>,
    /// Sort direction: `asc` or `desc` (default). Ignored for `popular`.
    pub sort_order: Option<String>,
}

/// Project summary/detail.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectResponse {
    pub id: i32,
    pub developer_id: i32,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub project_type: String,
    pub city: String,
    pub locality: String,
    pub starting_price: i64,
    pub total_units: i32,
    pub available_units: i32,
    pub views_count: i64,
    pub expected_completion: Option<DateTime<Utc>>,
    pub verification_score: i32,
    pub rating_avg: Option<f64>,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<project::Model> for ProjectResponse {
    fn from(m: project::Model) -> Self {
        Self {
            id: m.id,
            developer_id: m.developer_id,
            name: m.name,
            description: m.description,
            status: m.status,
            project_type: m.project_type,
            city: m.city,
            locality: m.locality,
            starting_price: m.starting_price,
            total_units: m.total_units,
            available_units: m.available_units,
            views_count: m.views_count,
            expected_completion: m.expected_completion,
            verification_score: m.verification_score,
            rating_avg: m.rating_avg,
            review_count: m.review_count,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectListResponse {
    pub data: Vec<ProjectResponse>,
    pub pagination: Pagination,
}

/// Request body for adding a unit to a project.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePropertyRequest {
    #[schema(example = "A-1203")]
    pub unit_number: String,
    #[schema(example = "3bhk")]
    pub property_type: String,
    pub floor: Option<i32>,
    /// Unit price in rupees.
    #[schema(example = 5000000)]
    pub price: i64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PropertyResponse {
    pub id: i32,
    pub project_id: i32,
    pub unit_number: String,
    pub property_type: String,
    pub floor: Option<i32>,
    pub price: i64,
    pub status: PropertyStatus,
    pub unit_photos: Vec<MediaEntry>,
    pub unit_videos: Vec<MediaEntry>,
    pub created_at: DateTime<Utc>,
}

impl From<property::Model> for PropertyResponse {
    fn from(m: property::Model) -> Self {
        Self {
            id: m.id,
            project_id: m.project_id,
            unit_number: m.unit_number,
            property_type: m.property_type,
            floor: m.floor,
            price: m.price,
            status: m.status,
            unit_photos: media_from_json(&m.unit_photos),
            unit_videos: media_from_json(&m.unit_videos),
            created_at: m.created_at,
        }
    }
}

/// Request body for adding a milestone to a project.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateMilestoneRequest {
    #[schema(example = "Foundation")]
    pub title: String,
    pub description: String,
    #[schema(example = 1)]
    pub phase_number: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MilestoneResponse {
    pub id: i32,
    pub project_id: i32,
    pub title: String,
    pub description: String,
    pub phase_number: i32,
    pub status: MilestoneStatus,
    pub progress_percentage: i32,
    pub photos: Vec<MediaEntry>,
    pub videos: Vec<MediaEntry>,
    pub created_at: DateTime<Utc>,
}

impl From<milestone::Model> for MilestoneResponse {
    fn from(m: milestone::Model) -> Self {
        Self {
            id: m.id,
            project_id: m.project_id,
            title: m.title,
            description: m.description,
            phase_number: m.phase_number,
            status: m.status,
            progress_percentage: m.progress_percentage,
            photos: media_from_json(&m.photos),
            videos: media_from_json(&m.videos),
            created_at: m.created_at,
        }
    }
}

/// A construction-update feed entry.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ConstructionUpdateResponse {
    pub id: i32,
    pub project_id: i32,
    pub milestone_id: Option<i32>,
    pub property_id: Option<i32>,
    pub title: String,
    pub body: String,
    pub media: Vec<MediaEntry>,
    pub audience: UpdateAudience,
    pub created_at: DateTime<Utc>,
}

impl From<construction_update::Model> for ConstructionUpdateResponse {
    fn from(m: construction_update::Model) -> Self {
        Self {
            id: m.id,
            project_id: m.project_id,
            milestone_id: m.milestone_id,
            property_id: m.property_id,
            title: m.title,
            body: m.body,
            media: media_from_json(&m.media),
            audience: m.audience,
            created_at: m.created_at,
        }
    }
}

const ALLOWED_ORDERINGS: &[&str] = &[
    "starting_price",
    "created_at",
    "expected_completion",
    "verification_score",
    "views_count",
    "popular",
];

pub fn validate_project_list_query(query: &ProjectListQuery) -> Result<(), AppError> {
    if let Some(ref ordering) = query.ordering
        && !ALLOWED_ORDERINGS.contains(&ordering.as_str())
    {
        return Err(AppError::Validation(format!(
            "Invalid ordering '{}'. Allowed: {}",
            ordering,
            ALLOWED_ORDERINGS.join(", ")
        )));
    }
    if let Some(ref sort_order) = query.sort_order
        && !["asc", "desc"].contains(&sort_order.to_lowercase().as_str())
    {
        return Err(AppError::Validation(
            "sort_order must be 'asc' or 'desc'".into(),
        ));
    }
    if let (Some(min), Some(max)) = (query.min_price, query.max_price)
        && min > max
    {
        return Err(AppError::Validation(
            "min_price must not exceed max_price".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_project(req: &CreateProjectRequest) -> Result<(), AppError> {
    validate_title(&req.name, "name")?;
    validate_amount(req.starting_price, "starting_price")?;
    if req.project_type.trim().is_empty() {
        return Err(AppError::Validation("project_type is required".into()));
    }
    if req.city.trim().is_empty() {
        return Err(AppError::Validation("city is required".into()));
    }
    Ok(())
}

pub fn validate_create_property(req: &CreatePropertyRequest) -> Result<(), AppError> {
    if req.unit_number.trim().is_empty() {
        return Err(AppError::Validation("unit_number is required".into()));
    }
    validate_amount(req.price, "price")?;
    Ok(())
}

pub fn validate_create_milestone(req: &CreateMilestoneRequest) -> Result<(), AppError> {
    validate_title(&req.title, "title")?;
    if req.phase_number < 1 {
        return Err(AppError::Validation("phase_number must be >= 1".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_query() -> ProjectListQuery {
        ProjectListQuery {
            page: None,
            per_page: None,
            status: None,
            project_type: None,
            city: None,
            developer: None,
            verified: None,
            min_price: None,
            max_price: None,
            property_types: None,
            ordering: None,
            sort_order: None,
        }
    }

    #[test]
    fn orderings_are_checked() {
        let mut q = list_query();
        q.ordering = Some("popular".into());
        assert!(validate_project_list_query(&q).is_ok());

        q.ordering = Some("price".into());
        assert!(validate_project_list_query(&q).is_err());
    }

    #[test]
    fn price_range_must_be_ordered() {
        let mut q = list_query();
        q.min_price = Some(2_000_000);
        q.max_price = Some(1_000_000);
        assert!(validate_project_list_query(&q).is_err());
    }

    #[test]
    fn milestone_phase_number_must_be_positive() {
        let req = CreateMilestoneRequest {
            title: "Foundation".into(),
            description: String::new(),
            phase_number: 0,
        };
        assert!(validate_create_milestone(&req).is_err());
    }
}
