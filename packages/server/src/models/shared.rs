use serde::Serialize;

use crate::error::AppError;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

/// Clamp raw page/per_page query values to sane bounds.
pub fn clamp_paging(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    (page, per_page)
}

/// Validate a trimmed name/title (1-256 Unicode characters).
pub fn validate_title(title: &str, field: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(AppError::Validation(format!(
            "{field} must be 1-256 characters"
        )));
    }
    Ok(())
}

/// Validate a positive money amount in rupees.
pub fn validate_amount(amount: i64, field: &str) -> Result<(), AppError> {
    if amount <= 0 {
        return Err(AppError::Invariant(format!("{field} must be positive")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_is_clamped() {
        assert_eq!(clamp_paging(None, None), (1, 20));
        assert_eq!(clamp_paging(Some(0), Some(0)), (1, 1));
        assert_eq!(clamp_paging(Some(3), Some(500)), (3, 100));
    }

    #[test]
    fn titles_are_bounded() {
        assert!(validate_title("Skyline Heights", "name").is_ok());
        assert!(validate_title("   ", "name").is_err());
        assert!(validate_title(&"x".repeat(257), "name").is_err());
    }

    #[test]
    fn amounts_must_be_positive() {
        assert!(validate_amount(1, "amount").is_ok());
        assert!(validate_amount(0, "amount").is_err());
        assert!(validate_amount(-5, "amount").is_err());
    }
}
