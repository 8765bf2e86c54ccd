use common::UserRole;
use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;

/// Request body for registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "asha")]
    pub username: String,
    pub password: String,
    /// "buyer" or "builder". Staff accounts are provisioned out of band.
    pub role: UserRole,
    /// Builder registrations create a developer profile; required then.
    pub company_name: Option<String>,
    /// RERA registration string; required for builders.
    pub rera_registration: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    pub id: i32,
    pub username: String,
    pub role: UserRole,
}

impl From<user::Model> for RegisterResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            role: m.role,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "asha")]
    pub username: String,
    pub password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: UserRole,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub id: i32,
    pub username: String,
    pub role: UserRole,
}

pub fn validate_register_request(req: &RegisterRequest) -> Result<(), AppError> {
    let username = req.username.trim();
    if username.is_empty() || username.chars().count() > 64 {
        return Err(AppError::Validation(
            "Username must be 1-64 characters".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    if req.role == UserRole::Staff {
        return Err(AppError::Validation(
            "Staff accounts cannot self-register".into(),
        ));
    }
    if req.role == UserRole::Builder {
        if req.company_name.as_deref().is_none_or(|s| s.trim().is_empty()) {
            return Err(AppError::Validation(
                "company_name is required for builders".into(),
            ));
        }
        if req
            .rera_registration
            .as_deref()
            .is_none_or(|s| s.trim().is_empty())
        {
            return Err(AppError::Validation(
                "rera_registration is required for builders".into(),
            ));
        }
    }
    Ok(())
}

pub fn validate_login_request(req: &LoginRequest) -> Result<(), AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_request() -> RegisterRequest {
        RegisterRequest {
            username: "skyline".into(),
            password: "long-enough".into(),
            role: UserRole::Builder,
            company_name: Some("Skyline Estates".into()),
            rera_registration: Some("RERA-MH-1234".into()),
        }
    }

    #[test]
    fn builder_needs_company_and_rera() {
        assert!(validate_register_request(&builder_request()).is_ok());

        let mut missing_company = builder_request();
        missing_company.company_name = None;
        assert!(validate_register_request(&missing_company).is_err());

        let mut blank_rera = builder_request();
        blank_rera.rera_registration = Some("  ".into());
        assert!(validate_register_request(&blank_rera).is_err());
    }

    #[test]
    fn buyer_needs_no_profile_fields() {
        let req = RegisterRequest {
            username: "asha".into(),
            password: "long-enough".into(),
            role: UserRole::Buyer,
            company_name: None,
            rera_registration: None,
        };
        assert!(validate_register_request(&req).is_ok());
    }

    #[test]
    fn staff_cannot_self_register() {
        let mut req = builder_request();
        req.role = UserRole::Staff;
        assert!(validate_register_request(&req).is_err());
    }

    #[test]
    fn short_password_rejected() {
        let mut req = builder_request();
        req.password = "short".into();
        assert!(validate_register_request(&req).is_err());
    }
}
