use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, msg};

/// An identity known to the service. Source of truth for name/email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: i64,
}

/// Data required to create a new user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
}

impl CreateUser {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("name is required".into()));
        }
        if !self.email.contains('@') {
            return Err(AppError::BadRequest("email is invalid".into()));
        }
        Ok(())
    }
}

/// Per-user profile row carrying the role flag.
///
/// Identity (users) and role (profiles) are separate tables so a role
/// upsert can never touch identity fields.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub role: ProfileRole,
    pub created_at: i64,
    pub updated_at: i64,
}

/// An identity merged with its profile row, as returned by the admin
/// user listing. `role` is None for users without a profile.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Option<ProfileRole>,
    pub created_at: i64,
}

/// Role stored on a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    Admin,
    Staff,
}

impl ProfileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
        }
    }
}

impl std::str::FromStr for ProfileRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            _ => Err(AppError::BadRequest(msg::INVALID_ROLE.into())),
        }
    }
}

impl std::fmt::Display for ProfileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bearer credential record. The raw key is shown once at creation;
/// only its SHA-256 hash is stored.
#[derive(Debug, Clone, Serialize)]
pub struct ApiKey {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub key_prefix: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub created_at: i64,
    pub revoked_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!("admin".parse::<ProfileRole>().unwrap(), ProfileRole::Admin);
        assert_eq!("staff".parse::<ProfileRole>().unwrap(), ProfileRole::Staff);
        assert_eq!(ProfileRole::Admin.as_str(), "admin");
        assert!("owner".parse::<ProfileRole>().is_err());
    }

    #[test]
    fn test_create_user_validation() {
        let ok = CreateUser {
            email: "ops@omega.example".into(),
            name: "Ops".into(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = CreateUser {
            email: "not-an-email".into(),
            name: "Ops".into(),
        };
        assert!(bad_email.validate().is_err());

        let bad_name = CreateUser {
            email: "ops@omega.example".into(),
            name: "  ".into(),
        };
        assert!(bad_name.validate().is_err());
    }
}
