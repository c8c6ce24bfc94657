use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::User;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    /// Success with the flash-style message shown to the user.
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(message.into()),
        }
    }
}

/// Where the client should go next.
#[derive(Debug, Serialize)]
pub struct NextStep {
    pub next: &'static str,
}

impl NextStep {
    pub const fn to(next: &'static str) -> Self {
        Self { next }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub student_id: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub profile_image_base64: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub last_location_update: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            student_id: user.student_id,
            is_admin: user.is_admin,
            is_active: user.is_active,
            profile_image_base64: user.profile_image_base64,
            latitude: user.latitude,
            longitude: user.longitude,
            city: user.city,
            country: user.country,
            last_location_update: user.last_location_update,
            date_joined: user.date_joined,
            last_login: user.last_login,
        }
    }
}

/// Coordinates arrive from browser forms as numbers or numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.is_finite().then_some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

#[must_use]
pub fn coordinate(value: Option<&Coordinate>) -> Option<f64> {
    value.and_then(Coordinate::value)
}
