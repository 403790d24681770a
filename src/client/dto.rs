//! Request and response bodies that exist only on the wire

use serde::{Deserialize, Serialize};

/// `POST /auth/login` response
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// `POST /auth/register` body
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<&'a str>,
}

/// `POST /bookings/me` body
#[derive(Debug, Serialize)]
pub struct OwnBookingRequest<'a> {
    pub box_id: &'a str,
    pub duration_minutes: u32,
    pub user_name: &'a str,
}

/// `POST /bookings/` body
#[derive(Debug, Serialize)]
pub struct CustomerBookingRequest<'a> {
    pub user_email: &'a str,
    pub box_id: &'a str,
    pub duration_minutes: u32,
    pub user_name: &'a str,
}

/// Server-side filters for `GET /bookings/`
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookingQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// true = active only, false = expired only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_only: Option<bool>,
}

impl BookingQuery {
    pub fn all() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_booking_always_names_user() {
        let body = OwnBookingRequest {
            box_id: "LOCKER-01",
            duration_minutes: 90,
            user_name: "Ann",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"box_id": "LOCKER-01", "duration_minutes": 90, "user_name": "Ann"})
        );
    }

    #[test]
    fn test_login_response() {
        let resp: LoginResponse =
            serde_json::from_str(r#"{"access_token": "jwt", "token_type": "bearer"}"#).unwrap();
        assert_eq!(resp.access_token, "jwt");
    }
}
