//! Booking Backend Client
//!
//! Maps each domain operation to one HTTP call against the configured base
//! URL. The credential is read from the injected [`Session`] at the start of
//! every call. Operations that need a credential fail locally, before any
//! request is built, when none is stored.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Instant;

use super::dto::{
    BookingQuery, CustomerBookingRequest, LoginResponse, OwnBookingRequest, RegisterRequest,
};
use super::error::{truncate_body, ClientError, ClientResult};
use crate::config::ApiConfig;
use crate::models::{
    AdminBooking, AdminUnit, Booking, CurrentUser, Unit, UnitDraft, UnitOccupancy, UnitPatch,
};
use crate::session::Session;

/// Whether a call carries the bearer credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Fail locally when absent
    Required,
    /// Attach when present
    Optional,
    None,
}

/// Typed client for the booking backend
#[derive(Clone)]
pub struct BoxClient {
    http: Client,
    base_url: Option<String>,
    session: Session,
    error_body_limit: usize,
}

impl BoxClient {
    /// Create a client; a missing base URL is reported per call, not here
    pub fn new(config: &ApiConfig, session: Session) -> ClientResult<Self> {
        let http = Client::builder().timeout(config.request_timeout()).build()?;

        let base_url = config.normalized_base_url();
        if base_url.is_none() {
            tracing::warn!("Backend URL not configured; network operations will fail");
        }

        Ok(Self {
            http,
            base_url,
            session,
            error_body_limit: config.error_body_limit,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    // ============ Auth ============

    /// Log in with email and password; stores the returned token
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<String> {
        let response = self
            .send(Method::POST, "/auth/login", Auth::None, |req| {
                req.form(&[("username", email), ("password", password)])
            })
            .await?;

        let login: LoginResponse = decode(response).await?;
        self.session.set_credential(&login.access_token)?;

        tracing::info!(email = %email, "Logged in");
        Ok(login.access_token)
    }

    /// Drop the stored credential
    pub fn logout(&self) -> ClientResult<()> {
        self.session.clear_credential()?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Create a customer account; `api_key` is sent as `X-API-Key`
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
        api_key: Option<&str>,
    ) -> ClientResult<CurrentUser> {
        let body = RegisterRequest {
            email,
            password,
            full_name,
        };

        let response = self
            .send(Method::POST, "/auth/register", Auth::None, |req| {
                let req = req.json(&body);
                match api_key {
                    Some(key) => req.header("X-API-Key", key),
                    None => req,
                }
            })
            .await?;

        decode(response).await
    }

    /// `GET /auth/me`
    pub async fn fetch_current_user(&self) -> ClientResult<CurrentUser> {
        let response = self
            .send(Method::GET, "/auth/me", Auth::Required, |req| req)
            .await?;
        decode(response).await
    }

    // ============ Units ============

    /// Units free in the window starting `start_offset_minutes` from now
    pub async fn fetch_available_units(
        &self,
        start_offset_minutes: u32,
        duration_minutes: u32,
    ) -> ClientResult<Vec<Unit>> {
        let response = self
            .send(Method::GET, "/boxes/available", Auth::Optional, |req| {
                req.query(&[
                    ("start_in_minutes", start_offset_minutes),
                    ("duration_minutes", duration_minutes),
                ])
            })
            .await?;
        decode(response).await
    }

    /// Admin: all units with their configuration
    pub async fn list_units(&self) -> ClientResult<Vec<AdminUnit>> {
        let response = self
            .send(Method::GET, "/boxes/", Auth::Required, |req| req)
            .await?;
        decode(response).await
    }

    /// Admin: create a unit
    pub async fn create_unit(&self, draft: &UnitDraft) -> ClientResult<AdminUnit> {
        let response = self
            .send(Method::POST, "/boxes/", Auth::Required, |req| req.json(draft))
            .await?;
        decode(response).await
    }

    /// Admin: change selected fields of a unit
    pub async fn update_unit(&self, unit_id: &str, patch: &UnitPatch) -> ClientResult<AdminUnit> {
        let path = format!("/boxes/{}", urlencoding::encode(unit_id));
        let response = self
            .send(Method::PATCH, &path, Auth::Required, |req| req.json(patch))
            .await?;
        decode(response).await
    }

    /// Admin: remove a unit
    pub async fn delete_unit(&self, unit_id: &str) -> ClientResult<()> {
        let path = format!("/boxes/{}", urlencoding::encode(unit_id));
        self.send(Method::DELETE, &path, Auth::Required, |req| req)
            .await?;
        Ok(())
    }

    /// Admin: free/occupied state of every unit
    pub async fn unit_occupancy(&self) -> ClientResult<Vec<UnitOccupancy>> {
        let response = self
            .send(Method::GET, "/boxes/status", Auth::Required, |req| req)
            .await?;
        decode(response).await
    }

    // ============ Bookings ============

    /// Book a unit for the logged-in customer.
    ///
    /// The backend requires a name on every booking; without `display_name`
    /// the current user's name is fetched first.
    pub async fn create_own_booking(
        &self,
        unit_id: &str,
        duration_minutes: u32,
        display_name: Option<&str>,
    ) -> ClientResult<Booking> {
        let fetched;
        let user_name = match non_blank(display_name) {
            Some(name) => name,
            None => {
                fetched = self.fetch_current_user().await?;
                fetched.display_name()
            }
        };

        let body = OwnBookingRequest {
            box_id: unit_id,
            duration_minutes,
            user_name,
        };

        let response = self
            .send(Method::POST, "/bookings/me", Auth::Required, |req| {
                req.json(&body)
            })
            .await?;

        let booking: Booking = decode(response).await?;
        tracing::info!(booking_id = %booking.id, unit_id = %unit_id, "Booking created");
        Ok(booking)
    }

    /// Bookings of the logged-in customer
    pub async fn list_own_bookings(&self, active_only: Option<bool>) -> ClientResult<Vec<Booking>> {
        let response = self
            .send(Method::GET, "/bookings/me", Auth::Required, |req| match active_only {
                Some(active) => req.query(&[("active_only", active)]),
                None => req,
            })
            .await?;
        decode(response).await
    }

    /// Admin: all bookings, optionally filtered server-side
    pub async fn list_all_bookings(&self, query: &BookingQuery) -> ClientResult<Vec<AdminBooking>> {
        let response = self
            .send(Method::GET, "/bookings/", Auth::Required, |req| req.query(query))
            .await?;
        decode(response).await
    }

    /// Admin: book a unit on behalf of a customer; the name defaults to the email
    pub async fn create_booking_for_customer(
        &self,
        customer_email: &str,
        unit_id: &str,
        duration_minutes: u32,
        display_name: Option<&str>,
    ) -> ClientResult<AdminBooking> {
        let body = CustomerBookingRequest {
            user_email: customer_email,
            box_id: unit_id,
            duration_minutes,
            user_name: non_blank(display_name).unwrap_or(customer_email),
        };

        let response = self
            .send(Method::POST, "/bookings/", Auth::Required, |req| req.json(&body))
            .await?;

        let booking: AdminBooking = decode(response).await?;
        tracing::info!(
            booking_id = %booking.id(),
            customer = %customer_email,
            "Booking created for customer"
        );
        Ok(booking)
    }

    /// Admin: cancel a booking
    pub async fn cancel_booking(&self, booking_id: &str) -> ClientResult<()> {
        let path = format!("/bookings/{}", urlencoding::encode(booking_id));
        self.send(Method::DELETE, &path, Auth::Required, |req| req)
            .await?;

        tracing::info!(booking_id = %booking_id, "Booking cancelled");
        Ok(())
    }

    // ============ Transport ============

    /// Build, authorize and send one request; non-2xx becomes `ClientError::Api`
    async fn send(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> ClientResult<Response> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(ClientError::missing_base_url)?;

        let token = match auth {
            Auth::Required => Some(self.session.credential().ok_or(ClientError::AuthRequired)?),
            Auth::Optional => self.session.credential(),
            Auth::None => None,
        };

        let mut request = self.http.request(method.clone(), format!("{}{}", base, path));
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        let request = build(request);

        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = %method, path = %path, error = %e, "Request failed");
            ClientError::Request(e)
        })?;

        let status = response.status();
        tracing::debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Backend responded"
        );

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED && token.is_some() {
            tracing::warn!(path = %path, "Credential rejected, clearing session");
            if let Err(e) = self.session.clear_credential() {
                tracing::warn!(error = %e, "Failed to clear rejected credential");
            }
        }

        Err(ClientError::Api {
            status: status.as_u16(),
            body: truncate_body(&text, self.error_body_limit),
        })
    }
}

fn non_blank(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !n.trim().is_empty())
}

/// Decode a JSON body, keeping serde's error for malformed payloads
async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::error::FailureKind;
    use crate::client::mock::MockBackend;
    use serde_json::json;

    fn booking_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "user_name": "Ann",
            "box_id": "LOCKER-01",
            "access_code": null,
            "created_at": "2025-04-01T10:00:00",
            "valid_until": "2025-04-01T12:00:00",
            "pricing_mode": "hourly",
            "unit_label": "hour",
            "billed_units": 2,
            "price_for_period": 3.0
        })
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_fast() {
        let mock = MockBackend::start().await;
        let session = Session::in_memory();
        session.set_credential("tok").unwrap();
        let client = BoxClient::new(&ApiConfig::default(), session).unwrap();

        assert!(!client.is_configured());
        let err = client.fetch_available_units(0, 60).await.unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        let err = client.fetch_current_user().await.unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_current_user_without_credential() {
        let mock = MockBackend::start().await;
        let client = mock.client(Session::in_memory());

        let err = client.fetch_current_user().await.unwrap_err();
        assert!(matches!(err, ClientError::AuthRequired));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_creates_without_credential_send_nothing() {
        let mock = MockBackend::start().await;
        mock.on_json("POST", "/bookings/me", 200, booking_json("b1"));
        mock.on_json("POST", "/bookings/", 200, booking_json("b2"));
        let client = mock.client(Session::in_memory());

        let err = client
            .create_own_booking("LOCKER-01", 60, Some("Ann"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AuthRequired));

        let err = client
            .create_booking_for_customer("ann@example.com", "LOCKER-01", 60, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AuthRequired));

        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_available_units_auth_header_optional() {
        let mock = MockBackend::start().await;
        mock.on_json(
            "GET",
            "/boxes/available",
            200,
            json!([{
                "id": "LOCKER-01", "name": "Small", "size_m2": 1.0,
                "pricing_mode": "daily", "unit_label": "day",
                "billed_units": 1, "price_for_period": 8.0
            }]),
        );

        let session = Session::in_memory();
        let client = mock.client(session.clone());

        let anonymous = client.fetch_available_units(30, 120).await.unwrap();
        session.set_credential("tok-7").unwrap();
        let authed = client.fetch_available_units(30, 120).await.unwrap();

        assert_eq!(anonymous, authed);
        assert_eq!(anonymous[0].id, "LOCKER-01");

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].authorization, None);
        assert_eq!(requests[1].authorization.as_deref(), Some("Bearer tok-7"));
        assert_eq!(requests[0].query, requests[1].query);
        assert_eq!(
            requests[0].query.as_deref(),
            Some("start_in_minutes=30&duration_minutes=120")
        );
    }

    #[tokio::test]
    async fn test_login_stores_token_and_sends_form() {
        let mock = MockBackend::start().await;
        mock.on_json(
            "POST",
            "/auth/login",
            200,
            json!({"access_token": "jwt-123", "token_type": "bearer"}),
        );
        let session = Session::in_memory();
        let client = mock.client(session.clone());

        let token = client.login("ann@example.com", "secret").await.unwrap();
        assert_eq!(token, "jwt-123");
        assert_eq!(session.credential().as_deref(), Some("jwt-123"));

        let request = &mock.requests()[0];
        assert_eq!(request.body, "username=ann%40example.com&password=secret");
        assert_eq!(
            request.content_type.as_deref(),
            Some("application/x-www-form-urlencoded")
        );
        assert!(request.authorization.is_none());

        client.logout().unwrap();
        assert!(!session.is_logged_in());
    }

    #[tokio::test]
    async fn test_failed_login_keeps_session_empty() {
        let mock = MockBackend::start().await;
        mock.on_json("POST", "/auth/login", 400, json!({"detail": "Invalid credentials."}));
        let session = Session::in_memory();
        let client = mock.client(session.clone());

        let err = client.login("ann@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(!session.is_logged_in());
    }

    #[tokio::test]
    async fn test_register_sends_api_key() {
        let mock = MockBackend::start().await;
        mock.on_json(
            "POST",
            "/auth/register",
            200,
            json!({"id": "u9", "email": "new@example.com", "full_name": "New",
                   "is_active": true, "is_admin": false}),
        );
        let client = mock.client(Session::in_memory());

        let user = client
            .register("new@example.com", "pw", Some("New"), Some("k-1"))
            .await
            .unwrap();
        assert_eq!(user.id, "u9");
        assert_eq!(mock.requests()[0].api_key.as_deref(), Some("k-1"));
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session() {
        let mock = MockBackend::start().await;
        mock.on_json("GET", "/auth/me", 401, json!({"detail": "Could not validate credentials"}));
        let session = Session::in_memory();
        session.set_credential("stale").unwrap();
        let client = mock.client(session.clone());

        let err = client.fetch_current_user().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Unauthorized);
        assert!(!session.is_logged_in());

        // Next call fails locally
        let err = client.fetch_current_user().await.unwrap_err();
        assert!(matches!(err, ClientError::AuthRequired));
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_error_body_truncated() {
        let mock = MockBackend::start().await;
        mock.on("GET", "/boxes/", 500, "x".repeat(1000));
        let session = Session::in_memory();
        session.set_credential("tok").unwrap();

        let mut config = mock.api_config();
        config.error_body_limit = 40;
        let client = BoxClient::new(&config, session).unwrap();

        match client.list_units().await.unwrap_err() {
            ClientError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), 40);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let mock = MockBackend::start().await;
        mock.on("GET", "/boxes/available", 200, "<html>oops</html>");
        let client = mock.client(Session::in_memory());

        let err = client.fetch_available_units(0, 60).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_cancel_statuses() {
        let mock = MockBackend::start().await;
        mock.on_json("DELETE", "/bookings/B-404", 404, json!({"detail": "Booking not found"}));
        mock.on_json("DELETE", "/bookings/B-403", 403, json!({"detail": "Admin only"}));
        mock.on_json("DELETE", "/bookings/B-1", 200, json!({"ok": true, "booking_id": "B-1"}));
        let session = Session::in_memory();
        session.set_credential("admin-tok").unwrap();
        let client = mock.client(session);

        let err = client.cancel_booking("B-404").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotFound);
        let err = client.cancel_booking("B-403").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Forbidden);
        client.cancel_booking("B-1").await.unwrap();

        let requests = mock.requests();
        assert!(requests
            .iter()
            .all(|r| r.authorization.as_deref() == Some("Bearer admin-tok")));
    }

    #[tokio::test]
    async fn test_ids_are_percent_encoded() {
        let mock = MockBackend::start().await;
        mock.on_json("DELETE", "/boxes/LOCKER%2001", 200, json!({"ok": true}));
        let session = Session::in_memory();
        session.set_credential("tok").unwrap();
        let client = mock.client(session);

        client.delete_unit("LOCKER 01").await.unwrap();
        assert_eq!(mock.requests()[0].path, "/boxes/LOCKER%2001");
    }

    #[tokio::test]
    async fn test_list_all_bookings_query() {
        let mock = MockBackend::start().await;
        mock.on_json("GET", "/bookings/", 200, json!([booking_json("b1")]));
        let session = Session::in_memory();
        session.set_credential("tok").unwrap();
        let client = mock.client(session);

        let bookings = client.list_all_bookings(&BookingQuery::all()).await.unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].booking.access_code_display(), "not yet available");
        assert_eq!(mock.requests()[0].query, None);

        let query = BookingQuery {
            box_id: Some("LOCKER-01".to_string()),
            active_only: Some(true),
            ..Default::default()
        };
        client.list_all_bookings(&query).await.unwrap();
        assert_eq!(
            mock.requests()[1].query.as_deref(),
            Some("box_id=LOCKER-01&active_only=true")
        );
    }

    #[tokio::test]
    async fn test_create_booking_for_customer_body() {
        let mock = MockBackend::start().await;
        mock.on_json("POST", "/bookings/", 200, booking_json("b5"));
        let session = Session::in_memory();
        session.set_credential("tok").unwrap();
        let client = mock.client(session);

        let booking = client
            .create_booking_for_customer("ann@example.com", "LOCKER-01", 1440, Some("Ann"))
            .await
            .unwrap();
        assert_eq!(booking.id(), "b5");

        let body: serde_json::Value = serde_json::from_str(&mock.requests()[0].body).unwrap();
        assert_eq!(
            body,
            json!({"user_email": "ann@example.com", "box_id": "LOCKER-01",
                   "duration_minutes": 1440, "user_name": "Ann"})
        );
    }

    #[tokio::test]
    async fn test_customer_booking_name_defaults_to_email() {
        let mock = MockBackend::start().await;
        mock.on_json("POST", "/bookings/", 200, booking_json("b6"));
        let session = Session::in_memory();
        session.set_credential("tok").unwrap();
        let client = mock.client(session);

        client
            .create_booking_for_customer("cy@example.com", "L-1", 60, None)
            .await
            .unwrap();
        client
            .create_booking_for_customer("cy@example.com", "L-1", 60, Some("  "))
            .await
            .unwrap();

        for request in mock.requests() {
            let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
            assert_eq!(body["user_name"], "cy@example.com");
        }
    }

    #[tokio::test]
    async fn test_own_booking_name_fetched_when_missing() {
        let mock = MockBackend::start().await;
        mock.on_json("GET", "/auth/me", 200, json!({"id": "u1", "email": "ann@example.com", "full_name": "Ann Example"}));
        mock.on_json("POST", "/bookings/me", 200, booking_json("b7"));
        let session = Session::in_memory();
        session.set_credential("tok").unwrap();
        let client = mock.client(session);

        client.create_own_booking("LOCKER-01", 60, None).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path, "/auth/me");
        let body: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
        assert_eq!(body["user_name"], "Ann Example");

        client.create_own_booking("LOCKER-01", 60, Some("Max")).await.unwrap();
        let body: serde_json::Value = serde_json::from_str(&mock.requests()[2].body).unwrap();
        assert_eq!(body["user_name"], "Max");
    }

    #[tokio::test]
    async fn test_unit_management_roundtrip() {
        let unit = json!({"id": "L-9", "name": "Nine", "size_m2": 2.0, "device_id": "d-9",
                          "allow_hourly": true, "allow_daily": true, "allow_monthly": false});
        let mock = MockBackend::start().await;
        mock.on_json("POST", "/boxes/", 201, unit.clone());
        mock.on_json("PATCH", "/boxes/L-9", 200, unit);
        let session = Session::in_memory();
        session.set_credential("tok").unwrap();
        let client = mock.client(session);

        let created = client
            .create_unit(&UnitDraft::new("L-9", "Nine", 2.0, "d-9"))
            .await
            .unwrap();
        assert_eq!(created.id, "L-9");

        let patch = UnitPatch {
            allow_hourly: Some(true),
            ..Default::default()
        };
        client.update_unit("L-9", &patch).await.unwrap();
        assert_eq!(mock.requests()[1].body, r#"{"allow_hourly":true}"#);
    }
}
