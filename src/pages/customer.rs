//! Customer pages: availability search and own bookings

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{failure_message, MountGuard, Refreshable, MSG_BOOKING_NOT_FOUND, MSG_UNIT_NOT_FOUND};
use crate::client::{BoxClient, ClientResult};
use crate::models::{Booking, CurrentUser, Unit};

#[derive(Debug, Default)]
struct AvailabilityState {
    units: Vec<Unit>,
    start_offset_minutes: u32,
    duration_minutes: u32,
    last_booking: Option<Booking>,
    message: Option<String>,
}

/// Search free units and book one
pub struct BookingPage {
    client: BoxClient,
    user: Option<CurrentUser>,
    guard: MountGuard,
    state: RwLock<AvailabilityState>,
}

impl BookingPage {
    /// `user` provides the default display name for new bookings
    pub fn new(client: BoxClient, user: Option<CurrentUser>) -> Self {
        Self {
            client,
            user,
            guard: MountGuard::new(),
            state: RwLock::new(AvailabilityState::default()),
        }
    }

    pub fn unmount(&self) {
        self.guard.unmount();
    }

    /// Units free for `duration_minutes` starting `start_offset_minutes` from now
    pub async fn search(&self, start_offset_minutes: u32, duration_minutes: u32) -> ClientResult<()> {
        let result = self
            .client
            .fetch_available_units(start_offset_minutes, duration_minutes)
            .await;

        let mut state = self.state.write().await;
        if !self.guard.is_mounted() {
            return result.map(|_| ());
        }

        match result {
            Ok(units) => {
                tracing::debug!(count = units.len(), "Available units loaded");
                state.units = units;
                state.start_offset_minutes = start_offset_minutes;
                state.duration_minutes = duration_minutes;
                state.message = None;
                Ok(())
            }
            Err(e) => {
                state.message = Some(failure_message(&e, MSG_UNIT_NOT_FOUND));
                Err(e)
            }
        }
    }

    /// Book `unit_id` for the logged-in customer.
    ///
    /// Without an explicit `display_name` the current user's name is used.
    /// The booked unit leaves the availability list.
    pub async fn book(
        &self,
        unit_id: &str,
        duration_minutes: u32,
        display_name: Option<&str>,
    ) -> ClientResult<Booking> {
        let display_name = display_name.or_else(|| self.user.as_ref().map(CurrentUser::display_name));
        let result = self
            .client
            .create_own_booking(unit_id, duration_minutes, display_name)
            .await;

        let mut state = self.state.write().await;
        if !self.guard.is_mounted() {
            return result;
        }

        match result {
            Ok(booking) => {
                state.units.retain(|u| u.id != unit_id);
                state.last_booking = Some(booking.clone());
                state.message = None;
                Ok(booking)
            }
            Err(e) => {
                state.message = Some(failure_message(&e, MSG_UNIT_NOT_FOUND));
                Err(e)
            }
        }
    }

    pub async fn units(&self) -> Vec<Unit> {
        self.state.read().await.units.clone()
    }

    /// Start offset and duration of the last successful search
    pub async fn window(&self) -> (u32, u32) {
        let state = self.state.read().await;
        (state.start_offset_minutes, state.duration_minutes)
    }

    pub async fn last_booking(&self) -> Option<Booking> {
        self.state.read().await.last_booking.clone()
    }

    pub async fn message(&self) -> Option<String> {
        self.state.read().await.message.clone()
    }
}

#[derive(Debug, Default)]
struct OwnBookingsState {
    bookings: Vec<Booking>,
    message: Option<String>,
}

/// Bookings of the logged-in customer
pub struct MyBookingsPage {
    client: BoxClient,
    active_only: bool,
    guard: MountGuard,
    state: RwLock<OwnBookingsState>,
}

impl MyBookingsPage {
    pub fn new(client: BoxClient, active_only: bool) -> Self {
        Self {
            client,
            active_only,
            guard: MountGuard::new(),
            state: RwLock::new(OwnBookingsState::default()),
        }
    }

    pub fn unmount(&self) {
        self.guard.unmount();
    }

    pub async fn load(&self) -> ClientResult<()> {
        let filter = self.active_only.then_some(true);
        let result = self.client.list_own_bookings(filter).await;

        let mut state = self.state.write().await;
        if !self.guard.is_mounted() {
            return result.map(|_| ());
        }

        match result {
            Ok(bookings) => {
                state.bookings = bookings;
                state.message = None;
                Ok(())
            }
            Err(e) => {
                state.message = Some(failure_message(&e, MSG_BOOKING_NOT_FOUND));
                Err(e)
            }
        }
    }

    pub async fn bookings(&self) -> Vec<Booking> {
        self.state.read().await.bookings.clone()
    }

    pub async fn message(&self) -> Option<String> {
        self.state.read().await.message.clone()
    }
}

#[async_trait]
impl Refreshable for MyBookingsPage {
    fn name(&self) -> &'static str {
        "my-bookings"
    }

    fn guard(&self) -> &MountGuard {
        &self.guard
    }

    async fn refresh(&self) {
        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "Own bookings refresh failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockBackend;
    use crate::client::ClientError;
    use crate::session::Session;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn unit_json(id: &str) -> serde_json::Value {
        json!({
            "id": id, "name": "Small", "size_m2": 1.5, "pricing_mode": "hourly",
            "unit_label": "hour", "billed_units": 2, "price_for_period": 3.0
        })
    }

    fn booking_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "user_name": "Ann",
            "box_id": "L-1",
            "access_code": null,
            "created_at": "2025-04-01T10:00:00",
            "valid_until": "2025-04-01T12:00:00"
        })
    }

    fn customer() -> CurrentUser {
        CurrentUser {
            id: "u1".to_string(),
            email: "ann@example.com".to_string(),
            full_name: Some("Ann Example".to_string()),
            is_active: true,
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_search_works_anonymously() {
        let mock = MockBackend::start().await;
        mock.on_json("GET", "/boxes/available", 200, json!([unit_json("L-1"), unit_json("L-2")]));
        let page = BookingPage::new(mock.client(Session::in_memory()), None);

        page.search(0, 120).await.unwrap();
        assert_eq!(page.units().await.len(), 2);
        assert_eq!(page.window().await, (0, 120));
        assert!(mock.requests()[0].authorization.is_none());
    }

    #[tokio::test]
    async fn test_book_without_session_is_local_failure() {
        let mock = MockBackend::start().await;
        let page = BookingPage::new(mock.client(Session::in_memory()), None);

        let err = page.book("L-1", 60, None).await.unwrap_err();
        assert!(matches!(err, ClientError::AuthRequired));
        assert_eq!(page.message().await.as_deref(), Some("not logged in"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_book_defaults_display_name() {
        let mock = MockBackend::start().await;
        mock.on_json("GET", "/boxes/available", 200, json!([unit_json("L-1"), unit_json("L-2")]));
        mock.on_json("POST", "/bookings/me", 200, booking_json("B-1"));
        let session = Session::in_memory();
        session.set_credential("tok").unwrap();
        let page = BookingPage::new(mock.client(session), Some(customer()));
        page.search(0, 60).await.unwrap();

        let booking = page.book("L-1", 60, None).await.unwrap();
        assert_eq!(booking.access_code_display(), "not yet available");

        let body: serde_json::Value = serde_json::from_str(&mock.requests()[1].body).unwrap();
        assert_eq!(body["user_name"], "Ann Example");
        assert_eq!(body["box_id"], "L-1");

        let remaining: Vec<String> = page.units().await.into_iter().map(|u| u.id).collect();
        assert_eq!(remaining, vec!["L-2"]);
        assert_eq!(page.last_booking().await.map(|b| b.id).as_deref(), Some("B-1"));
    }

    #[tokio::test]
    async fn test_book_without_known_user_fetches_name() {
        let mock = MockBackend::start().await;
        mock.on_json("GET", "/auth/me", 200, json!({"id": "u1", "email": "ann@example.com"}));
        mock.on_json("POST", "/bookings/me", 200, booking_json("B-2"));
        let session = Session::in_memory();
        session.set_credential("tok").unwrap();
        let page = BookingPage::new(mock.client(session), None);

        page.book("L-1", 60, None).await.unwrap();
        let post = mock
            .requests()
            .into_iter()
            .find(|r| r.method == "POST")
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&post.body).unwrap();
        assert_eq!(body["user_name"], "ann@example.com");
    }

    #[tokio::test]
    async fn test_my_bookings_unmount_while_locked() {
        let mock = MockBackend::start().await;
        mock.on_json("GET", "/bookings/me", 200, json!([booking_json("B-1")]));
        let session = Session::in_memory();
        session.set_credential("tok").unwrap();
        let page = Arc::new(MyBookingsPage::new(mock.client(session), false));

        let reader = page.state.read().await;
        let loading = {
            let page = Arc::clone(&page);
            tokio::spawn(async move { page.load().await })
        };
        tokio::time::sleep(Duration::from_millis(200)).await;
        page.unmount();
        drop(reader);

        loading.await.unwrap().unwrap();
        assert!(page.bookings().await.is_empty());
    }

    #[tokio::test]
    async fn test_my_bookings_active_only_query() {
        let mock = MockBackend::start().await;
        mock.on_json("GET", "/bookings/me", 200, json!([booking_json("B-1")]));
        let session = Session::in_memory();
        session.set_credential("tok").unwrap();
        let page = MyBookingsPage::new(mock.client(session), true);

        page.load().await.unwrap();
        assert_eq!(page.bookings().await.len(), 1);
        assert_eq!(mock.requests()[0].query.as_deref(), Some("active_only=true"));
    }

    #[tokio::test]
    async fn test_my_bookings_discards_late_result() {
        let mock = MockBackend::start().await;
        mock.on_json_delayed("GET", "/bookings/me", 200, json!([booking_json("B-1")]), Duration::from_millis(200));
        let session = Session::in_memory();
        session.set_credential("tok").unwrap();
        let page = Arc::new(MyBookingsPage::new(mock.client(session), false));

        let loading = {
            let page = Arc::clone(&page);
            tokio::spawn(async move { page.load().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        page.unmount();

        loading.await.unwrap().unwrap();
        assert!(page.bookings().await.is_empty());
    }
}
