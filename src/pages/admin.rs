//! Admin booking dashboard

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::RwLock;

use super::{failure_message, MountGuard, Refreshable, MSG_BOOKING_NOT_FOUND, MSG_UNIT_NOT_FOUND};
use crate::client::{BookingQuery, BoxClient, ClientResult};
use crate::models::{AdminBooking, AdminUnit};
use crate::views::{DashboardView, ExportResult, ViewParams};

#[derive(Debug, Default)]
struct DashboardState {
    bookings: Vec<AdminBooking>,
    units: Vec<AdminUnit>,
    message: Option<String>,
    loaded_at: Option<DateTime<Utc>>,
}

/// All bookings plus the unit list used by the "book for customer" form
pub struct AdminDashboard {
    client: BoxClient,
    guard: MountGuard,
    state: RwLock<DashboardState>,
}

impl AdminDashboard {
    pub fn new(client: BoxClient) -> Self {
        Self {
            client,
            guard: MountGuard::new(),
            state: RwLock::new(DashboardState::default()),
        }
    }

    pub fn unmount(&self) {
        self.guard.unmount();
    }

    /// Fetch bookings and units concurrently.
    ///
    /// Each list is replaced only when its own request succeeded.
    pub async fn load(&self) -> ClientResult<()> {
        let query = BookingQuery::all();
        let (bookings, units) = tokio::join!(
            self.client.list_all_bookings(&query),
            self.client.list_units()
        );

        let mut state = self.state.write().await;
        if !self.guard.is_mounted() {
            tracing::debug!("Dashboard unmounted, discarding load result");
            return Ok(());
        }

        state.message = None;

        let units_result = match units {
            Ok(units) => {
                state.units = units;
                Ok(())
            }
            Err(e) => {
                state.message = Some(failure_message(&e, MSG_UNIT_NOT_FOUND));
                Err(e)
            }
        };

        match bookings {
            Ok(bookings) => {
                tracing::debug!(count = bookings.len(), "Dashboard bookings loaded");
                state.bookings = bookings;
                state.loaded_at = Some(Utc::now());
                units_result
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load bookings");
                state.message = Some(failure_message(&e, MSG_BOOKING_NOT_FOUND));
                Err(e)
            }
        }
    }

    /// Cancel a booking; it leaves the list only once the backend confirmed
    pub async fn cancel(&self, booking_id: &str) -> ClientResult<()> {
        let result = self.client.cancel_booking(booking_id).await;

        let mut state = self.state.write().await;
        if !self.guard.is_mounted() {
            return result;
        }

        match result {
            Ok(()) => {
                state.bookings.retain(|b| b.id() != booking_id);
                state.message = Some(format!("booking {} cancelled", booking_id));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(booking_id = %booking_id, error = %e, "Cancel failed");
                state.message = Some(failure_message(&e, MSG_BOOKING_NOT_FOUND));
                Err(e)
            }
        }
    }

    /// Book a unit for a customer and append the result to the list
    pub async fn create_for_customer(
        &self,
        customer_email: &str,
        unit_id: &str,
        duration_minutes: u32,
        display_name: Option<&str>,
    ) -> ClientResult<AdminBooking> {
        let result = self
            .client
            .create_booking_for_customer(customer_email, unit_id, duration_minutes, display_name)
            .await;

        let mut state = self.state.write().await;
        if !self.guard.is_mounted() {
            return result;
        }

        match result {
            Ok(booking) => {
                state.bookings.push(booking.clone());
                state.message = None;
                Ok(booking)
            }
            Err(e) => {
                state.message = Some(failure_message(&e, "unit or customer not found"));
                Err(e)
            }
        }
    }

    pub async fn bookings(&self) -> Vec<AdminBooking> {
        self.state.read().await.bookings.clone()
    }

    pub async fn units(&self) -> Vec<AdminUnit> {
        self.state.read().await.units.clone()
    }

    pub async fn message(&self) -> Option<String> {
        self.state.read().await.message.clone()
    }

    pub async fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.loaded_at
    }

    /// Build the current view and hand it to `render`
    pub async fn with_view<Tz, R>(
        &self,
        params: &ViewParams,
        now: &DateTime<Tz>,
        render: impl FnOnce(&DashboardView<'_>) -> R,
    ) -> R
    where
        Tz: TimeZone,
    {
        let state = self.state.read().await;
        let view = DashboardView::build(&state.bookings, params, now);
        render(&view)
    }

    /// CSV of the rows currently matching `params`
    pub async fn export_csv(&self, params: &ViewParams, now: DateTime<Utc>) -> ExportResult<String> {
        self.with_view(params, &now, |view| view.to_csv()).await
    }
}

#[async_trait]
impl Refreshable for AdminDashboard {
    fn name(&self) -> &'static str {
        "admin-dashboard"
    }

    fn guard(&self) -> &MountGuard {
        &self.guard
    }

    async fn refresh(&self) {
        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "Dashboard refresh failed");
        }
    }
}
