//! Page Controllers
//!
//! Each page owns the data it shows and a [`MountGuard`]. Results that arrive
//! after the page was unmounted are dropped; the guard is checked while
//! holding the page's write lock, so an unmount during the wait for the lock
//! still wins. A failed call never clears what was loaded before; it only
//! sets the page's inline message.

mod admin;
mod customer;
mod units;

pub use admin::AdminDashboard;
pub use customer::{BookingPage, MyBookingsPage};
pub use units::AdminUnitsPage;

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::client::{ClientError, FailureKind};

pub const MSG_NOT_LOGGED_IN: &str = "not logged in";
pub const MSG_FORBIDDEN: &str = "insufficient privilege";
pub const MSG_BOOKING_NOT_FOUND: &str = "booking not found";
pub const MSG_UNIT_NOT_FOUND: &str = "unit not found";

/// Shared "is this page still on screen" flag
#[derive(Debug, Clone)]
pub struct MountGuard(Arc<AtomicBool>);

impl MountGuard {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_mounted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for MountGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Inline message for a failed call; `not_found` names the missing entity
pub fn failure_message(error: &ClientError, not_found: &str) -> String {
    match error.kind() {
        FailureKind::Unauthorized => MSG_NOT_LOGGED_IN.to_string(),
        FailureKind::Forbidden => MSG_FORBIDDEN.to_string(),
        FailureKind::NotFound => not_found.to_string(),
        FailureKind::Other => {
            tracing::debug!(error = %error, "Request failed");
            match error {
                ClientError::Api { status, .. } => format!("request failed (HTTP {})", status),
                ClientError::Request(_) => "backend unreachable".to_string(),
                ClientError::Decode(_) => "unexpected response from backend".to_string(),
                ClientError::Config(_) | ClientError::Session(_) | ClientError::AuthRequired => {
                    error.to_string()
                }
            }
        }
    }
}

/// A page whose data can be reloaded in the background
#[async_trait]
pub trait Refreshable: Send + Sync + 'static {
    /// Page name for logging
    fn name(&self) -> &'static str;

    fn guard(&self) -> &MountGuard;

    /// Reload the page data; failures end up in the page message
    async fn refresh(&self);
}

/// Re-run `refresh` every `interval` until the page is unmounted.
///
/// Every tick runs in its own task, so a slow refresh may overlap the next.
pub fn spawn_auto_refresh<P: Refreshable>(page: Arc<P>, interval: Duration) -> JoinHandle<()> {
    tracing::info!(
        page = page.name(),
        interval_secs = interval.as_secs(),
        "Starting auto-refresh"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if !page.guard().is_mounted() {
                tracing::debug!(page = page.name(), "Page unmounted, stopping auto-refresh");
                break;
            }

            let page = Arc::clone(&page);
            tokio::spawn(async move {
                tracing::debug!(page = page.name(), "Auto-refresh tick");
                page.refresh().await;
            });
        }
    })
}
