//! # Boxbook
//!
//! Client for a storage-box booking portal: customers look up free units and
//! book them, admins manage units and every booking.
//!
//! ## Features
//!
//! - **Typed API client**: one method per backend operation, bearer auth from a pluggable session store
//! - **Role-aware routing**: admin pages render only after the backend confirmed the role
//! - **Dashboard views**: filtering, stable sorting, KPIs and CSV export as pure functions
//! - **Page controllers**: concurrent loads, inline failure messages, auto-refresh
//!
//! ## Modules
//!
//! - [`session`]: Credential persistence
//! - [`client`]: REST client for the booking backend
//! - [`views`]: Derived dashboard views
//! - [`router`]: Route table and access decisions
//! - [`pages`]: Page controllers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use boxbook::{ApiConfig, BoxClient, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BoxClient::new(
//!         &ApiConfig::with_base_url("https://boxes.example.com"),
//!         Session::in_memory(),
//!     )?;
//!
//!     // Public: no login needed
//!     let units = client.fetch_available_units(0, 120).await?;
//!     println!("{} units free for the next two hours", units.len());
//!
//!     client.login("ann@example.com", "secret").await?;
//!     let booking = client.create_own_booking(&units[0].id, 120, None).await?;
//!     println!("Access code: {}", booking.access_code_display());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod models;
pub mod pages;
pub mod router;
pub mod session;
pub mod views;

// Re-export top-level types for convenience
pub use client::{BookingQuery, BoxClient, ClientError, ClientResult, FailureKind};

pub use config::{ApiConfig, Config, ConfigError};

pub use models::{
    AdminBooking, AdminUnit, Booking, BookingStatus, CurrentUser, PricingMode, Role, Unit,
    UnitDraft, UnitOccupancy, UnitPatch,
};

pub use session::{FileSessionStore, MemorySessionStore, Session, SessionError, SessionStore};

pub use views::{
    BookingFilter, DashboardKpis, DashboardView, ExportError, SortDirection, SortKey, SortSpec,
    StatusFilter, ViewParams,
};

pub use router::{decide, AuthState, Navigation, Navigator, Route};

pub use pages::{
    spawn_auto_refresh, AdminDashboard, AdminUnitsPage, BookingPage, MountGuard, MyBookingsPage,
    Refreshable,
};
