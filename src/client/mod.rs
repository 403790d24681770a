//! Booking Backend Client
//!
//! Typed access to the booking portal's REST API.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /auth/login` - Exchange email/password for a bearer token
//! - `POST /auth/register` - Create an account (API key protected)
//! - `GET /auth/me` - Current user
//!
//! ## Units
//! - `GET /boxes/available` - Free units priced for a period (public)
//! - `GET /boxes/` / `POST /boxes/` - Admin list/create
//! - `PATCH /boxes/{id}` / `DELETE /boxes/{id}` - Admin update/delete
//! - `GET /boxes/status` - Admin occupancy overview
//!
//! ## Bookings
//! - `GET /bookings/me` / `POST /bookings/me` - Own bookings
//! - `GET /bookings/` / `POST /bookings/` - Admin list/create for customer
//! - `DELETE /bookings/{id}` - Admin cancel

mod api;
mod dto;
mod error;

#[cfg(test)]
pub(crate) mod mock;

pub use api::BoxClient;
pub use dto::BookingQuery;
pub use error::{truncate_body, ClientError, ClientResult, FailureKind};
