//! Domain Types
//!
//! DTOs received from the booking backend. The client treats them as
//! immutable; only page controllers hold lists of them, and only for as long
//! as the page is mounted.

mod booking;
pub mod time;
mod unit;
mod user;

pub use booking::{AdminBooking, Booking, BookingStatus, ACCESS_CODE_PENDING};
pub use unit::{
    AdminUnit, Occupancy, OccupyingBooking, PricingMode, Unit, UnitDraft, UnitOccupancy,
    UnitPatch,
};
pub use user::{CurrentUser, Role};
