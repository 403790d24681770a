//! Bookings
//!
//! A booking reserves one unit for a bounded window. Its active/expired status
//! is never stored: it is a function of the booking and an instant, so callers
//! always pass `now` in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::time::flexible;
use super::unit::PricingMode;

/// Shown while the lock system has not issued a code yet
pub const ACCESS_CODE_PENDING: &str = "not yet available";

/// Customer view of a booking
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Booking {
    pub id: String,
    pub user_name: String,
    pub box_id: String,
    #[serde(default)]
    pub box_name: Option<String>,
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(with = "flexible")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible")]
    pub valid_until: DateTime<Utc>,

    #[serde(default)]
    pub pricing_mode: Option<PricingMode>,
    #[serde(default)]
    pub unit_label: Option<String>,
    #[serde(default)]
    pub billed_units: Option<u32>,
    #[serde(default)]
    pub price_for_period: Option<f64>,
}

/// Admin view of a booking
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdminBooking {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(default)]
    pub user_email: Option<String>,
    /// Explicit status from the backend; takes precedence over `valid_until`
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Derived status of a booking at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Active,
    Expired,
}

impl BookingStatus {
    pub fn from_active(active: bool) -> Self {
        if active {
            BookingStatus::Active
        } else {
            BookingStatus::Expired
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Active => "active",
            BookingStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Booking {
    /// Active while `now < valid_until`
    pub fn status_at(&self, now: DateTime<Utc>) -> BookingStatus {
        BookingStatus::from_active(now < self.valid_until)
    }

    /// The access code, or a placeholder until one is issued
    pub fn access_code_display(&self) -> &str {
        self.access_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .unwrap_or(ACCESS_CODE_PENDING)
    }

    pub fn has_access_code(&self) -> bool {
        self.access_code_display() != ACCESS_CODE_PENDING
    }

    /// Box name when known, otherwise the box id
    pub fn unit_display(&self) -> &str {
        self.box_name.as_deref().unwrap_or(&self.box_id)
    }
}

impl AdminBooking {
    /// `is_active` when the backend sent it, otherwise derived from `valid_until`
    pub fn status_at(&self, now: DateTime<Utc>) -> BookingStatus {
        match self.is_active {
            Some(active) => BookingStatus::from_active(active),
            None => self.booking.status_at(now),
        }
    }

    pub fn id(&self) -> &str {
        &self.booking.id
    }
}

impl From<Booking> for AdminBooking {
    fn from(booking: Booking) -> Self {
        Self {
            booking,
            user_email: None,
            is_active: None,
            user_id: None,
            device_id: None,
        }
    }
}
