//! Booking filters
//!
//! All predicates are AND-combined. Status is evaluated against the instant
//! passed in, never a cached value.

use chrono::{DateTime, Utc};
use std::str::FromStr;

use crate::models::{AdminBooking, BookingStatus};

/// Status selector of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Expired,
}

impl StatusFilter {
    pub fn matches(&self, status: BookingStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => status == BookingStatus::Active,
            StatusFilter::Expired => status == BookingStatus::Expired,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "expired" => Ok(StatusFilter::Expired),
            other => Err(format!("unknown status filter: {} (all, active, expired)", other)),
        }
    }
}

/// Client-side filter over an already fetched booking list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilter {
    /// Case-insensitive substring, whitespace included; all-blank matches everything
    pub search: String,
    pub status: StatusFilter,
    /// Inclusive lower bound on `created_at`
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub created_to: Option<DateTime<Utc>>,
}

impl BookingFilter {
    pub fn with_status(status: StatusFilter) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_search(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..Default::default()
        }
    }

    pub fn matches(&self, booking: &AdminBooking, now: DateTime<Utc>) -> bool {
        self.status.matches(booking.status_at(now))
            && self.matches_search(booking)
            && self.matches_created(booking)
    }

    /// Bookings passing the filter, in input order
    pub fn apply<'a>(&self, bookings: &'a [AdminBooking], now: DateTime<Utc>) -> Vec<&'a AdminBooking> {
        bookings.iter().filter(|b| self.matches(b, now)).collect()
    }

    fn matches_search(&self, booking: &AdminBooking) -> bool {
        if self.search.trim().is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();

        search_fields(booking)
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_created(&self, booking: &AdminBooking) -> bool {
        let created = booking.booking.created_at;
        self.created_from.map_or(true, |from| created >= from)
            && self.created_to.map_or(true, |to| created <= to)
    }
}

/// Customer name, customer email, unit id, unit name, access code
fn search_fields(booking: &AdminBooking) -> [Option<&str>; 5] {
    [
        Some(booking.booking.user_name.as_str()),
        booking.user_email.as_deref(),
        Some(booking.booking.box_id.as_str()),
        booking.booking.box_name.as_deref(),
        booking.booking.access_code.as_deref(),
    ]
}
