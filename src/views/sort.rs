//! Booking sort
//!
//! One active key at a time. The sort is stable in both directions: rows that
//! compare equal keep their input order.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::models::AdminBooking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    ValidUntil,
    Unit,
    Customer,
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Key plus direction; defaults to newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Selecting the active key again flips the direction; a new key starts ascending
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            Self::new(key, self.direction.reversed())
        } else {
            Self::new(key, SortDirection::Asc)
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "created" | "created_at" => Ok(SortKey::CreatedAt),
            "valid_until" | "expires" | "expiry" => Ok(SortKey::ValidUntil),
            "unit" | "box" => Ok(SortKey::Unit),
            "customer" | "user" => Ok(SortKey::Customer),
            "price" => Ok(SortKey::Price),
            other => Err(format!(
                "unknown sort key: {} (created, expires, unit, customer, price)",
                other
            )),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction: {} (asc, desc)", other)),
        }
    }
}

/// Compare two bookings by a single key, ascending
pub fn compare(a: &AdminBooking, b: &AdminBooking, key: SortKey) -> Ordering {
    let (a, b) = (&a.booking, &b.booking);
    match key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::ValidUntil => a.valid_until.cmp(&b.valid_until),
        SortKey::Unit => cmp_ignore_case(a.unit_display(), b.unit_display()),
        SortKey::Customer => cmp_ignore_case(&a.user_name, &b.user_name),
        // Bookings without a price sort lowest
        SortKey::Price => a
            .price_for_period
            .unwrap_or(f64::NEG_INFINITY)
            .total_cmp(&b.price_for_period.unwrap_or(f64::NEG_INFINITY)),
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Stable in-place sort
pub fn sort_bookings(rows: &mut [&AdminBooking], spec: SortSpec) {
    rows.sort_by(|a, b| {
        let ordering = compare(a, b, spec.key);
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}
