//! Storage units ("boxes")
//!
//! Two shapes exist for the same unit: the customer shape returned by the
//! availability search (priced for the requested period) and the admin shape
//! with the static configuration. `id` joins them with each other and with
//! bookings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::time::flexible_option;

/// How a booking period is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingMode {
    Hourly,
    Daily,
    /// Blocks of 31 days
    Monthly,
}

impl PricingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingMode::Hourly => "hourly",
            PricingMode::Daily => "daily",
            PricingMode::Monthly => "monthly",
        }
    }
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer view of a free unit, priced for the queried period
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub size_m2: f64,
    pub pricing_mode: PricingMode,
    /// "hour", "day" or "month"
    pub unit_label: String,
    pub billed_units: u32,
    pub price_for_period: f64,
}

/// Admin view of a unit with its static configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdminUnit {
    pub id: String,
    pub name: String,
    pub size_m2: f64,
    #[serde(default)]
    pub device_id: String,

    #[serde(default)]
    pub price_per_m2_hour: Option<f64>,
    #[serde(default)]
    pub price_per_m2_day: Option<f64>,

    #[serde(default)]
    pub allow_hourly: bool,
    #[serde(default = "default_allow_daily")]
    pub allow_daily: bool,
    #[serde(default)]
    pub allow_monthly: bool,

    #[serde(default)]
    pub price_per_hour: Option<f64>,
    #[serde(default)]
    pub price_per_day: Option<f64>,
    #[serde(default)]
    pub price_per_31days: Option<f64>,
}

fn default_allow_daily() -> bool {
    true
}

impl AdminUnit {
    /// Billing modes this unit can be booked with
    pub fn allowed_modes(&self) -> Vec<PricingMode> {
        let mut modes = Vec::new();
        if self.allow_hourly {
            modes.push(PricingMode::Hourly);
        }
        if self.allow_daily {
            modes.push(PricingMode::Daily);
        }
        if self.allow_monthly {
            modes.push(PricingMode::Monthly);
        }
        modes
    }
}

/// Payload for `POST /boxes/`
#[derive(Debug, Clone, Serialize)]
pub struct UnitDraft {
    pub id: String,
    pub name: String,
    pub size_m2: f64,
    pub device_id: String,
    pub allow_hourly: bool,
    pub allow_daily: bool,
    pub allow_monthly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_hour: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_day: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_31days: Option<f64>,
}

impl UnitDraft {
    /// A daily-billed unit with backend default prices
    pub fn new(id: impl Into<String>, name: impl Into<String>, size_m2: f64, device_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size_m2,
            device_id: device_id.into(),
            allow_hourly: false,
            allow_daily: true,
            allow_monthly: false,
            price_per_hour: None,
            price_per_day: None,
            price_per_31days: None,
        }
    }

    /// At least one billing mode must be enabled
    pub fn has_billing_mode(&self) -> bool {
        self.allow_hourly || self.allow_daily || self.allow_monthly
    }
}

/// Payload for `PATCH /boxes/{id}`; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnitPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_m2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_hourly: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_daily: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_monthly: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_hour: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_day: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_31days: Option<f64>,
}

impl UnitPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.size_m2.is_none()
            && self.device_id.is_none()
            && self.allow_hourly.is_none()
            && self.allow_daily.is_none()
            && self.allow_monthly.is_none()
            && self.price_per_hour.is_none()
            && self.price_per_day.is_none()
            && self.price_per_31days.is_none()
    }
}

/// Row of `GET /boxes/status`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UnitOccupancy {
    pub box_id: String,
    pub name: String,
    pub size_m2: f64,
    #[serde(default)]
    pub device_id: String,
    pub status: Occupancy,
    #[serde(default, with = "flexible_option")]
    pub occupied_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_booking: Option<OccupyingBooking>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Occupancy {
    Free,
    Occupied,
}

/// The booking currently holding a unit
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OccupyingBooking {
    pub booking_id: String,
    pub user_name: String,
    #[serde(default, with = "flexible_option")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub access_code: Option<String>,
}
