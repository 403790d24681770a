//! Derived-View Engine
//!
//! Pure functions of `(bookings, parameters, now)` behind the admin dashboard:
//! filtering, stable sorting, KPI aggregation and CSV export. Nothing here
//! touches the network or caches a status.

mod export;
mod filter;
mod kpi;
mod sort;

pub use export::{export_csv, export_filename, write_csv_file, ExportError, ExportResult, CSV_COLUMNS};
pub use filter::{BookingFilter, StatusFilter};
pub use kpi::DashboardKpis;
pub use sort::{compare, sort_bookings, SortDirection, SortKey, SortSpec};

use chrono::{DateTime, TimeZone, Utc};

use crate::models::AdminBooking;

/// Filter and sort selected on the dashboard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewParams {
    pub filter: BookingFilter,
    pub sort: SortSpec,
}

/// Filtered and sorted rows plus KPIs over the unfiltered list
#[derive(Debug, Clone)]
pub struct DashboardView<'a> {
    pub rows: Vec<&'a AdminBooking>,
    pub kpis: DashboardKpis,
    now: DateTime<Utc>,
}

impl<'a> DashboardView<'a> {
    pub fn build<Tz: TimeZone>(all: &'a [AdminBooking], params: &ViewParams, now: &DateTime<Tz>) -> Self {
        let instant = now.with_timezone(&Utc);
        let mut rows = params.filter.apply(all, instant);
        sort_bookings(&mut rows, params.sort);

        Self {
            rows,
            kpis: DashboardKpis::compute(all, now),
            now: instant,
        }
    }

    /// Export exactly the visible rows
    pub fn to_csv(&self) -> ExportResult<String> {
        export_csv(&self.rows, self.now)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
