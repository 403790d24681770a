//! Dashboard KPIs
//!
//! Always computed over the full booking list, independent of the active
//! filter.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::AdminBooking;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DashboardKpis {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    /// Bookings created on the calendar day of `now`, in `now`'s time zone
    pub created_today: usize,
    /// Sum of `price_for_period` over active bookings
    pub active_revenue: f64,
}

impl DashboardKpis {
    pub fn compute<Tz: TimeZone>(all: &[AdminBooking], now: &DateTime<Tz>) -> Self {
        let instant: DateTime<Utc> = now.with_timezone(&Utc);
        let today = now.date_naive();
        let tz = now.timezone();

        let mut kpis = DashboardKpis {
            total: all.len(),
            ..Default::default()
        };

        for booking in all {
            if booking.status_at(instant).is_active() {
                kpis.active += 1;
                kpis.active_revenue += booking.booking.price_for_period.unwrap_or(0.0);
            }
            if booking.booking.created_at.with_timezone(&tz).date_naive() == today {
                kpis.created_today += 1;
            }
        }
        kpis.expired = kpis.total - kpis.active;

        kpis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::testing::admin_booking;
    use chrono::{Duration, FixedOffset};

    #[test]
    fn test_empty() {
        let kpis = DashboardKpis::compute(&[], &Utc::now());
        assert_eq!(kpis, DashboardKpis::default());
    }

    #[test]
    fn test_counts_and_revenue() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let mut a = admin_booking("a", now - Duration::hours(2), now + Duration::hours(1));
        a.booking.price_for_period = Some(12.5);
        let mut b = admin_booking("b", now - Duration::days(2), now + Duration::days(1));
        b.booking.price_for_period = Some(7.5);
        let mut c = admin_booking("c", now - Duration::days(3), now - Duration::days(1));
        c.booking.price_for_period = Some(100.0);
        let d = admin_booking("d", now - Duration::minutes(5), now + Duration::hours(4));

        let kpis = DashboardKpis::compute(&[a, b, c, d], &now);
        assert_eq!(kpis.total, 4);
        assert_eq!(kpis.active, 3);
        assert_eq!(kpis.expired, 1);
        assert_eq!(kpis.created_today, 2);
        assert!((kpis.active_revenue - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_created_today_uses_local_day() {
        // 23:30 UTC on May 9 is already May 10 at UTC+2
        let created = Utc.with_ymd_and_hms(2024, 5, 9, 23, 30, 0).unwrap();
        let list = vec![admin_booking("late", created, created + Duration::days(5))];

        let utc_now = Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap();
        assert_eq!(DashboardKpis::compute(&list, &utc_now).created_today, 0);

        let berlin = FixedOffset::east_opt(2 * 3600).unwrap();
        let local_now = utc_now.with_timezone(&berlin);
        assert_eq!(DashboardKpis::compute(&list, &local_now).created_today, 1);
    }
}
