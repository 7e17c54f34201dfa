use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::engine::route_ledger::DELETED_PLACEHOLDER;
use crate::models::dashboard::{DailyOrderCount, DashboardSummary, DriverPerformance};
use crate::models::driver::Driver;
use crate::models::order::Order;

pub const RECENT_WINDOW_DAYS: u64 = 7;
pub const DEFAULT_LEADERBOARD_SIZE: usize = 5;

/// Order counts for the seven UTC days ending at `reference_date`, oldest first.
/// Days without orders report 0; orders outside the window are ignored.
pub fn recent_order_counts(orders: &[Order], reference_date: NaiveDate) -> Vec<DailyOrderCount> {
    let first_day = reference_date
        .checked_sub_days(Days::new(RECENT_WINDOW_DAYS - 1))
        .unwrap_or(NaiveDate::MIN);

    let mut counts = [0u64; RECENT_WINDOW_DAYS as usize];
    for order in orders {
        let day = order.created_at.date_naive();
        if day < first_day || day > reference_date {
            continue;
        }
        let offset = (day - first_day).num_days() as usize;
        if let Some(slot) = counts.get_mut(offset) {
            *slot += 1;
        }
    }

    counts
        .iter()
        .enumerate()
        .filter_map(|(offset, &count)| {
            first_day
                .checked_add_days(Days::new(offset as u64))
                .map(|date| DailyOrderCount { date, count })
        })
        .collect()
}

/// Drivers ranked by number of orders assigned to them, busiest first.
/// Equal counts keep the order of `drivers`. Orders whose driver no longer
/// exists are ranked under [`DELETED_PLACEHOLDER`], one row per missing
/// driver, after the live drivers they tie with.
pub fn top_drivers(drivers: &[Driver], orders: &[Order], limit: usize) -> Vec<DriverPerformance> {
    let mut per_driver: HashMap<Uuid, u64> = HashMap::new();
    let mut first_seen: Vec<Uuid> = Vec::new();
    for driver_id in orders.iter().filter_map(|order| order.driver_id) {
        let count = per_driver.entry(driver_id).or_insert_with(|| {
            first_seen.push(driver_id);
            0
        });
        *count += 1;
    }

    let mut ranking: Vec<DriverPerformance> = drivers
        .iter()
        .map(|driver| DriverPerformance {
            driver_name: driver.name.clone(),
            completed_orders: per_driver.remove(&driver.id).unwrap_or(0),
        })
        .collect();

    // whatever is left was assigned to a driver that has since been deleted
    ranking.extend(first_seen.into_iter().filter_map(|driver_id| {
        per_driver
            .get(&driver_id)
            .map(|&completed_orders| DriverPerformance {
                driver_name: DELETED_PLACEHOLDER.to_string(),
                completed_orders,
            })
    }));

    // stable sort: ties stay in input order
    ranking.sort_by(|a, b| b.completed_orders.cmp(&a.completed_orders));
    ranking.truncate(limit);
    ranking
}

pub fn summarize(
    drivers: &[Driver],
    orders: &[Order],
    total_routes: usize,
    reference_date: NaiveDate,
    leaderboard_size: usize,
) -> DashboardSummary {
    DashboardSummary {
        total_orders: orders.len(),
        total_drivers: drivers.len(),
        total_routes,
        recent_orders: recent_order_counts(orders, reference_date),
        driver_performance: top_drivers(drivers, orders, leaderboard_size),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    use super::{recent_order_counts, summarize, top_drivers};
    use crate::engine::route_ledger::DELETED_PLACEHOLDER;
    use crate::models::driver::{Driver, DriverStatus};
    use crate::models::order::Order;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn at(date: NaiveDate, hour: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_hms_opt(hour, 30, 0).unwrap())
    }

    fn days_before(n: u64) -> NaiveDate {
        reference().checked_sub_days(Days::new(n)).unwrap()
    }

    fn order(seed: u128, created_at: DateTime<Utc>, driver_id: Option<Uuid>) -> Order {
        Order {
            id: Uuid::from_u128(seed),
            customer_name: format!("customer-{seed}"),
            driver_id,
            created_at,
        }
    }

    fn driver(seed: u128, name: &str) -> Driver {
        let created = at(reference(), 0);
        Driver {
            id: Uuid::from_u128(seed),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "9000000000".to_string(),
            vehicle_type: "bike".to_string(),
            status: DriverStatus::Active,
            online_time: 0.0,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn seven_days_oldest_first_with_gaps_filled() {
        let orders = vec![
            order(1, at(days_before(6), 8), None),
            order(2, at(days_before(6), 23), None),
            order(3, at(days_before(3), 12), None),
        ];

        let series = recent_order_counts(&orders, reference());

        assert_eq!(series.len(), 7);
        let expected_dates: Vec<NaiveDate> = (0..7).rev().map(days_before).collect();
        let dates: Vec<NaiveDate> = series.iter().map(|day| day.date).collect();
        assert_eq!(dates, expected_dates);

        let counts: Vec<u64> = series.iter().map(|day| day.count).collect();
        assert_eq!(counts, vec![2, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn orders_outside_the_window_are_ignored() {
        let tomorrow = reference().succ_opt().unwrap();
        let orders = vec![
            order(1, at(days_before(7), 12), None),
            order(2, at(tomorrow, 1), None),
            order(3, at(reference(), 23), None),
        ];

        let counts: Vec<u64> = recent_order_counts(&orders, reference())
            .iter()
            .map(|day| day.count)
            .collect();
        assert_eq!(counts, vec![0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn grouping_uses_utc_days() {
        // 23:30 at UTC-5 on the 19th is already the 20th in UTC
        let offset = chrono::FixedOffset::west_opt(5 * 3600).unwrap();
        let late_evening = offset
            .with_ymd_and_hms(2024, 5, 19, 23, 30, 0)
            .unwrap()
            .with_timezone(&Utc);

        let series = recent_order_counts(&[order(1, late_evening, None)], reference());
        assert_eq!(series[6].count, 1);
        assert_eq!(series[5].count, 0);
    }

    fn assigned(driver_id: Uuid, how_many: u128, seed_base: u128) -> Vec<Order> {
        (0..how_many)
            .map(|i| order(seed_base + i, at(reference(), 9), Some(driver_id)))
            .collect()
    }

    #[test]
    fn ties_keep_driver_list_order() {
        let a = driver(1, "A");
        let b = driver(2, "B");
        let c = driver(3, "C");

        let mut orders = assigned(a.id, 5, 100);
        orders.extend(assigned(b.id, 5, 200));
        orders.extend(assigned(c.id, 2, 300));

        let drivers = vec![b.clone(), a.clone(), c.clone()];

        let names = |limit| -> Vec<String> {
            top_drivers(&drivers, &orders, limit)
                .into_iter()
                .map(|row| row.driver_name)
                .collect()
        };

        assert_eq!(names(3), vec!["B", "A", "C"]);
        assert_eq!(names(5), vec!["B", "A", "C"]);
        assert_eq!(names(2), vec!["B", "A"]);

        let board = top_drivers(&drivers, &orders, 3);
        assert_eq!(board[0].completed_orders, 5);
        assert_eq!(board[2].completed_orders, 2);
    }

    #[test]
    fn leaderboard_includes_idle_drivers_and_skips_unassigned_orders() {
        let busy = driver(1, "Busy");
        let idle = driver(2, "Idle");
        let mut orders = assigned(busy.id, 1, 10);
        orders.push(order(99, at(reference(), 10), None));

        let board = top_drivers(&[idle, busy], &orders, 5);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].driver_name, "Busy");
        assert_eq!(board[0].completed_orders, 1);
        assert_eq!(board[1].driver_name, "Idle");
        assert_eq!(board[1].completed_orders, 0);
    }

    #[test]
    fn orders_of_deleted_drivers_are_reported_as_deleted() {
        let live = driver(1, "Live");
        let mut orders = assigned(live.id, 2, 10);
        orders.extend(assigned(Uuid::from_u128(404), 3, 20));
        orders.extend(assigned(Uuid::from_u128(405), 2, 30));

        let board = top_drivers(&[live], &orders, 5);
        let rows: Vec<(&str, u64)> = board
            .iter()
            .map(|row| (row.driver_name.as_str(), row.completed_orders))
            .collect();
        assert_eq!(
            rows,
            vec![
                (DELETED_PLACEHOLDER, 3),
                ("Live", 2),
                (DELETED_PLACEHOLDER, 2),
            ]
        );
    }

    #[test]
    fn summary_counts_everything() {
        let a = driver(1, "A");
        let orders = assigned(a.id, 3, 10);

        let summary = summarize(&[a], &orders, 2, reference(), 5);
        assert_eq!(summary.total_orders, 3);
        assert_eq!(summary.total_drivers, 1);
        assert_eq!(summary.total_routes, 2);
        assert_eq!(summary.recent_orders[6].count, 3);
        assert_eq!(summary.driver_performance[0].completed_orders, 3);
    }
}
