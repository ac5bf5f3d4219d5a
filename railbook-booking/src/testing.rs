//! Fixture builders shared by the unit tests in this crate.

use crate::models::{Booking, Gender, Passenger};
use chrono::{NaiveDate, TimeZone, Utc, Weekday};
use railbook_catalog::{ClassRow, RouteEndpoint, Train, TravelClass};
use uuid::Uuid;

pub(crate) fn sample_train(classes: &[(TravelClass, i64, i32)]) -> Train {
    let departure = Utc.with_ymd_and_hms(2025, 6, 2, 8, 30, 0).unwrap();
    Train {
        id: Uuid::new_v4(),
        number: format!("1{:04}", rand_suffix()),
        name: "Mumbai Rajdhani".to_string(),
        from: RouteEndpoint {
            state: "Maharashtra".to_string(),
            district: "Mumbai".to_string(),
            station: "Mumbai Central".to_string(),
        },
        to: RouteEndpoint {
            state: "Delhi".to_string(),
            district: "New Delhi".to_string(),
            station: "New Delhi".to_string(),
        },
        departure_time: departure,
        arrival_time: departure + chrono::Duration::hours(16),
        duration: "16h 0m".to_string(),
        distance_km: 1384,
        classes: classes
            .iter()
            .map(|&(class, price, seats_available)| ClassRow {
                class,
                price,
                seats_available,
            })
            .collect(),
        days: vec![Weekday::Mon, Weekday::Thu],
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn passengers(count: usize) -> Vec<Passenger> {
    (0..count)
        .map(|i| Passenger {
            name: format!("Passenger {i}"),
            age: 30,
            gender: Gender::Other,
            seat_number: None,
        })
        .collect()
}

pub(crate) fn booking_on(
    train: &Train,
    class: TravelClass,
    price: i64,
    seats: usize,
    pnr: &str,
) -> Booking {
    Booking::confirmed(
        Uuid::new_v4(),
        train,
        class,
        price,
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        passengers(seats),
        pnr.to_string(),
    )
}

fn rand_suffix() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};
    static NEXT: AtomicU32 = AtomicU32::new(2951);
    NEXT.fetch_add(1, Ordering::Relaxed)
}
