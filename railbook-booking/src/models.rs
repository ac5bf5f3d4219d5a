use chrono::{DateTime, NaiveDate, Utc};
use railbook_catalog::{RouteEndpoint, Train, TravelClass};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking status. Transitions only move forward; Cancelled is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Confirmed,
    Waitlisted,
    Cancelled,
}

/// Payment status. The payment integration is an always-succeeding stub, so
/// the service books straight to Completed; Pending and Failed remain part
/// of the persisted vocabulary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub seat_number: Option<String>,
}

/// Route and schedule fields copied from the train at booking time. The copy
/// is intentional: the ledger entry stays displayable even if the train is
/// later rescheduled or retired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainSnapshot {
    pub train_id: Uuid,
    pub train_number: String,
    pub train_name: String,
    pub from: RouteEndpoint,
    pub to: RouteEndpoint,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
}

impl TrainSnapshot {
    pub fn of(train: &Train) -> Self {
        Self {
            train_id: train.id,
            train_number: train.number.clone(),
            train_name: train.name.clone(),
            from: train.from.clone(),
            to: train.to.clone(),
            departure_time: train.departure_time,
            arrival_time: train.arrival_time,
        }
    }
}

/// One purchase transaction in the ledger. Never physically deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub train: TrainSnapshot,
    pub journey_date: NaiveDate,
    pub passengers: Vec<Passenger>,
    pub class: TravelClass,
    pub total_fare: i64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub pnr: String,
    pub booked_at: DateTime<Utc>,
}

impl Booking {
    /// Assemble a confirmed ledger entry for `passengers` on `train`.
    /// `price` is the per-seat fare of the selected class; the total is
    /// price times the passenger count.
    pub fn confirmed(
        user_id: Uuid,
        train: &Train,
        class: TravelClass,
        price: i64,
        journey_date: NaiveDate,
        passengers: Vec<Passenger>,
        pnr: String,
    ) -> Self {
        let total_fare = price * passengers.len() as i64;
        Self {
            id: Uuid::new_v4(),
            user_id,
            train: TrainSnapshot::of(train),
            journey_date,
            passengers,
            class,
            total_fare,
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::Completed,
            pnr,
            booked_at: Utc::now(),
        }
    }

    /// Seats this booking holds against its class row.
    pub fn seat_count(&self) -> i32 {
        self.passengers.len() as i32
    }

    /// Flip to Cancelled. Returns false if the booking was already
    /// cancelled, in which case nothing changes.
    pub fn cancel(&mut self) -> bool {
        if self.status == BookingStatus::Cancelled {
            return false;
        }
        self.status = BookingStatus::Cancelled;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use railbook_catalog::ClassRow;

    fn sample_train() -> Train {
        let departure = Utc.with_ymd_and_hms(2025, 6, 2, 8, 30, 0).unwrap();
        Train {
            id: Uuid::new_v4(),
            number: "12951".to_string(),
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
            classes: vec![ClassRow {
                class: TravelClass::ThreeAc,
                price: 1500,
                seats_available: 80,
            }],
            days: vec![chrono::Weekday::Mon],
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn passengers(n: usize) -> Vec<Passenger> {
        (0..n)
            .map(|i| Passenger {
                name: format!("Passenger {i}"),
                age: 30,
                gender: Gender::Other,
                seat_number: None,
            })
            .collect()
    }

    #[test]
    fn fare_is_price_times_passengers() {
        let train = sample_train();
        let booking = Booking::confirmed(
            Uuid::new_v4(),
            &train,
            TravelClass::ThreeAc,
            1500,
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            passengers(2),
            "1234567890".to_string(),
        );
        assert_eq!(booking.total_fare, 3000);
        assert_eq!(booking.seat_count(), 2);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_status, PaymentStatus::Completed);
    }

    #[test]
    fn snapshot_survives_train_changes() {
        let mut train = sample_train();
        let booking = Booking::confirmed(
            Uuid::new_v4(),
            &train,
            TravelClass::ThreeAc,
            1500,
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            passengers(1),
            "1234567890".to_string(),
        );
        train.name = "Renamed Express".to_string();
        train.deactivate();
        assert_eq!(booking.train.train_name, "Mumbai Rajdhani");
        assert_eq!(booking.train.train_number, "12951");
    }

    #[test]
    fn cancel_only_once() {
        let train = sample_train();
        let mut booking = Booking::confirmed(
            Uuid::new_v4(),
            &train,
            TravelClass::ThreeAc,
            1500,
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            passengers(1),
            "1234567890".to_string(),
        );
        assert!(booking.cancel());
        assert!(!booking.cancel());
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }

    #[test]
    fn status_serializes_under_plain_labels() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::Confirmed).unwrap(),
            "\"Confirmed\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Completed).unwrap(),
            "\"Completed\""
        );
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"Female\"");
    }
}
