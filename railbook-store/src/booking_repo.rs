use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use railbook_booking::models::{Booking, BookingStatus, Passenger, PaymentStatus, TrainSnapshot};
use railbook_booking::repository::{BookingRepository, CommitOutcome, ReleaseOutcome};
use railbook_catalog::{RouteEndpoint, TravelClass};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    train_id: Uuid,
    train_number: String,
    train_name: String,
    journey_date: NaiveDate,
    class_name: String,
    from_state: String,
    from_district: String,
    from_station: String,
    to_state: String,
    to_district: String,
    to_station: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    passengers: serde_json::Value,
    total_fare: i64,
    status: String,
    payment_status: String,
    pnr: String,
    booked_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, Box<dyn std::error::Error + Send + Sync>> {
        let passengers: Vec<Passenger> = serde_json::from_value(self.passengers)?;
        Ok(Booking {
            id: self.id,
            user_id: self.user_id,
            train: TrainSnapshot {
                train_id: self.train_id,
                train_number: self.train_number,
                train_name: self.train_name,
                from: RouteEndpoint {
                    state: self.from_state,
                    district: self.from_district,
                    station: self.from_station,
                },
                to: RouteEndpoint {
                    state: self.to_state,
                    district: self.to_district,
                    station: self.to_station,
                },
                departure_time: self.departure_time,
                arrival_time: self.arrival_time,
            },
            journey_date: self.journey_date,
            passengers,
            class: self.class_name.parse::<TravelClass>()?,
            total_fare: self.total_fare,
            status: parse_status(&self.status)?,
            payment_status: parse_payment_status(&self.payment_status)?,
            pnr: self.pnr,
            booked_at: self.booked_at,
        })
    }
}

fn status_label(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Confirmed => "Confirmed",
        BookingStatus::Waitlisted => "Waitlisted",
        BookingStatus::Cancelled => "Cancelled",
    }
}

fn parse_status(label: &str) -> Result<BookingStatus, Box<dyn std::error::Error + Send + Sync>> {
    match label {
        "Confirmed" => Ok(BookingStatus::Confirmed),
        "Waitlisted" => Ok(BookingStatus::Waitlisted),
        "Cancelled" => Ok(BookingStatus::Cancelled),
        other => Err(format!("Invalid booking status: {other}").into()),
    }
}

fn payment_label(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "Pending",
        PaymentStatus::Completed => "Completed",
        PaymentStatus::Failed => "Failed",
    }
}

fn parse_payment_status(
    label: &str,
) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>> {
    match label {
        "Pending" => Ok(PaymentStatus::Pending),
        "Completed" => Ok(PaymentStatus::Completed),
        "Failed" => Ok(PaymentStatus::Failed),
        other => Err(format!("Invalid payment status: {other}").into()),
    }
}

fn is_pnr_collision(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| {
            db.code().as_deref() == Some("23505")
                && db.constraint() == Some("bookings_pnr_key")
        })
        .unwrap_or(false)
}

const BOOKING_COLUMNS: &str = "id, user_id, train_id, train_number, train_name, journey_date, \
     class_name, from_state, from_district, from_station, to_state, to_district, to_station, \
     departure_time, arrival_time, passengers, total_fare, status, payment_status, pnr, booked_at";

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn commit_reservation(
        &self,
        booking: &Booking,
    ) -> Result<CommitOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let requested = booking.seat_count();
        let class_name = booking.class.as_str();
        let train_id = booking.train.train_id;

        let mut tx = self.pool.begin().await?;

        // The conditional decrement is the serialization point: two commits
        // racing on the same class row cannot both pass the seats_available
        // guard for seats that only one of them can have.
        let decrement = sqlx::query(
            r#"
            UPDATE train_classes
            SET seats_available = seats_available - $1
            WHERE train_id = $2 AND class_name = $3 AND seats_available >= $1
            "#,
        )
        .bind(requested)
        .bind(train_id)
        .bind(class_name)
        .execute(&mut *tx)
        .await?;

        if decrement.rows_affected() == 0 {
            let seats: Option<(i32,)> = sqlx::query_as(
                "SELECT seats_available FROM train_classes WHERE train_id = $1 AND class_name = $2",
            )
            .bind(train_id)
            .bind(class_name)
            .fetch_optional(&mut *tx)
            .await?;

            let outcome = match seats {
                Some((available,)) => CommitOutcome::InsufficientSeats { available },
                None => {
                    let train: Option<(Uuid,)> =
                        sqlx::query_as("SELECT id FROM trains WHERE id = $1")
                            .bind(train_id)
                            .fetch_optional(&mut *tx)
                            .await?;
                    if train.is_some() {
                        CommitOutcome::ClassMissing
                    } else {
                        CommitOutcome::TrainMissing
                    }
                }
            };
            tx.rollback().await?;
            return Ok(outcome);
        }

        let insert = sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, train_id, train_number, train_name, journey_date,
                                  class_name, from_state, from_district, from_station,
                                  to_state, to_district, to_station, departure_time, arrival_time,
                                  passengers, seat_count, total_fare, status, payment_status,
                                  pnr, booked_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21, $22)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(train_id)
        .bind(&booking.train.train_number)
        .bind(&booking.train.train_name)
        .bind(booking.journey_date)
        .bind(class_name)
        .bind(&booking.train.from.state)
        .bind(&booking.train.from.district)
        .bind(&booking.train.from.station)
        .bind(&booking.train.to.state)
        .bind(&booking.train.to.district)
        .bind(&booking.train.to.station)
        .bind(booking.train.departure_time)
        .bind(booking.train.arrival_time)
        .bind(serde_json::to_value(&booking.passengers)?)
        .bind(requested)
        .bind(booking.total_fare)
        .bind(status_label(booking.status))
        .bind(payment_label(booking.payment_status))
        .bind(&booking.pnr)
        .bind(booking.booked_at)
        .execute(&mut *tx)
        .await;

        match insert {
            Ok(_) => {
                tx.commit().await?;
                Ok(CommitOutcome::Committed)
            }
            Err(err) if is_pnr_collision(&err) => {
                tx.rollback().await?;
                Ok(CommitOutcome::DuplicatePnr)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn release_reservation(
        &self,
        booking_id: Uuid,
    ) -> Result<ReleaseOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut tx = self.pool.begin().await?;

        // Forward-only flip; a concurrent or earlier cancellation makes this
        // a no-op and the restoration never runs twice.
        let flipped: Option<(Uuid, String, i32)> = sqlx::query_as(
            r#"
            UPDATE bookings
            SET status = 'Cancelled'
            WHERE id = $1 AND status <> 'Cancelled'
            RETURNING train_id, class_name, seat_count
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((train_id, class_name, seat_count)) = flipped else {
            let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM bookings WHERE id = $1")
                .bind(booking_id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;
            return Ok(if exists.is_some() {
                ReleaseOutcome::AlreadyCancelled
            } else {
                ReleaseOutcome::NotFound
            });
        };

        // Zero rows here means the train or class row is gone; the
        // cancellation itself still stands.
        let restore = sqlx::query(
            r#"
            UPDATE train_classes
            SET seats_available = seats_available + $1
            WHERE train_id = $2 AND class_name = $3
            "#,
        )
        .bind(seat_count)
        .bind(train_id)
        .bind(&class_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ReleaseOutcome::Released {
            seats_restored: restore.rows_affected() > 0,
        })
    }

    async fn get_booking(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(BookingRow::into_booking).transpose()
    }

    async fn find_by_pnr(
        &self,
        pnr: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE pnr = $1"))
                .bind(pnr)
                .fetch_optional(&self.pool)
                .await?;
        row.map(BookingRow::into_booking).transpose()
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY booked_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn list_all(
        &self,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY booked_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(BookingRow::into_booking).collect()
    }
}
