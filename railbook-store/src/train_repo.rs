use async_trait::async_trait;
use chrono::{DateTime, Utc};
use railbook_catalog::{ClassRow, RouteEndpoint, Train, TrainRepository, TravelClass};
use railbook_core::search::{parse_weekday, weekday_name, TrainSearchQuery};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

pub struct PgTrainRepository {
    pool: PgPool,
}

impl PgTrainRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_classes(
        &self,
        train_id: Uuid,
    ) -> Result<Vec<ClassRow>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<ClassRowRec> = sqlx::query_as(
            "SELECT class_name, price, seats_available FROM train_classes WHERE train_id = $1 ORDER BY class_name",
        )
        .bind(train_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| row.into_class_row()).collect()
    }

    async fn assemble(
        &self,
        row: TrainRow,
    ) -> Result<Train, Box<dyn std::error::Error + Send + Sync>> {
        let classes = self.load_classes(row.id).await?;
        row.into_train(classes)
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct TrainRow {
    id: Uuid,
    number: String,
    name: String,
    from_state: String,
    from_district: String,
    from_station: String,
    to_state: String,
    to_district: String,
    to_station: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    duration: String,
    distance_km: i32,
    days: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ClassRowRec {
    class_name: String,
    price: i64,
    seats_available: i32,
}

impl ClassRowRec {
    fn into_class_row(self) -> Result<ClassRow, Box<dyn std::error::Error + Send + Sync>> {
        Ok(ClassRow {
            class: self.class_name.parse::<TravelClass>()?,
            price: self.price,
            seats_available: self.seats_available,
        })
    }
}

impl TrainRow {
    fn into_train(
        self,
        classes: Vec<ClassRow>,
    ) -> Result<Train, Box<dyn std::error::Error + Send + Sync>> {
        let days = self
            .days
            .iter()
            .map(|name| {
                parse_weekday(name).ok_or_else(|| format!("Invalid running day: {name}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Train {
            id: self.id,
            number: self.number,
            name: self.name,
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
            duration: self.duration,
            distance_km: self.distance_km,
            classes,
            days,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const TRAIN_COLUMNS: &str = "id, number, name, from_state, from_district, from_station, \
     to_state, to_district, to_station, departure_time, arrival_time, duration, \
     distance_km, days, is_active, created_at, updated_at";

#[async_trait]
impl TrainRepository for PgTrainRepository {
    async fn create_train(
        &self,
        train: &Train,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let days: Vec<String> = train
            .days
            .iter()
            .map(|&d| weekday_name(d).to_string())
            .collect();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO trains (id, number, name, from_state, from_district, from_station,
                                to_state, to_district, to_station, departure_time, arrival_time,
                                duration, distance_km, days, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(train.id)
        .bind(&train.number)
        .bind(&train.name)
        .bind(&train.from.state)
        .bind(&train.from.district)
        .bind(&train.from.station)
        .bind(&train.to.state)
        .bind(&train.to.district)
        .bind(&train.to.station)
        .bind(train.departure_time)
        .bind(train.arrival_time)
        .bind(&train.duration)
        .bind(train.distance_km)
        .bind(&days)
        .bind(train.is_active)
        .bind(train.created_at)
        .bind(train.updated_at)
        .execute(&mut *tx)
        .await?;

        for row in &train.classes {
            sqlx::query(
                "INSERT INTO train_classes (train_id, class_name, price, seats_available) VALUES ($1, $2, $3, $4)",
            )
            .bind(train.id)
            .bind(row.class.as_str())
            .bind(row.price)
            .bind(row.seats_available)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_train(
        &self,
        id: Uuid,
    ) -> Result<Option<Train>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<TrainRow> =
            sqlx::query_as(&format!("SELECT {TRAIN_COLUMNS} FROM trains WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_active(
        &self,
    ) -> Result<Vec<Train>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<TrainRow> = sqlx::query_as(&format!(
            "SELECT {TRAIN_COLUMNS} FROM trains WHERE is_active = TRUE ORDER BY number"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut trains = Vec::with_capacity(rows.len());
        for row in rows {
            trains.push(self.assemble(row).await?);
        }
        Ok(trains)
    }

    async fn search_trains(
        &self,
        query: &TrainSearchQuery,
    ) -> Result<Vec<Train>, Box<dyn std::error::Error + Send + Sync>> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {TRAIN_COLUMNS} FROM trains WHERE is_active = TRUE"
        ));

        if let Some(state) = &query.from_state {
            qb.push(" AND from_state = ").push_bind(state);
        }
        if let Some(district) = &query.from_district {
            qb.push(" AND from_district = ").push_bind(district);
        }
        if let Some(state) = &query.to_state {
            qb.push(" AND to_state = ").push_bind(state);
        }
        if let Some(district) = &query.to_district {
            qb.push(" AND to_district = ").push_bind(district);
        }
        if let Some(day) = query.running_day() {
            qb.push(" AND ").push_bind(weekday_name(day)).push(" = ANY(days)");
        }
        qb.push(" ORDER BY number");

        let rows: Vec<TrainRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut trains = Vec::with_capacity(rows.len());
        for row in rows {
            trains.push(self.assemble(row).await?);
        }
        Ok(trains)
    }

    async fn update_train(
        &self,
        train: &Train,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let days: Vec<String> = train
            .days
            .iter()
            .map(|&d| weekday_name(d).to_string())
            .collect();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE trains
            SET number = $2, name = $3, from_state = $4, from_district = $5, from_station = $6,
                to_state = $7, to_district = $8, to_station = $9, departure_time = $10,
                arrival_time = $11, duration = $12, distance_km = $13, days = $14,
                is_active = $15, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(train.id)
        .bind(&train.number)
        .bind(&train.name)
        .bind(&train.from.state)
        .bind(&train.from.district)
        .bind(&train.from.station)
        .bind(&train.to.state)
        .bind(&train.to.district)
        .bind(&train.to.station)
        .bind(train.departure_time)
        .bind(train.arrival_time)
        .bind(&train.duration)
        .bind(train.distance_km)
        .bind(&days)
        .bind(train.is_active)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        // Class rows are replaced wholesale; seat counts come with them.
        sqlx::query("DELETE FROM train_classes WHERE train_id = $1")
            .bind(train.id)
            .execute(&mut *tx)
            .await?;

        for row in &train.classes {
            sqlx::query(
                "INSERT INTO train_classes (train_id, class_name, price, seats_available) VALUES ($1, $2, $3, $4)",
            )
            .bind(train.id)
            .bind(row.class.as_str())
            .bind(row.price)
            .bind(row.seats_available)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn deactivate_train(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let result =
            sqlx::query("UPDATE trains SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
