use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Travel classes offered on Indian Railways routes. Closed set; stored and
/// serialized under the customary labels ("3AC", not "ThreeAc").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TravelClass {
    Sleeper,
    #[serde(rename = "3AC")]
    ThreeAc,
    #[serde(rename = "2AC")]
    TwoAc,
    #[serde(rename = "1AC")]
    OneAc,
    General,
}

impl TravelClass {
    pub const ALL: [TravelClass; 5] = [
        TravelClass::Sleeper,
        TravelClass::ThreeAc,
        TravelClass::TwoAc,
        TravelClass::OneAc,
        TravelClass::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelClass::Sleeper => "Sleeper",
            TravelClass::ThreeAc => "3AC",
            TravelClass::TwoAc => "2AC",
            TravelClass::OneAc => "1AC",
            TravelClass::General => "General",
        }
    }
}

impl fmt::Display for TravelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelClass {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Sleeper" => Ok(TravelClass::Sleeper),
            "3AC" => Ok(TravelClass::ThreeAc),
            "2AC" => Ok(TravelClass::TwoAc),
            "1AC" => Ok(TravelClass::OneAc),
            "General" => Ok(TravelClass::General),
            other => Err(CatalogError::UnknownClass(other.to_string())),
        }
    }
}

/// One endpoint of a route: where the train starts or terminates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteEndpoint {
    pub state: String,
    pub district: String,
    pub station: String,
}

/// Per-class fare and seat inventory on a train. `seats_available` is the
/// shared mutable counter the reservation service decrements and restores;
/// it never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRow {
    pub class: TravelClass,
    pub price: i64,
    pub seats_available: i32,
}

/// A route/schedule record with its per-class inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Train {
    pub id: Uuid,
    pub number: String,
    pub name: String,
    pub from: RouteEndpoint,
    pub to: RouteEndpoint,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration: String,
    pub distance_km: i32,
    pub classes: Vec<ClassRow>,
    pub days: Vec<Weekday>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Train {
    /// The class row for `class`, if this train offers it.
    pub fn class_row(&self, class: TravelClass) -> Option<&ClassRow> {
        self.classes.iter().find(|row| row.class == class)
    }

    /// Whether the train runs on `day`.
    pub fn runs_on(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    /// Retire the train. Bookings keep resolving their denormalized
    /// snapshots, so the record is never removed outright.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Train not found: {0}")]
    NotFound(String),

    #[error("Unknown travel class: {0}")]
    UnknownClass(String),

    #[error("Duplicate train number: {0}")]
    DuplicateNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

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
            classes: vec![
                ClassRow {
                    class: TravelClass::ThreeAc,
                    price: 1500,
                    seats_available: 80,
                },
                ClassRow {
                    class: TravelClass::OneAc,
                    price: 4500,
                    seats_available: 20,
                },
            ],
            days: vec![Weekday::Mon, Weekday::Thu],
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn class_labels_round_trip() {
        for class in TravelClass::ALL {
            assert_eq!(class.as_str().parse::<TravelClass>().unwrap(), class);
        }
        assert!("3ac".parse::<TravelClass>().is_err());
        assert_eq!(
            serde_json::to_string(&TravelClass::ThreeAc).unwrap(),
            "\"3AC\""
        );
    }

    #[test]
    fn class_row_lookup() {
        let train = sample_train();
        assert_eq!(train.class_row(TravelClass::ThreeAc).unwrap().price, 1500);
        assert!(train.class_row(TravelClass::General).is_none());
    }

    #[test]
    fn deactivate_is_soft() {
        let mut train = sample_train();
        train.deactivate();
        assert!(!train.is_active);
        // The schedule data survives retirement.
        assert_eq!(train.number, "12951");
    }

    #[test]
    fn runs_on_checks_days() {
        let train = sample_train();
        assert!(train.runs_on(Weekday::Mon));
        assert!(!train.runs_on(Weekday::Sun));
    }
}
