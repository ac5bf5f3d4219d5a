use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Search criteria for trains. Every field is optional; empty criteria match
/// all active trains.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainSearchQuery {
    pub from_state: Option<String>,
    pub from_district: Option<String>,
    pub to_state: Option<String>,
    pub to_district: Option<String>,
    /// Journey date; narrowed to trains running on that weekday.
    pub date: Option<NaiveDate>,
}

impl TrainSearchQuery {
    /// The weekday a train must run on for this query, if a date was given.
    pub fn running_day(&self) -> Option<Weekday> {
        self.date.map(|d| d.weekday())
    }
}

/// Full English weekday name, the form the catalog persists and the API
/// accepts ("Monday", not "Mon").
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse a full English weekday name.
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "Monday" => Some(Weekday::Mon),
        "Tuesday" => Some(Weekday::Tue),
        "Wednesday" => Some(Weekday::Wed),
        "Thursday" => Some(Weekday::Thu),
        "Friday" => Some(Weekday::Fri),
        "Saturday" => Some(Weekday::Sat),
        "Sunday" => Some(Weekday::Sun),
        _ => None,
    }
}
