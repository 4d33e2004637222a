use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned event identifier
pub type EventId = i64;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventStatus {
    #[default]
    Ongoing,
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ongoing => "Ongoing",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown event status: {other}")),
        }
    }
}

/// An event as returned by the events API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub location: String,
    #[serde(with = "calendar_date")]
    pub start_date: NaiveDate,
    #[serde(with = "calendar_date")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}

/// Payload for creating an event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    pub location: String,
    #[serde(with = "calendar_date")]
    pub start_date: NaiveDate,
    #[serde(with = "calendar_date")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}

impl EventDraft {
    /// New draft with the default status and no poster
    pub fn new(
        title: impl Into<String>,
        location: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            title: title.into(),
            location: location.into(),
            start_date,
            end_date,
            status: EventStatus::default(),
            poster_url: None,
        }
    }

    #[must_use]
    pub fn with_poster_url(mut self, url: impl Into<String>) -> Self {
        self.poster_url = Some(url.into());
        self
    }
}

/// Partial update for an existing event. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "calendar_date::option")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "calendar_date::option")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}

impl EventPatch {
    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Calendar dates travel as `YYYY-MM-DD`. Servers that store timestamps
/// send RFC 3339 strings instead; those are truncated to their date part.
pub mod calendar_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn parse(value: &str) -> Result<NaiveDate, String> {
        let value = value.trim();
        NaiveDate::parse_from_str(value, FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
            .map_err(|_| format!("invalid date '{value}', expected YYYY-MM-DD"))
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::parse(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn event_accepts_plain_and_timestamp_dates() {
        let event: Event = serde_json::from_value(json!({
            "id": 7,
            "title": "Launch",
            "location": "Hall A",
            "startDate": "2025-03-01",
            "endDate": "2025-03-02T00:00:00.000Z",
            "status": "Completed",
            "posterUrl": "https://cdn.example.com/p.png"
        }))
        .unwrap();

        assert_eq!(event.start_date, date(2025, 3, 1));
        assert_eq!(event.end_date, date(2025, 3, 2));
        assert_eq!(event.status, EventStatus::Completed);
    }

    #[test]
    fn event_without_status_defaults_to_ongoing() {
        let event: Event = serde_json::from_value(json!({
            "id": 1,
            "title": "Meetup",
            "location": "Online",
            "startDate": "2025-01-10",
            "endDate": "2025-01-10"
        }))
        .unwrap();

        assert_eq!(event.status, EventStatus::Ongoing);
        assert!(event.poster_url.is_none());
    }

    #[test]
    fn draft_serializes_dates_as_calendar_days() {
        let draft = EventDraft::new("Launch", "Hall A", date(2025, 3, 1), date(2025, 3, 2));
        let value = serde_json::to_value(&draft).unwrap();

        assert_eq!(value["startDate"], "2025-03-01");
        assert_eq!(value["endDate"], "2025-03-02");
        assert_eq!(value["status"], "Ongoing");
        assert!(value.get("posterUrl").is_none());
    }

    #[test]
    fn patch_only_serializes_present_fields() {
        let patch = EventPatch {
            status: Some(EventStatus::Completed),
            end_date: Some(date(2025, 4, 1)),
            ..EventPatch::default()
        };

        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "endDate": "2025-04-01", "status": "Completed" })
        );
        assert!(!patch.is_empty());
        assert!(EventPatch::default().is_empty());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("ongoing".parse::<EventStatus>(), Ok(EventStatus::Ongoing));
        assert_eq!("Completed".parse::<EventStatus>(), Ok(EventStatus::Completed));
        assert!("cancelled".parse::<EventStatus>().is_err());
    }

    #[test]
    fn invalid_dates_are_rejected() {
        assert!(calendar_date::parse("03/01/2025").is_err());
        assert!(calendar_date::parse("2025-02-30").is_err());
    }
}
