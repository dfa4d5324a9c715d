//! Google Calendar API v3 Client
//!
//! Provides methods for interacting with Google Calendar API:
//! - List calendars
//! - List/get events
//! - Create/update/delete events
//!
//! Event times given as `YYYY-MM-DD` become all-day (`date`) values; anything
//! else is sent as `dateTime` with the caller's time zone.

use chrono::{NaiveDate, SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::{GoogleClient, GoogleError};
use super::common::{extract_array, segment};

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

pub const DEFAULT_TIME_ZONE: &str = "UTC";

/// Fields to set on an event. `None` leaves the field untouched on update.
#[derive(Debug, Clone, Default)]
pub struct EventFields<'a> {
    pub summary: Option<&'a str>,
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub attendees: Option<&'a [String]>,
}

impl EventFields<'_> {
    /// Write the set fields onto `event`.
    fn apply(&self, event: &mut Value, time_zone: &str) {
        if let Some(summary) = self.summary {
            event["summary"] = json!(summary);
        }
        if let Some(start) = self.start {
            event["start"] = event_time(start, time_zone);
        }
        if let Some(end) = self.end {
            event["end"] = event_time(end, time_zone);
        }
        if let Some(description) = self.description {
            event["description"] = json!(description);
        }
        if let Some(location) = self.location {
            event["location"] = json!(location);
        }
        if let Some(attendees) = self.attendees {
            event["attendees"] = attendees.iter().map(|email| json!({ "email": email })).collect();
        }
    }
}

pub struct CalendarApi {
    client: GoogleClient,
}

super::google_api_wrapper!(CalendarApi, CALENDAR_API_BASE);

impl CalendarApi {
    /// List all calendars for the authenticated user
    ///
    /// # Returns
    /// Array of calendar list entries (id, summary, description, timeZone, primary)
    pub async fn list_calendars(&self) -> Result<Vec<Value>, GoogleError> {
        info!("Listing Google calendars");

        let response = self.client.get("/users/me/calendarList", &[]).await?;
        let calendars = extract_array(&response, "items");

        debug!("Retrieved {} calendars", calendars.len());
        Ok(calendars)
    }

    /// List upcoming events in a calendar, recurring events expanded
    ///
    /// # Arguments
    /// * `calendar_id` - Calendar ID (use "primary" for user's primary calendar)
    /// * `time_min` - Lower bound (RFC3339); defaults to now
    /// * `time_max` - Upper bound (RFC3339)
    /// * `max_results` - Page size
    pub async fn list_events(
        &self,
        calendar_id: &str,
        time_min: Option<&str>,
        time_max: Option<&str>,
        max_results: u32,
    ) -> Result<Vec<Value>, GoogleError> {
        info!("Listing events for calendar: {}", calendar_id);

        let params = list_events_query(time_min, time_max, max_results);
        let path = format!("/calendars/{}/events", segment(calendar_id));
        let response = self.client.get(&path, &params).await?;
        let events = extract_array(&response, "items");

        debug!("Retrieved {} events", events.len());
        Ok(events)
    }

    /// Get a specific event by ID
    pub async fn get_event(&self, calendar_id: &str, event_id: &str) -> Result<Value, GoogleError> {
        info!("Fetching event: {} from calendar: {}", event_id, calendar_id);
        self.client.get(&event_path(calendar_id, event_id), &[]).await
    }

    /// Create a new event
    ///
    /// # Returns
    /// Created event object with generated ID
    pub async fn create_event(
        &self,
        calendar_id: &str,
        fields: &EventFields<'_>,
        time_zone: &str,
    ) -> Result<Value, GoogleError> {
        info!("Creating event {:?} in calendar: {}", fields.summary, calendar_id);

        let mut event = json!({});
        fields.apply(&mut event, time_zone);

        let path = format!("/calendars/{}/events", segment(calendar_id));
        let response = self.client.post(&path, &[], &event).await?;

        info!("Event created successfully");
        Ok(response)
    }

    /// Update an existing event: read it, overlay `fields`, write it back.
    pub async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        fields: &EventFields<'_>,
        time_zone: &str,
    ) -> Result<Value, GoogleError> {
        info!("Updating event: {} in calendar: {}", event_id, calendar_id);

        let mut event = self.get_event(calendar_id, event_id).await?;
        fields.apply(&mut event, time_zone);

        let response = self
            .client
            .put(&event_path(calendar_id, event_id), &[], &event)
            .await?;

        info!("Event updated successfully");
        Ok(response)
    }

    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<Value, GoogleError> {
        info!("Deleting event: {} from calendar: {}", event_id, calendar_id);
        self.client.delete(&event_path(calendar_id, event_id)).await
    }
}

/// Query for an event listing; `timeMin` defaults to now.
fn list_events_query(
    time_min: Option<&str>,
    time_max: Option<&str>,
    max_results: u32,
) -> Vec<(&'static str, String)> {
    let time_min = time_min
        .map(str::to_string)
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

    let mut params = vec![
        ("timeMin", time_min),
        ("maxResults", max_results.to_string()),
        ("singleEvents", "true".to_string()),
        ("orderBy", "startTime".to_string()),
    ];
    if let Some(max) = time_max {
        params.push(("timeMax", max.to_string()));
    }
    params
}

fn event_path(calendar_id: &str, event_id: &str) -> String {
    format!(
        "/calendars/{}/events/{}",
        segment(calendar_id),
        segment(event_id)
    )
}

/// Calendar `EventDateTime` for a user-supplied time string.
pub fn event_time(value: &str, time_zone: &str) -> Value {
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        json!({ "date": value })
    } else {
        json!({ "dateTime": value, "timeZone": time_zone })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::client::tests::StaticToken;
    use httpmock::prelude::*;
    use std::sync::Arc;

    fn api(server: &MockServer) -> CalendarApi {
        CalendarApi::with_base_url(
            reqwest::Client::new(),
            Arc::new(StaticToken("t")),
            &server.base_url(),
        )
    }

    #[test]
    fn test_event_time_with_timestamp() {
        assert_eq!(
            event_time("2026-02-08T15:00:00", "Europe/Dublin"),
            json!({"dateTime": "2026-02-08T15:00:00", "timeZone": "Europe/Dublin"})
        );
    }

    #[test]
    fn test_event_time_with_date_only() {
        assert_eq!(event_time("2026-02-08", "UTC"), json!({"date": "2026-02-08"}));
    }

    #[test]
    fn test_default_time_min_is_now() {
        let params = list_events_query(None, None, 10);
        let time_min = params
            .iter()
            .find(|(key, _)| *key == "timeMin")
            .map(|(_, value)| value.as_str())
            .unwrap();
        let parsed = chrono::DateTime::parse_from_rfc3339(time_min).unwrap();
        let drift = Utc::now().signed_duration_since(parsed).num_seconds().abs();
        assert!(drift <= 5, "timeMin {} is {}s away from now", time_min, drift);
        assert!(params.iter().all(|(key, _)| *key != "timeMax"));
    }

    #[test]
    fn test_explicit_bounds_are_passed_through() {
        let params = list_events_query(Some("2026-01-01T00:00:00Z"), Some("2026-02-01T00:00:00Z"), 3);
        assert!(params.contains(&("timeMin", "2026-01-01T00:00:00Z".to_string())));
        assert!(params.contains(&("timeMax", "2026-02-01T00:00:00Z".to_string())));
        assert!(params.contains(&("maxResults", "3".to_string())));
    }

    #[tokio::test]
    async fn test_list_events_defaults_lower_bound_to_now() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/calendars/primary/events")
                    .query_param_exists("timeMin")
                    .query_param("singleEvents", "true")
                    .query_param("orderBy", "startTime")
                    .query_param("maxResults", "4");
                then.status(200).json_body(json!({"items": [{"id": "e1"}]}));
            })
            .await;

        let events = api(&server).list_events("primary", None, None, 4).await.unwrap();
        mock.assert_async().await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_update_overlays_fields_on_fetched_event() {
        let server = MockServer::start_async().await;
        let read = server
            .mock_async(|when, then| {
                when.method(GET).path("/calendars/primary/events/e1");
                then.status(200).json_body(json!({
                    "id": "e1",
                    "summary": "Old",
                    "location": "Room 1",
                    "start": {"dateTime": "2026-01-01T09:00:00Z"},
                    "end": {"dateTime": "2026-01-01T10:00:00Z"}
                }));
            })
            .await;
        let write = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/calendars/primary/events/e1")
                    .body_contains("\"summary\":\"New\"")
                    .body_contains("\"location\":\"Room 1\"");
                then.status(200).json_body(json!({"id": "e1", "summary": "New"}));
            })
            .await;

        let fields = EventFields {
            summary: Some("New"),
            ..Default::default()
        };
        let updated = api(&server)
            .update_event("primary", "e1", &fields, DEFAULT_TIME_ZONE)
            .await
            .unwrap();
        read.assert_async().await;
        write.assert_async().await;
        assert_eq!(updated["summary"], "New");
    }
}
