//! Google Calendar tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::{done, field};
use crate::common::{GoogleResultExt, ToolError, ToolResult};
use crate::google::calendar_api::{EventFields, DEFAULT_TIME_ZONE};
use crate::google::common::extract_array;
use crate::google::CalendarApi;
use crate::tools::args::{decode, default_max_results, lenient_u32};
use crate::tools::registry::{descriptor, ToolDescriptor};

fn primary() -> String {
    "primary".to_string()
}

fn utc() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListEventsArgs {
    #[serde(default = "default_max_results", deserialize_with = "lenient_u32")]
    pub max_results: u32,
    #[serde(default = "primary")]
    pub calendar_id: String,
    #[serde(default)]
    pub time_min: Option<String>,
    #[serde(default)]
    pub time_max: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventIdArgs {
    pub event_id: String,
    #[serde(default = "primary")]
    pub calendar_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEventArgs {
    pub summary: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Option<Vec<String>>,
    #[serde(default = "primary")]
    pub calendar_id: String,
    #[serde(default = "utc")]
    pub time_zone: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateEventArgs {
    pub event_id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "primary")]
    pub calendar_id: String,
    #[serde(default = "utc")]
    pub time_zone: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

#[derive(Debug)]
pub enum CalendarCall {
    ListEvents(ListEventsArgs),
    GetEvent(EventIdArgs),
    CreateEvent(CreateEventArgs),
    UpdateEvent(UpdateEventArgs),
    DeleteEvent(EventIdArgs),
    ListCalendars(NoArgs),
}

impl CalendarCall {
    pub fn parse(tool: &str, action: &str, args: Value) -> ToolResult<Self> {
        Ok(match action {
            "list_events" => Self::ListEvents(decode(tool, args)?),
            "get_event" => Self::GetEvent(decode(tool, args)?),
            "create_event" => Self::CreateEvent(decode(tool, args)?),
            "update_event" => Self::UpdateEvent(decode(tool, args)?),
            "delete_event" => Self::DeleteEvent(decode(tool, args)?),
            "list_calendars" => Self::ListCalendars(decode(tool, args)?),
            _ => return Err(ToolError::UnknownTool(tool.to_string())),
        })
    }

    pub async fn execute(self, calendar: &CalendarApi) -> ToolResult<Value> {
        match self {
            Self::ListEvents(args) => {
                let events = calendar
                    .list_events(
                        &args.calendar_id,
                        args.time_min.as_deref(),
                        args.time_max.as_deref(),
                        args.max_results,
                    )
                    .await
                    .context("Failed to list events")?;
                Ok(events
                    .iter()
                    .map(|event| {
                        json!({
                            "id": field(event, "id"),
                            "summary": summary_or_default(event),
                            "start": when(event, "start"),
                            "end": when(event, "end"),
                            "description": field(event, "description"),
                            "location": field(event, "location"),
                            "attendees": attendee_emails(event),
                            "htmlLink": field(event, "htmlLink"),
                        })
                    })
                    .collect())
            }
            Self::GetEvent(args) => {
                let event = calendar
                    .get_event(&args.calendar_id, &args.event_id)
                    .await
                    .context("Failed to get event")?;
                Ok(json!({
                    "success": true,
                    "id": field(&event, "id"),
                    "summary": field(&event, "summary"),
                    "description": field(&event, "description"),
                    "location": field(&event, "location"),
                    "start": object_or_empty(&event, "start"),
                    "end": object_or_empty(&event, "end"),
                    "attendees": extract_array(&event, "attendees"),
                    "htmlLink": field(&event, "htmlLink"),
                }))
            }
            Self::CreateEvent(args) => {
                let fields = EventFields {
                    summary: Some(&args.summary),
                    start: Some(&args.start_time),
                    end: Some(&args.end_time),
                    description: args.description.as_deref(),
                    location: args.location.as_deref(),
                    attendees: args.attendees.as_deref(),
                };
                let event = calendar
                    .create_event(&args.calendar_id, &fields, &args.time_zone)
                    .await
                    .context("Failed to create event")?;
                Ok(json!({
                    "success": true,
                    "event_id": field(&event, "id"),
                    "summary": field(&event, "summary"),
                    "start": when(&event, "start"),
                    "end": when(&event, "end"),
                    "htmlLink": field(&event, "htmlLink"),
                }))
            }
            Self::UpdateEvent(args) => {
                let fields = EventFields {
                    summary: args.summary.as_deref(),
                    start: args.start_time.as_deref(),
                    end: args.end_time.as_deref(),
                    description: args.description.as_deref(),
                    location: args.location.as_deref(),
                    attendees: None,
                };
                let event = calendar
                    .update_event(&args.calendar_id, &args.event_id, &fields, &args.time_zone)
                    .await
                    .context("Failed to update event")?;
                Ok(json!({
                    "success": true,
                    "event_id": field(&event, "id"),
                    "summary": field(&event, "summary"),
                    "htmlLink": field(&event, "htmlLink"),
                }))
            }
            Self::DeleteEvent(args) => {
                calendar
                    .delete_event(&args.calendar_id, &args.event_id)
                    .await
                    .context("Failed to delete event")?;
                Ok(done(format!("Event {} deleted", args.event_id)))
            }
            Self::ListCalendars(NoArgs {}) => {
                let calendars = calendar
                    .list_calendars()
                    .await
                    .context("Failed to list calendars")?;
                Ok(calendars
                    .iter()
                    .map(|cal| {
                        json!({
                            "id": field(cal, "id"),
                            "summary": field(cal, "summary"),
                            "description": field(cal, "description"),
                            "timeZone": field(cal, "timeZone"),
                            "primary": cal.get("primary").and_then(Value::as_bool).unwrap_or(false),
                        })
                    })
                    .collect())
            }
        }
    }
}

fn summary_or_default(event: &Value) -> Value {
    event
        .get("summary")
        .cloned()
        .unwrap_or_else(|| json!("No title"))
}

/// `dateTime` for timed events, `date` for all-day ones.
fn when(event: &Value, key: &str) -> Value {
    event
        .get(key)
        .and_then(|t| t.get("dateTime").or_else(|| t.get("date")))
        .cloned()
        .unwrap_or_else(|| json!(""))
}

/// The event's own time object (`dateTime` + `timeZone`, or `date`), kept whole.
fn object_or_empty(event: &Value, key: &str) -> Value {
    event.get(key).cloned().unwrap_or_else(|| json!({}))
}

fn attendee_emails(event: &Value) -> Value {
    extract_array(event, "attendees")
        .iter()
        .filter_map(|a| a.get("email").cloned())
        .collect()
}

pub fn descriptors() -> Vec<ToolDescriptor> {
    let calendar_id = json!({ "type": "string", "default": "primary" });
    let time = json!({
        "type": "string",
        "description": "RFC 3339 date-time (e.g. 2026-03-01T10:00:00) or YYYY-MM-DD for all-day"
    });
    let time_zone = json!({ "type": "string", "description": "IANA time zone", "default": "UTC" });
    let event_id = json!({ "type": "string" });
    vec![
        descriptor(
            "calendar_list_events",
            "List upcoming events, soonest first.",
            json!({
                "max_results": { "type": "integer", "default": 10 },
                "calendar_id": calendar_id.clone(),
                "time_min": { "type": "string", "description": "RFC 3339 lower bound; defaults to now" },
                "time_max": { "type": "string", "description": "RFC 3339 upper bound" }
            }),
            &[],
        ),
        descriptor(
            "calendar_get_event",
            "Get one calendar event.",
            json!({ "event_id": event_id.clone(), "calendar_id": calendar_id.clone() }),
            &["event_id"],
        ),
        descriptor(
            "calendar_create_event",
            "Create a calendar event.",
            json!({
                "summary": { "type": "string" },
                "start_time": time.clone(),
                "end_time": time.clone(),
                "description": { "type": "string" },
                "location": { "type": "string" },
                "attendees": { "type": "array", "items": { "type": "string" }, "description": "Attendee email addresses" },
                "calendar_id": calendar_id.clone(),
                "time_zone": time_zone.clone()
            }),
            &["summary", "start_time", "end_time"],
        ),
        descriptor(
            "calendar_update_event",
            "Change selected fields of an existing event.",
            json!({
                "event_id": event_id.clone(),
                "summary": { "type": "string" },
                "start_time": time.clone(),
                "end_time": time,
                "description": { "type": "string" },
                "location": { "type": "string" },
                "calendar_id": calendar_id.clone(),
                "time_zone": time_zone
            }),
            &["event_id"],
        ),
        descriptor(
            "calendar_delete_event",
            "Delete a calendar event.",
            json!({ "event_id": event_id, "calendar_id": calendar_id }),
            &["event_id"],
        ),
        descriptor(
            "calendar_list_calendars",
            "List the calendars in the user's calendar list.",
            json!({}),
            &[],
        ),
    ]
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
    fn event_shape_helpers() {
        let event = json!({
            "start": {"date": "2026-05-01"},
            "end": {"dateTime": "2026-05-02T10:00:00Z"},
            "attendees": [{"email": "a@x.io"}, {"displayName": "no email"}]
        });
        assert_eq!(when(&event, "start"), "2026-05-01");
        assert_eq!(when(&event, "end"), "2026-05-02T10:00:00Z");
        assert_eq!(when(&event, "missing"), "");
        assert_eq!(attendee_emails(&event), json!(["a@x.io"]));
        assert_eq!(summary_or_default(&event), "No title");
    }

    #[test]
    fn list_calendars_takes_no_arguments() {
        assert!(CalendarCall::parse("calendar_list_calendars", "list_calendars", Value::Null).is_ok());
        assert!(CalendarCall::parse(
            "calendar_list_calendars",
            "list_calendars",
            json!({"max_results": 3})
        )
        .is_err());
    }

    #[tokio::test]
    async fn get_event_keeps_time_zone_and_full_attendees() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/calendars/primary/events/ev1");
                then.status(200).json_body(json!({
                    "id": "ev1",
                    "start": {"dateTime": "2026-05-01T09:00:00", "timeZone": "Europe/Dublin"},
                    "end": {"dateTime": "2026-05-01T10:00:00", "timeZone": "Europe/Dublin"},
                    "attendees": [{"email": "a@x.io", "responseStatus": "accepted"}]
                }));
            })
            .await;

        let call =
            CalendarCall::parse("calendar_get_event", "get_event", json!({"event_id": "ev1"})).unwrap();
        let out = call.execute(&api(&server)).await.unwrap();
        mock.assert_async().await;
        assert_eq!(out["start"]["timeZone"], "Europe/Dublin");
        assert_eq!(out["end"]["dateTime"], "2026-05-01T10:00:00");
        assert_eq!(
            out["attendees"],
            json!([{"email": "a@x.io", "responseStatus": "accepted"}])
        );
        assert_eq!(out["summary"], "");
        assert_eq!(out["description"], "");
    }

    #[tokio::test]
    async fn create_event_builds_timed_and_all_day_times() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/calendars/primary/events")
                    .body_contains("\"start\":{\"dateTime\":\"2026-03-01T10:00:00\",\"timeZone\":\"Europe/Dublin\"}")
                    .body_contains("\"attendees\":[{\"email\":\"bob@example.com\"}]");
                then.status(200).json_body(json!({
                    "id": "ev1",
                    "summary": "Sync",
                    "start": {"dateTime": "2026-03-01T10:00:00Z"},
                    "end": {"dateTime": "2026-03-01T11:00:00Z"},
                    "htmlLink": "https://calendar.google.com/event?eid=ev1"
                }));
            })
            .await;

        let call = CalendarCall::parse(
            "calendar_create_event",
            "create_event",
            json!({
                "summary": "Sync",
                "start_time": "2026-03-01T10:00:00",
                "end_time": "2026-03-01T11:00:00",
                "attendees": ["bob@example.com"],
                "time_zone": "Europe/Dublin"
            }),
        )
        .unwrap();
        let out = call.execute(&api(&server)).await.unwrap();
        mock.assert_async().await;
        assert_eq!(out["event_id"], "ev1");
        assert_eq!(out["start"], "2026-03-01T10:00:00Z");
    }
}
