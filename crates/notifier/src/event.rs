// Event record and builder
//
// Decision: Events are validated at construction and immutable afterwards.
// Decision: Correlation id and start time are captured once in `build`, so
// every retry resends the same values.

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::error::{NotifyError, Result};
use crate::variant::ApiVariant;

/// Identifier of the resource or component an event concerns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TargetId {
    Numeric(u64),
    Text(String),
}

impl TargetId {
    /// Empty and dot-only ids would vanish from the request path
    pub fn is_path_safe(&self) -> bool {
        match self {
            TargetId::Numeric(_) => true,
            TargetId::Text(s) => !matches!(s.as_str(), "" | "." | ".."),
        }
    }

    /// Parse caller input. Canonical decimal integers become numeric ids,
    /// anything else (including zero-padded numbers) stays text.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(n) if n.to_string() == raw => TargetId::Numeric(n),
            _ => TargetId::Text(raw.to_string()),
        }
    }
}

impl From<&str> for TargetId {
    fn from(raw: &str) -> Self {
        TargetId::parse(raw)
    }
}

impl From<String> for TargetId {
    fn from(raw: String) -> Self {
        TargetId::parse(&raw)
    }
}

impl From<u64> for TargetId {
    fn from(n: u64) -> Self {
        TargetId::Numeric(n)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetId::Numeric(n) => write!(f, "{}", n),
            TargetId::Text(s) => f.write_str(s),
        }
    }
}

/// Wrapped message used by the components API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentPayload {
    pub message: String,
}

/// Wire body of an event, one shape per API variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventBody {
    Resource {
        message: String,
        event: String,
    },
    Management {
        message: String,
        #[serde(rename = "type")]
        event_type: String,
    },
    Component {
        payload: ComponentPayload,
        #[serde(rename = "sourceEventID")]
        source_event_id: Uuid,
        #[serde(rename = "eventType")]
        event_type: String,
        #[serde(rename = "startTime")]
        start_time: String,
        #[serde(rename = "componentID")]
        component_id: TargetId,
    },
}

/// A validated notification, ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    variant: ApiVariant,
    target_id: TargetId,
    body: EventBody,
}

impl Event {
    /// Validate the event type and assemble the event.
    ///
    /// Fails with [`NotifyError::InvalidEventType`] when `event_type` is not
    /// in the variant's allow-list, and with [`NotifyError::InvalidTargetId`]
    /// when the target id cannot be a path segment (empty, `.` or `..`).
    pub fn build(
        variant: ApiVariant,
        message: impl Into<String>,
        event_type: impl Into<String>,
        target_id: impl Into<TargetId>,
    ) -> Result<Self> {
        Self::build_at(
            variant,
            message,
            event_type,
            target_id,
            Uuid::now_v7(),
            Utc::now(),
        )
    }

    /// Like [`Event::build`] with an explicit correlation id and start time
    pub fn build_at(
        variant: ApiVariant,
        message: impl Into<String>,
        event_type: impl Into<String>,
        target_id: impl Into<TargetId>,
        source_event_id: Uuid,
        start_time: DateTime<Utc>,
    ) -> Result<Self> {
        let event_type = event_type.into();
        if !variant.is_allowed(&event_type) {
            return Err(NotifyError::InvalidEventType {
                value: event_type,
                allowed: variant.allowed_event_types().to_vec(),
            });
        }

        let message = message.into();
        let target_id = target_id.into();
        if !target_id.is_path_safe() {
            return Err(NotifyError::InvalidTargetId(target_id.to_string()));
        }

        let body = match variant {
            ApiVariant::Resources => EventBody::Resource {
                message,
                event: event_type,
            },
            ApiVariant::Management => EventBody::Management {
                message,
                event_type,
            },
            ApiVariant::Components => EventBody::Component {
                payload: ComponentPayload { message },
                source_event_id,
                event_type,
                start_time: start_time.to_rfc3339_opts(SecondsFormat::Millis, true),
                component_id: target_id.clone(),
            },
        };

        Ok(Self {
            variant,
            target_id,
            body,
        })
    }

    pub fn variant(&self) -> ApiVariant {
        self.variant
    }

    pub fn target_id(&self) -> &TargetId {
        &self.target_id
    }

    pub fn body(&self) -> &EventBody {
        &self.body
    }

    pub fn message(&self) -> &str {
        match &self.body {
            EventBody::Resource { message, .. } | EventBody::Management { message, .. } => message,
            EventBody::Component { payload, .. } => &payload.message,
        }
    }

    pub fn event_type(&self) -> &str {
        match &self.body {
            EventBody::Resource { event, .. } => event,
            EventBody::Management { event_type, .. } | EventBody::Component { event_type, .. } => {
                event_type
            }
        }
    }

    /// Serialize the wire body
    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(&self.body)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    fn body_json(event: &Event) -> Value {
        serde_json::from_slice(&event.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_resource_event_shape() {
        let event = Event::build(ApiVariant::Resources, "deploy v2", "deploy", "abc123").unwrap();

        assert_eq!(
            body_json(&event),
            json!({"message": "deploy v2", "event": "deploy"})
        );
        assert_eq!(event.target_id(), &TargetId::Text("abc123".to_string()));
        assert_eq!(event.message(), "deploy v2");
        assert_eq!(event.event_type(), "deploy");
    }

    #[test]
    fn test_management_event_uses_type_field() {
        let event = Event::build(ApiVariant::Management, "db down", "incident", "42").unwrap();

        assert_eq!(
            body_json(&event),
            json!({"message": "db down", "type": "incident"})
        );
    }

    #[test]
    fn test_component_event_shape() {
        let id = Uuid::now_v7();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let event = Event::build_at(
            ApiVariant::Components,
            "rolled out",
            "deployment",
            "17",
            id,
            start,
        )
        .unwrap();

        assert_eq!(
            body_json(&event),
            json!({
                "payload": {"message": "rolled out"},
                "sourceEventID": id.to_string(),
                "eventType": "deployment",
                "startTime": "2024-05-01T12:30:00.000Z",
                "componentID": 17
            })
        );
    }

    #[test]
    fn test_invalid_event_type_rejected() {
        let err = Event::build(ApiVariant::Resources, "hello", "release", "abc").unwrap_err();

        match err {
            NotifyError::InvalidEventType { value, allowed } => {
                assert_eq!(value, "release");
                assert_eq!(allowed, vec!["deploy", "incident"]);
            }
            other => panic!("Expected InvalidEventType, got {other:?}"),
        }
    }

    #[test]
    fn test_dot_segment_target_rejected() {
        for bad in ["", ".", ".."] {
            let err = Event::build(ApiVariant::Resources, "m", "deploy", bad).unwrap_err();
            assert!(
                matches!(&err, NotifyError::InvalidTargetId(id) if id == bad),
                "{bad:?}: {err:?}"
            );
        }
        assert!(Event::build(ApiVariant::Resources, "m", "deploy", "...").is_ok());
        assert!(Event::build(ApiVariant::Resources, "m", "deploy", ".hidden").is_ok());
    }

    #[test]
    fn test_allow_list_is_per_variant() {
        assert!(Event::build(ApiVariant::Components, "m", "deploy", "1").is_err());
        assert!(Event::build(ApiVariant::Resources, "m", "deployment", "1").is_err());
    }

    #[test]
    fn test_serialization_is_stable() {
        let event = Event::build(ApiVariant::Components, "m", "deployment", "c-1").unwrap();
        assert_eq!(event.to_bytes().unwrap(), event.to_bytes().unwrap());
    }

    #[test]
    fn test_target_id_parsing() {
        assert_eq!(TargetId::parse("123"), TargetId::Numeric(123));
        assert_eq!(TargetId::parse("0"), TargetId::Numeric(0));
        assert_eq!(TargetId::parse("007"), TargetId::Text("007".to_string()));
        assert_eq!(TargetId::parse("abc"), TargetId::Text("abc".to_string()));
        assert_eq!(TargetId::parse("-1"), TargetId::Text("-1".to_string()));
        assert_eq!(TargetId::Numeric(9).to_string(), "9");
    }
}
