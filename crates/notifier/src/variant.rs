// Target API shapes
//
// Decision: The three healthcheck API generations are a closed enum rather than
// a configurable template. Allow-lists and retry caps are fixed per variant.

use std::fmt;

/// Shape of the remote event-ingestion API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ApiVariant {
    /// `POST /api/v1/resources/{id}/events` with `{message, event}`
    #[default]
    Resources,
    /// `POST /v1/management/resource/{id}/event` with `{message, type}`
    Management,
    /// `POST /v1/components/{id}/events` with the wrapped payload shape
    Components,
}

const RESOURCE_EVENT_TYPES: &[&str] = &["deploy", "incident"];
const COMPONENT_EVENT_TYPES: &[&str] = &["deployment"];

impl ApiVariant {
    pub const ALL: [ApiVariant; 3] = [
        ApiVariant::Resources,
        ApiVariant::Management,
        ApiVariant::Components,
    ];

    /// Event types accepted by this variant
    pub fn allowed_event_types(&self) -> &'static [&'static str] {
        match self {
            ApiVariant::Resources | ApiVariant::Management => RESOURCE_EVENT_TYPES,
            ApiVariant::Components => COMPONENT_EVENT_TYPES,
        }
    }

    pub fn is_allowed(&self, event_type: &str) -> bool {
        self.allowed_event_types().contains(&event_type)
    }

    /// Maximum number of POST attempts for one event
    pub fn max_retries(&self) -> u32 {
        match self {
            ApiVariant::Resources | ApiVariant::Management => 3,
            ApiVariant::Components => 5,
        }
    }

    /// Path segments of the endpoint, with the target id in place.
    ///
    /// Segments are escaped individually when joined onto the base URL, so the
    /// target id always stays a single segment.
    pub fn path_segments<'a>(&self, target_id: &'a str) -> Vec<&'a str> {
        match self {
            ApiVariant::Resources => vec!["api", "v1", "resources", target_id, "events"],
            ApiVariant::Management => vec!["v1", "management", "resource", target_id, "event"],
            ApiVariant::Components => vec!["v1", "components", target_id, "events"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVariant::Resources => "resources",
            ApiVariant::Management => "management",
            ApiVariant::Components => "components",
        }
    }
}

impl fmt::Display for ApiVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApiVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "resources" | "resource" | "" => Ok(ApiVariant::Resources),
            "management" => Ok(ApiVariant::Management),
            "components" | "component" => Ok(ApiVariant::Components),
            other => Err(format!(
                "Unknown API variant: {}. Use 'resources', 'management' or 'components'",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variant() {
        assert_eq!("resources".parse::<ApiVariant>(), Ok(ApiVariant::Resources));
        assert_eq!("".parse::<ApiVariant>(), Ok(ApiVariant::Resources));
        assert_eq!("Management".parse::<ApiVariant>(), Ok(ApiVariant::Management));
        assert_eq!("component".parse::<ApiVariant>(), Ok(ApiVariant::Components));
        assert!("grpc".parse::<ApiVariant>().is_err());
    }

    #[test]
    fn test_allow_lists() {
        assert!(ApiVariant::Resources.is_allowed("deploy"));
        assert!(ApiVariant::Resources.is_allowed("incident"));
        assert!(!ApiVariant::Resources.is_allowed("deployment"));
        assert!(!ApiVariant::Resources.is_allowed("Deploy"));
        assert!(ApiVariant::Components.is_allowed("deployment"));
        assert!(!ApiVariant::Components.is_allowed("deploy"));
    }

    #[test]
    fn test_path_segments() {
        assert_eq!(
            ApiVariant::Resources.path_segments("abc123").join("/"),
            "api/v1/resources/abc123/events"
        );
        assert_eq!(
            ApiVariant::Management.path_segments("42").join("/"),
            "v1/management/resource/42/event"
        );
        assert_eq!(
            ApiVariant::Components.path_segments("7").join("/"),
            "v1/components/7/events"
        );
    }

    #[test]
    fn test_retry_caps() {
        for variant in ApiVariant::ALL {
            assert!((3..=5).contains(&variant.max_retries()));
        }
        assert_eq!(ApiVariant::Resources.max_retries(), 3);
        assert_eq!(ApiVariant::Components.max_retries(), 5);
    }
}
