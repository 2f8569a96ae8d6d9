use serde::{Deserialize, Serialize};

/// Record kind carried in the `#type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Track,
    UserSet,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Track => "track",
            EventType::UserSet => "user_set",
        }
    }
}

/// One analytics record as it travels inside an envelope.
///
/// Built by the producer side after validation. The batch engine treats it
/// as opaque and never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "#device_id", default, skip_serializing_if = "String::is_empty")]
    pub device_id: String,
    #[serde(rename = "#user_id", default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(rename = "#app_name", default, skip_serializing_if = "String::is_empty")]
    pub app_name: String,
    #[serde(rename = "#platform", default, skip_serializing_if = "String::is_empty")]
    pub platform: String,
    #[serde(rename = "#server", default, skip_serializing_if = "is_zero")]
    pub server: i64,
    #[serde(rename = "#type")]
    pub event_type: EventType,
    #[serde(rename = "#time")]
    pub time: String,
    #[serde(rename = "#event_name", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    /// Property map already serialized to JSON.
    #[serde(rename = "#properties")]
    pub properties: String,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl Event {
    pub fn has_identity(&self) -> bool {
        !self.device_id.is_empty() || !self.user_id.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Event {
        Event {
            device_id: "device-1".to_string(),
            user_id: String::new(),
            app_name: "apptest".to_string(),
            platform: String::new(),
            server: 0,
            event_type: EventType::Track,
            time: "2021-02-15 10:00:00.000".to_string(),
            event_name: Some("login".to_string()),
            properties: r#"{"level":1}"#.to_string(),
        }
    }

    #[test]
    fn empty_fields_are_omitted() {
        let json = sample().to_json().unwrap();
        assert_eq!(
            json,
            r##"{"#device_id":"device-1","#app_name":"apptest","#type":"track","#time":"2021-02-15 10:00:00.000","#event_name":"login","#properties":"{\"level\":1}"}"##
        );
    }

    #[test]
    fn server_tag_and_user_set_type_are_written() {
        let mut event = sample();
        event.server = 7;
        event.event_type = EventType::UserSet;
        event.event_name = None;
        let json = event.to_json().unwrap();
        assert!(json.contains(r##""#server":7"##));
        assert!(json.contains(r##""#type":"user_set""##));
        assert!(!json.contains("#event_name"));
    }

    #[test]
    fn identity_requires_one_id() {
        let mut event = sample();
        assert!(event.has_identity());
        event.device_id.clear();
        assert!(!event.has_identity());
        event.user_id = "u-1".to_string();
        assert!(event.has_identity());
    }
}
