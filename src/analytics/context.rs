use crate::domain::DATE_FORMAT;
use chrono::{DateTime, Local, TimeZone};

/// Who produced an event, and when.
///
/// At least one of `device_id` and `user_id` must be set before the event is
/// accepted. A missing time is filled with the current local time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventContext {
    pub device_id: String,
    pub user_id: String,
    pub app_name: String,
    pub platform: String,
    pub server: i64,
    pub time: Option<String>,
}

impl EventContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_device(device_id: impl Into<String>) -> Self {
        Self::new().with_device_id(device_id)
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self::new().with_user_id(user_id)
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_server(mut self, server: i64) -> Self {
        self.server = server;
        self
    }

    /// Uses a preformatted wire time verbatim.
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Formats a timestamp as wall-clock time in its own zone.
    pub fn with_timestamp<Tz: TimeZone>(self, timestamp: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let formatted = timestamp.format(DATE_FORMAT).to_string();
        self.with_time(formatted)
    }

    pub fn has_identity(&self) -> bool {
        !self.device_id.is_empty() || !self.user_id.is_empty()
    }

    pub fn resolved_time(&self) -> String {
        match &self.time {
            Some(time) if !time.is_empty() => time.clone(),
            _ => Local::now().format(DATE_FORMAT).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDateTime};

    #[test]
    fn explicit_time_is_kept_verbatim() {
        let context = EventContext::for_device("d").with_time("2021-02-15 10:00:00");
        assert_eq!(context.resolved_time(), "2021-02-15 10:00:00");
    }

    #[test]
    fn missing_time_uses_wire_format() {
        let resolved = EventContext::for_user("u").resolved_time();
        assert!(NaiveDateTime::parse_from_str(&resolved, DATE_FORMAT).is_ok());
        assert_eq!(resolved.len(), "2021-02-15 10:00:00.000".len());
    }

    #[test]
    fn timestamp_keeps_local_wall_clock() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let timestamp = offset.with_ymd_and_hms(2021, 2, 15, 10, 0, 0).unwrap();
        let context = EventContext::for_device("d").with_timestamp(&timestamp);
        assert_eq!(context.time.as_deref(), Some("2021-02-15 10:00:00.000"));
    }

    #[test]
    fn identity_requires_device_or_user() {
        assert!(!EventContext::new().with_app_name("app").has_identity());
        assert!(EventContext::for_user("u").has_identity());
    }
}
