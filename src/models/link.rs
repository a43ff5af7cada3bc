use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for click fields nobody resolves (missing referrer, geolocation)
pub const UNKNOWN: &str = "unknown";

/// RFC 3339 with millisecond precision and a `Z` suffix, e.g. `2024-05-01T10:00:00.000Z`
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// One recorded access to a short link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Referring origin, or [`UNKNOWN`]
    pub source: String,
    /// Always [`UNKNOWN`]; geolocation is not resolved
    pub location: String,
}

impl ClickEvent {
    pub fn new(timestamp: DateTime<Utc>, source: Option<&str>) -> Self {
        let source = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN);

        Self {
            timestamp,
            source: source.to_string(),
            location: UNKNOWN.to_string(),
        }
    }
}

/// Stored state for one short code
#[derive(Debug, Clone)]
pub struct LinkRecord {
    pub code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
    pub clicks: Vec<ClickEvent>,
}

impl LinkRecord {
    /// A link stays usable up to and including its expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry
    }

    pub fn stats(&self) -> LinkStats {
        LinkStats {
            original_url: self.original_url.clone(),
            created_at: self.created_at,
            expiry: self.expiry,
            total_clicks: self.clicks.len(),
            click_details: self.clicks.clone(),
        }
    }
}

/// Result of a successful create
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedLink {
    pub code: String,
    pub short_link: String,
    pub expiry: DateTime<Utc>,
}

/// Snapshot returned by a successful lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    pub original_url: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub expiry: DateTime<Utc>,
    pub total_clicks: usize,
    pub click_details: Vec<ClickEvent>,
}

/// Body of `POST /shorturls`
///
/// `url` stays untyped so a non-string value reaches the registry and is
/// rejected there like a missing one.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUrlRequest {
    #[serde(default)]
    pub url: Option<serde_json::Value>,
    #[serde(default)]
    pub validity: Option<f64>,
    #[serde(default)]
    pub shortcode: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUrlResponse {
    pub short_link: String,
    #[serde(with = "timestamp")]
    pub expiry: DateTime<Utc>,
}

impl From<CreatedLink> for CreateUrlResponse {
    fn from(link: CreatedLink) -> Self {
        Self {
            short_link: link.short_link,
            expiry: link.expiry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_click_event_defaults_source() {
        let now = Utc::now();
        assert_eq!(ClickEvent::new(now, None).source, UNKNOWN);
        assert_eq!(ClickEvent::new(now, Some("  ")).source, UNKNOWN);

        let click = ClickEvent::new(now, Some("https://news.example"));
        assert_eq!(click.source, "https://news.example");
        assert_eq!(click.location, UNKNOWN);
    }

    #[test]
    fn test_timestamp_format_uses_millis_and_z() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(timestamp::format(&ts), "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let record = LinkRecord {
            code: "abc123".to_string(),
            original_url: "https://example.com".to_string(),
            created_at,
            expiry: created_at + chrono::Duration::minutes(30),
            clicks: vec![ClickEvent::new(created_at, None)],
        };

        let json = serde_json::to_value(record.stats()).unwrap();
        assert_eq!(json["originalUrl"], "https://example.com");
        assert_eq!(json["createdAt"], "2024-05-01T10:00:00.000Z");
        assert_eq!(json["expiry"], "2024-05-01T10:30:00.000Z");
        assert_eq!(json["totalClicks"], 1);
        assert_eq!(json["clickDetails"][0]["source"], "unknown");
        assert_eq!(json["clickDetails"][0]["location"], "unknown");
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let record = LinkRecord {
            code: "abc123".to_string(),
            original_url: "https://example.com".to_string(),
            created_at,
            expiry: created_at + chrono::Duration::minutes(1),
            clicks: Vec::new(),
        };

        assert!(!record.is_expired_at(record.expiry));
        assert!(record.is_expired_at(record.expiry + chrono::Duration::milliseconds(1)));
    }
}
