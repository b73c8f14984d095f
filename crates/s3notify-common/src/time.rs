use chrono::{DateTime, SecondsFormat, Utc};

/// Re-renders an RFC 3339 timestamp in UTC with second precision,
/// e.g. `2024-01-01T08:00:00.250+08:00` becomes `2024-01-01T00:00:00Z`.
pub fn format_event_time(raw: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(raw.trim()).ok()?;
    Some(
        parsed
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

#[cfg(test)]
mod tests {
    use super::format_event_time;

    #[test]
    fn drops_fractional_seconds() {
        assert_eq!(
            format_event_time("2024-01-01T00:00:00.000Z").as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
    }

    #[test]
    fn converts_offsets_to_utc() {
        assert_eq!(
            format_event_time("2024-01-01T08:30:00+08:00").as_deref(),
            Some("2024-01-01T00:30:00Z")
        );
    }

    #[test]
    fn rejects_non_rfc3339_input() {
        assert_eq!(format_event_time("yesterday"), None);
        assert_eq!(format_event_time(""), None);
    }
}
