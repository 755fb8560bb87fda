use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStyle {
    /// "5m ago", "3h ago", "Oct 14, 09:30"
    Feed,
    /// "5m", "3h", "Oct 14"
    Compact,
}

/// Human-friendly age of a message.
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>, style: TimeStyle) -> String {
    let secs = (now - at).num_seconds();
    let suffix = match style {
        TimeStyle::Feed => " ago",
        TimeStyle::Compact => "",
    };

    if secs < 60 {
        "now".to_string()
    } else if secs < 3600 {
        format!("{}m{}", secs / 60, suffix)
    } else if secs < 86_400 {
        format!("{}h{}", secs / 3600, suffix)
    } else {
        match style {
            TimeStyle::Feed => at.format("%b %-d, %H:%M").to_string(),
            TimeStyle::Compact => at.format("%b %-d").to_string(),
        }
    }
}
