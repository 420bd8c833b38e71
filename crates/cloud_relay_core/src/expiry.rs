use std::time::Duration;

pub const DEFAULT_EXPIRY_MINUTES: u64 = 10;

/// Lifetime requested for a presigned link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkExpiry {
    Seconds(u64),
    /// A preset such as `"1day"` or `"7days"`; unknown names fall back to ten
    /// minutes.
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExpiry {
    pub duration: Duration,
    pub message: String,
}

impl LinkExpiry {
    pub fn resolve(&self) -> ResolvedExpiry {
        match self {
            Self::Seconds(seconds) => ResolvedExpiry {
                duration: Duration::from_secs(*seconds),
                message: String::new(),
            },
            Self::Named(name) => match preset_days(name) {
                Some(days) => ResolvedExpiry {
                    duration: Duration::from_secs(days * 24 * 60 * 60),
                    message: format!(
                        "This link will expire in {days} {}",
                        if days == 1 { "Day" } else { "Days" }
                    ),
                },
                None => ResolvedExpiry {
                    duration: Duration::from_secs(DEFAULT_EXPIRY_MINUTES * 60),
                    message: format!("This link will expire in {DEFAULT_EXPIRY_MINUTES} Minutes"),
                },
            },
        }
    }
}

impl From<u64> for LinkExpiry {
    fn from(value: u64) -> Self {
        Self::Seconds(value)
    }
}

impl From<&str> for LinkExpiry {
    fn from(value: &str) -> Self {
        Self::Named(value.to_string())
    }
}

fn preset_days(name: &str) -> Option<u64> {
    match name.to_ascii_lowercase().as_str() {
        "1day" => Some(1),
        "2days" => Some(2),
        "3days" => Some(3),
        "4days" => Some(4),
        "5days" => Some(5),
        "6days" => Some(6),
        "7days" => Some(7),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_expiry_has_no_message() {
        let resolved = LinkExpiry::from(900u64).resolve();

        assert_eq!(resolved.duration, Duration::from_secs(900));
        assert_eq!(resolved.message, "");
    }

    #[test]
    fn single_day_preset_is_singular() {
        let resolved = LinkExpiry::from("1Day").resolve();

        assert_eq!(resolved.duration, Duration::from_secs(86_400));
        assert_eq!(resolved.message, "This link will expire in 1 Day");
    }

    #[test]
    fn multi_day_presets_cover_one_week() {
        let resolved = LinkExpiry::from("7days").resolve();

        assert_eq!(resolved.duration, Duration::from_secs(604_800));
        assert_eq!(resolved.message, "This link will expire in 7 Days");

        let resolved = LinkExpiry::from("3DAYS").resolve();
        assert_eq!(resolved.duration, Duration::from_secs(259_200));
        assert_eq!(resolved.message, "This link will expire in 3 Days");
    }

    #[test]
    fn unknown_presets_fall_back_to_ten_minutes() {
        for name in ["8days", "1days", "0days", "tomorrow", ""] {
            let resolved = LinkExpiry::from(name).resolve();
            assert_eq!(resolved.duration, Duration::from_secs(600), "{name}");
            assert_eq!(resolved.message, "This link will expire in 10 Minutes");
        }
    }
}
