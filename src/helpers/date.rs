//! Date helper functions

use chrono::{DateTime, FixedOffset, Locale, TimeZone};
use chrono_tz::Tz;

use crate::config::SiteConfig;

/// Parse a CMS publication timestamp.
///
/// Accepts RFC 3339 as well as the colon-less offset Prismic emits
/// (`2021-03-25T19:25:28+0000`).
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
}

/// Format a date with a Moment.js-compatible format string and localized
/// month and weekday names
///
/// # Examples
/// ```ignore
/// format_date_localized(&date, "YYYY-MM-DD", Locale::POSIX) // -> "2024-01-15"
/// ```
pub fn format_date_localized<Tz2: TimeZone>(
    date: &DateTime<Tz2>,
    format: &str,
    locale: Locale,
) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    let chrono_format = moment_to_chrono_format(format);
    date.format_localized(&chrono_format, locale).to_string()
}

/// Formats publication dates the way the site config asks for
#[derive(Debug, Clone)]
pub struct DateFormatter {
    format: String,
    locale: Locale,
    timezone: Option<Tz>,
}

impl DateFormatter {
    pub fn new(config: &SiteConfig) -> Self {
        let locale = Locale::try_from(config.locale.as_str()).unwrap_or_else(|_| {
            tracing::warn!("Unknown locale {:?}, falling back to POSIX", config.locale);
            Locale::POSIX
        });

        let timezone = if config.timezone.is_empty() {
            None
        } else {
            match config.timezone.parse::<Tz>() {
                Ok(tz) => Some(tz),
                Err(e) => {
                    tracing::warn!("Ignoring timezone {:?}: {}", config.timezone, e);
                    None
                }
            }
        };

        Self {
            format: config.date_format.clone(),
            locale,
            timezone,
        }
    }

    /// Format an optional timestamp; absent timestamps render empty
    pub fn format(&self, date: Option<&DateTime<FixedOffset>>) -> String {
        let Some(date) = date else {
            return String::new();
        };

        match self.timezone {
            Some(tz) => format_date_localized(&date.with_timezone(&tz), &self.format, self.locale),
            None => format_date_localized(date, &self.format, self.locale),
        }
    }
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    let replacements = [
        // Year
        ("YYYY", "%Y"),
        ("YY", "%y"),
        // Month
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        // Day of month
        ("DDDD", "%j"),
        ("DD", "%d"),
        // Hour
        ("HH", "%H"),
        ("hh", "%I"),
        // Minute
        ("mm", "%M"),
        // Second
        ("ss", "%S"),
        // Day of week
        ("dddd", "%A"),
        ("ddd", "%a"),
        // Timezone
        ("ZZ", "%z"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}
