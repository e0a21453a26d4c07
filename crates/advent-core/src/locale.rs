use chrono::{Datelike, Locale, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::datetime::add_days;

pub const DEFAULT_LOCALE: &str = "en-US";

/// Regions whose calendars conventionally start on Sunday. Everything else
/// starts on Monday when no better information is available.
const SUNDAY_START_REGIONS: &[&str] = &[
    "US", "CA", "MX", "BR", "JP", "KR", "TW", "HK", "IL", "PH", "ZA", "IN",
];

/// Configured preference for the first column of the weekday grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstDayOfWeek {
    #[default]
    Auto,
    Monday,
    Sunday,
}

/// A locale identifier such as `en-US` together with the chrono locale used
/// for month and weekday names.
#[derive(Debug, Clone)]
pub struct CalendarLocale {
    id: String,
    language: String,
    region: Option<String>,
    locale: Locale,
}

impl CalendarLocale {
    /// Accepts BCP 47 style (`en-US`) and POSIX style (`en_US.UTF-8`)
    /// identifiers. Unknown locales fall back to `en_US` names while keeping
    /// the parsed region for week-start heuristics.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let base = trimmed
            .split(['.', '@'])
            .next()
            .unwrap_or_default()
            .replace('-', "_");

        let mut parts = base.split('_');
        let language = parts.next().unwrap_or_default().to_ascii_lowercase();
        let region = parts
            .next()
            .filter(|r| !r.is_empty())
            .map(|r| r.to_ascii_uppercase());

        let candidates = match &region {
            Some(region) => vec![format!("{language}_{region}")],
            None => vec![
                format!("{language}_{}", language.to_ascii_uppercase()),
                language.clone(),
            ],
        };

        let locale = candidates
            .iter()
            .find_map(|name| Locale::try_from(name.as_str()).ok())
            .unwrap_or_else(|| {
                debug!(locale = %trimmed, "unknown locale; using en_US names");
                Locale::en_US
            });

        Self {
            id: trimmed.to_string(),
            language,
            region,
            locale,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn chrono_locale(&self) -> Locale {
        self.locale
    }

    /// First day of the week according to the locale's `LC_TIME` data, if it
    /// carries any and that day is one the grid supports.
    pub fn week_info_first_day(&self) -> Option<Weekday> {
        let first_weekday =
            pure_rust_locales::locale_match!(self.locale => LC_TIME::FIRST_WEEKDAY);
        let week = pure_rust_locales::locale_match!(self.locale => LC_TIME::WEEK);
        if first_weekday.is_none() && week.is_none() {
            return None;
        }

        // glibc counts `first_weekday` from the `week_1stday` anchor date,
        // 1-based, and defaults the anchor to a Sunday.
        let anchor = week
            .and_then(|fields| fields.get(1).copied())
            .and_then(anchor_date)
            .map(|date| date.weekday())
            .unwrap_or(Weekday::Sun);
        let offset = first_weekday.unwrap_or(1) - 1;
        let day = (0..offset.rem_euclid(7)).fold(anchor, |day, _| day.succ());

        match day {
            Weekday::Mon | Weekday::Sun => Some(day),
            _ => None,
        }
    }
}

impl Default for CalendarLocale {
    fn default() -> Self {
        Self::parse(DEFAULT_LOCALE)
    }
}

fn anchor_date(raw: i64) -> Option<NaiveDate> {
    let year = i32::try_from(raw / 10_000).ok()?;
    let month = u32::try_from((raw / 100) % 100).ok()?;
    let day = u32::try_from(raw % 100).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn region_first_day(region: Option<&str>) -> Weekday {
    match region {
        Some(region) if SUNDAY_START_REGIONS.contains(&region) => Weekday::Sun,
        _ => Weekday::Mon,
    }
}

/// Resolves the grid's first weekday: an explicit preference wins, then the
/// locale's week data, then the region table.
pub fn resolve_first_day_of_week(pref: FirstDayOfWeek, locale: &CalendarLocale) -> Weekday {
    let resolved = match pref {
        FirstDayOfWeek::Monday => Weekday::Mon,
        FirstDayOfWeek::Sunday => Weekday::Sun,
        FirstDayOfWeek::Auto => locale
            .week_info_first_day()
            .unwrap_or_else(|| region_first_day(locale.region())),
    };
    debug!(?pref, locale = %locale.id(), first_day = %resolved, "resolved first day of week");
    resolved
}

/// Localized abbreviated weekday names, starting at `first_day`.
pub fn weekday_labels(first_day: Weekday, locale: &CalendarLocale) -> Vec<String> {
    // 2024-01-01 is a Monday; any fixed week works.
    let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN);
    let start = first_day.num_days_from_monday() as i64;
    (0..7)
        .filter_map(|i| add_days(monday, start + i))
        .map(|date| {
            date.format_localized("%a", locale.chrono_locale())
                .to_string()
        })
        .collect()
}
