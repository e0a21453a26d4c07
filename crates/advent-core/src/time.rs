use chrono::{
    DateTime, Datelike, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::datetime;
use crate::error::{CalendarError, Result};
use crate::locale::CalendarLocale;

/// Which midnight counts as the day boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    #[default]
    Local,
    Utc,
}

impl std::str::FromStr for TimeMode {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "utc" => Ok(Self::Utc),
            other => Err(CalendarError::Configuration(format!(
                "unknown time mode {other:?}; expected local or utc"
            ))),
        }
    }
}

/// The zone local mode reads wall-clock days from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum LocalZone {
    #[default]
    System,
    Named(Tz),
}

/// Source of the current moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
    /// A frozen calendar day. It is "today" in every time base.
    FixedDate(NaiveDate),
}

impl Clock {
    /// Reads a current-moment override: a bare `YYYY-MM-DD` freezes the day,
    /// anything else must be an RFC 3339 instant.
    pub fn parse_override(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if let Some(date) = datetime::parse_date_strict(trimmed) {
            return Ok(Clock::FixedDate(date));
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| Clock::Fixed(dt.with_timezone(&Utc)))
            .map_err(|err| {
                CalendarError::format(trimmed, format!("expected YYYY-MM-DD or RFC 3339: {err}"))
            })
    }

    pub fn is_fixed(&self) -> bool {
        !matches!(self, Clock::System)
    }
}

/// Date operations bound to one [`TimeMode`], so callers never branch on
/// local versus UTC themselves.
#[derive(Debug, Clone)]
pub struct TimeFacade {
    mode: TimeMode,
    zone: LocalZone,
    clock: Clock,
    locale: CalendarLocale,
}

impl TimeFacade {
    pub fn new(mode: TimeMode, zone: LocalZone, clock: Clock, locale: CalendarLocale) -> Self {
        Self {
            mode,
            zone,
            clock,
            locale,
        }
    }

    /// A fresh facade identical to this one except for the mode.
    pub fn with_mode(&self, mode: TimeMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    pub fn with_clock(&self, clock: Clock) -> Self {
        Self {
            clock,
            ..self.clone()
        }
    }

    pub fn mode(&self) -> TimeMode {
        self.mode
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn locale(&self) -> &CalendarLocale {
        &self.locale
    }

    /// The current instant. A frozen day reads as its midnight in this
    /// facade's time base.
    pub fn now(&self) -> DateTime<Utc> {
        match self.clock {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => at,
            Clock::FixedDate(date) => self
                .midnight(date)
                .unwrap_or_else(|_| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))),
        }
    }

    /// The calendar day containing `instant` in this facade's time base.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match (self.mode, self.zone) {
            (TimeMode::Utc, _) => instant.date_naive(),
            (TimeMode::Local, LocalZone::Named(tz)) => instant.with_timezone(&tz).date_naive(),
            (TimeMode::Local, LocalZone::System) => instant.with_timezone(&Local).date_naive(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        match self.clock {
            Clock::FixedDate(date) => date,
            _ => self.date_of(self.now()),
        }
    }

    pub fn format(&self, date: NaiveDate) -> String {
        datetime::format_date(date)
    }

    pub fn parse(&self, input: &str) -> Result<NaiveDate> {
        datetime::parse_date(input)
    }

    pub fn parse_strict(&self, input: &str) -> Option<NaiveDate> {
        datetime::parse_date_strict(input)
    }

    pub fn is_same_day(&self, a: NaiveDate, b: NaiveDate) -> bool {
        datetime::is_same_day(a, b)
    }

    pub fn is_today(&self, date: NaiveDate) -> bool {
        datetime::is_same_day(date, self.today())
    }

    pub fn is_past(&self, date: NaiveDate) -> bool {
        datetime::is_past(date, self.today())
    }

    pub fn is_future(&self, date: NaiveDate) -> bool {
        datetime::is_future(date, self.today())
    }

    pub fn days_between(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        datetime::days_between(start, end)
    }

    /// The date a task at zero-based `index` belongs to.
    pub fn task_date_for_index(&self, index: usize, start: NaiveDate) -> Option<NaiveDate> {
        let offset = i64::try_from(index).ok()?;
        datetime::add_days(start, offset)
    }

    /// `Dec. 1`: abbreviated month name and unpadded day. Months whose name
    /// is not shortened (`May 1`) get no period.
    pub fn display_short(&self, date: NaiveDate) -> String {
        let locale = self.locale.chrono_locale();
        let abbreviated = date.format_localized("%b", locale).to_string();
        let full = date.format_localized("%B", locale).to_string();
        let month = abbreviated.trim_end_matches('.');
        if month == full {
            format!("{month} {}", date.day())
        } else {
            format!("{month}. {}", date.day())
        }
    }

    /// `December, 1`: full month name and unpadded day.
    pub fn display_long(&self, date: NaiveDate) -> String {
        let month = date.format_localized("%B", self.locale.chrono_locale());
        format!("{month}, {}", date.day())
    }

    /// Localized `Month YYYY` label used for month section headers.
    pub fn month_label(&self, date: NaiveDate) -> String {
        date.format_localized("%B %Y", self.locale.chrono_locale())
            .to_string()
    }

    /// The instant at which `date` begins in this facade's time base. When
    /// local midnight falls in a DST gap the day starts at the first wall
    /// clock hour that exists.
    pub fn midnight(&self, date: NaiveDate) -> Result<DateTime<Utc>> {
        let naive = date.and_time(NaiveTime::MIN);
        match (self.mode, self.zone) {
            (TimeMode::Utc, _) => Ok(Utc.from_utc_datetime(&naive)),
            (TimeMode::Local, LocalZone::Named(tz)) => resolve_local(&tz, naive),
            (TimeMode::Local, LocalZone::System) => resolve_local(&Local, naive),
        }
    }
}

// Gaps are at most a couple of hours in practice.
const MAX_GAP_HOURS: i64 = 3;

fn resolve_local<T: TimeZone>(zone: &T, naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    let mut wall = naive;
    for _ in 0..=MAX_GAP_HOURS {
        match zone.from_local_datetime(&wall) {
            LocalResult::Single(dt) => return Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(first, second) => {
                tracing::warn!(
                    local = %wall,
                    "ambiguous local datetime; using earliest"
                );
                let chosen = if first <= second { first } else { second };
                return Ok(chosen.with_timezone(&Utc));
            }
            LocalResult::None => {
                tracing::debug!(local = %wall, "local time skipped by DST; trying the next hour");
                wall += TimeDelta::hours(1);
            }
        }
    }
    Err(CalendarError::format(
        &naive.to_string(),
        "local time does not exist in the configured zone",
    ))
}
