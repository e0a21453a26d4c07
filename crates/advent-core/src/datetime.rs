use std::sync::OnceLock;

use chrono::{
  Datelike,
  NaiveDate
};
use regex::Regex;

use crate::error::{
  CalendarError,
  Result
};

const ISO_DATE_FORMAT: &str =
  "%Y-%m-%d";

fn iso_date_regex()
-> Option<&'static Regex> {
  static ISO_DATE_RE: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  ISO_DATE_RE
    .get_or_init(|| {
      Regex::new(
        r"^\d{4}-\d{2}-\d{2}$"
      )
      .map_err(|err| {
        tracing::error!(
          error = %err,
          "internal regex compile failure"
        );
        err
      })
      .ok()
    })
    .as_ref()
}

/// Renders a calendar date as
/// zero-padded `YYYY-MM-DD`.
#[must_use]
pub fn format_date(
  date: NaiveDate
) -> String {
  date
    .format(ISO_DATE_FORMAT)
    .to_string()
}

/// Parses a `YYYY-MM-DD` string into a
/// calendar date.
///
/// The three numeric components are
/// read individually and the date is
/// built from them, so no timezone is
/// ever involved. A triple that names
/// no real day (`2025-02-30`) is a
/// format error as well.
#[tracing::instrument(level = "trace")]
pub fn parse_date(
  input: &str
) -> Result<NaiveDate> {
  let (year, month, day) =
    split_components(input)?;
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .ok_or_else(|| {
    CalendarError::format(
      input,
      "no such calendar day"
    )
  })
}

/// Like [`parse_date`] but returns
/// `None` instead of an error, and
/// double checks that the constructed
/// date carries exactly the requested
/// year, month and day.
#[must_use]
pub fn parse_date_strict(
  input: &str
) -> Option<NaiveDate> {
  let (year, month, day) =
    split_components(input).ok()?;
  let date = NaiveDate::from_ymd_opt(
    year, month, day
  )?;
  if date.year() != year
    || date.month() != month
    || date.day() != day
  {
    tracing::debug!(
      input,
      "date components drifted on construction"
    );
    return None;
  }
  Some(date)
}

fn split_components(
  input: &str
) -> Result<(i32, u32, u32)> {
  let Some(re) = iso_date_regex()
  else {
    return Err(CalendarError::format(
      input,
      "date pattern unavailable"
    ));
  };
  if !re.is_match(input) {
    return Err(CalendarError::format(
      input,
      "expected YYYY-MM-DD"
    ));
  }

  let parts: Vec<&str> =
    input.split('-').collect();
  let [year, month, day] =
    parts.as_slice()
  else {
    return Err(CalendarError::format(
      input,
      "expected three components"
    ));
  };

  let year = year
    .parse::<i32>()
    .map_err(|err| {
      CalendarError::format(
        input,
        format!("bad year: {err}")
      )
    })?;
  let month = month
    .parse::<u32>()
    .map_err(|err| {
      CalendarError::format(
        input,
        format!("bad month: {err}")
      )
    })?;
  let day =
    day.parse::<u32>().map_err(
      |err| {
        CalendarError::format(
          input,
          format!("bad day: {err}")
        )
      }
    )?;

  Ok((year, month, day))
}

#[must_use]
pub fn is_same_day(
  a: NaiveDate,
  b: NaiveDate
) -> bool {
  a == b
}

#[must_use]
pub fn is_past(
  date: NaiveDate,
  today: NaiveDate
) -> bool {
  date < today
}

#[must_use]
pub fn is_future(
  date: NaiveDate,
  today: NaiveDate
) -> bool {
  date > today
}

/// Inclusive number of days from
/// `start` to `end`; a single day
/// counts as one. Reversed ranges give
/// zero or less.
#[must_use]
pub fn days_between(
  start: NaiveDate,
  end: NaiveDate
) -> i64 {
  (end - start).num_days() + 1
}

/// `date` moved by `days` calendar
/// days, or `None` past the end of the
/// representable range.
#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> Option<NaiveDate> {
  date.checked_add_signed(
    chrono::Duration::days(days)
  )
}
