use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::datetime;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{CalendarError, Result};
use crate::time::TimeFacade;

/// Inclusive span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(CalendarError::Configuration(format!(
                "start date {} is after end date {}",
                datetime::format_date(start),
                datetime::format_date(end)
            )));
        }
        Ok(Self { start, end })
    }

    /// Builds a range from two `YYYY-MM-DD` strings, rejecting dates that do
    /// not exist.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = datetime::parse_date_strict(start)
            .ok_or_else(|| CalendarError::format(start, "not a valid YYYY-MM-DD date"))?;
        let end = datetime::parse_date_strict(end)
            .ok_or_else(|| CalendarError::format(end, "not a valid YYYY-MM-DD date"))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn day_count(&self) -> usize {
        usize::try_from(datetime::days_between(self.start, self.end)).unwrap_or(0)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn dates(self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }
}

/// One cell of the calendar: a date and the task unlocked on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay<T> {
    pub id: u32,
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub is_today: bool,
    pub is_active: bool,
    pub is_selected: bool,
    pub has_task: bool,
    pub task: T,
}

/// Builds one [`CalendarDay`] per date in `range`, assigning
/// `tasks[i % tasks.len()]` to the day at position `i`.
///
/// An empty task list is a configuration error. A task list whose length
/// differs from the number of days is accepted and reported once through
/// `sink`.
#[instrument(skip(facade, tasks, sink), fields(task_count = tasks.len(), mode = ?facade.mode()))]
pub fn generate_days<T: Clone>(
    range: DateRange,
    facade: &TimeFacade,
    tasks: &[T],
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<CalendarDay<T>>> {
    if tasks.is_empty() {
        return Err(CalendarError::Configuration(
            "the task list is empty".to_string(),
        ));
    }

    let day_count = usize::try_from(facade.days_between(range.start(), range.end()))
        .map_err(|_| CalendarError::Configuration("date range is reversed".to_string()))?;
    if tasks.len() != day_count {
        sink.emit(Diagnostic::TaskCountMismatch {
            task_count: tasks.len(),
            day_count,
        });
    }

    let mut days = Vec::with_capacity(day_count);
    for (i, date) in range.dates().enumerate() {
        let id = u32::try_from(i + 1).map_err(|_| {
            CalendarError::Configuration(format!("date range of {day_count} days is too long"))
        })?;
        let task = tasks[i % tasks.len()].clone();
        days.push(CalendarDay {
            id,
            date,
            day_of_month: date.day(),
            is_today: false,
            is_active: false,
            is_selected: false,
            has_task: true,
            task,
        });
    }

    let changed = refresh_status(&mut days, range.start(), facade);
    debug!(days = days.len(), today_flags = changed, "generated calendar days");
    Ok(days)
}

/// Recomputes `is_today` and `is_active` in place against the facade's
/// current day. Returns how many days changed.
pub fn refresh_status<T>(days: &mut [CalendarDay<T>], start: NaiveDate, facade: &TimeFacade) -> usize {
    let today = facade.today();
    let mut changed = 0;
    for (i, day) in days.iter_mut().enumerate() {
        let is_today = day.date == today;
        let is_active = facade
            .task_date_for_index(i, start)
            .is_some_and(|date| date == today);
        if day.is_today != is_today || day.is_active != is_active {
            trace!(id = day.id, is_today, is_active, "day status changed");
            changed += 1;
        }
        day.is_today = is_today;
        day.is_active = is_active;
    }
    changed
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::locale::CalendarLocale;
    use crate::time::{Clock, LocalZone, TimeMode};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn facade_on(y: i32, m: u32, d: u32) -> TimeFacade {
        let now = Utc
            .with_ymd_and_hms(y, m, d, 12, 0, 0)
            .single()
            .expect("valid now");
        TimeFacade::new(
            TimeMode::Utc,
            LocalZone::System,
            Clock::Fixed(now),
            CalendarLocale::default(),
        )
    }

    fn december() -> DateRange {
        DateRange::parse("2025-12-01", "2025-12-24").expect("valid range")
    }

    fn tasks(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("task-{i}")).collect()
    }

    #[test]
    fn matching_counts_produce_one_day_per_task() {
        let facade = facade_on(2025, 11, 20);
        let mut warnings: Vec<Diagnostic> = Vec::new();
        let list = tasks(24);
        let days = generate_days(december(), &facade, &list, &mut warnings).expect("generate");

        assert_eq!(days.len(), 24);
        assert!(warnings.is_empty());
        for (i, day) in days.iter().enumerate() {
            assert_eq!(day.id as usize, i + 1);
            assert!(day.has_task);
            assert_eq!(day.task, list[i]);
            assert_eq!(day.day_of_month as usize, i + 1);
            assert!(!day.is_selected);
        }
    }

    #[test]
    fn short_task_list_wraps_around() {
        let facade = facade_on(2025, 11, 20);
        let mut warnings: Vec<Diagnostic> = Vec::new();
        let list = tasks(20);
        let days = generate_days(december(), &facade, &list, &mut warnings).expect("generate");

        assert_eq!(days.len(), 24);
        assert_eq!(days[20].task, list[0]);
        assert_eq!(days[21].task, list[1]);
        assert_eq!(days[23].task, list[3]);
        assert_eq!(
            warnings,
            vec![Diagnostic::TaskCountMismatch {
                task_count: 20,
                day_count: 24
            }]
        );
    }

    #[test]
    fn surplus_tasks_are_never_reached() {
        let facade = facade_on(2025, 11, 20);
        let mut warnings: Vec<Diagnostic> = Vec::new();
        let list = tasks(30);
        let days = generate_days(december(), &facade, &list, &mut warnings).expect("generate");

        assert_eq!(days.len(), 24);
        assert_eq!(days[23].task, list[23]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn empty_task_list_is_fatal() {
        let facade = facade_on(2025, 11, 20);
        let mut warnings: Vec<Diagnostic> = Vec::new();
        let err = generate_days::<String>(december(), &facade, &[], &mut warnings)
            .expect_err("empty list must fail");
        assert!(matches!(err, CalendarError::Configuration(_)));
        assert!(warnings.is_empty());
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = DateRange::parse("2025-12-24", "2025-12-01").expect_err("reversed");
        assert!(matches!(err, CalendarError::Configuration(_)));

        let err = DateRange::parse("2025-11-31", "2025-12-24").expect_err("overflow");
        assert!(matches!(err, CalendarError::Format { .. }));
    }

    #[test]
    fn today_and_active_follow_the_clock() {
        let facade = facade_on(2025, 12, 5);
        let mut warnings: Vec<Diagnostic> = Vec::new();
        let mut days =
            generate_days(december(), &facade, &tasks(24), &mut warnings).expect("generate");

        let flagged: Vec<u32> = days.iter().filter(|d| d.is_today).map(|d| d.id).collect();
        assert_eq!(flagged, vec![5]);
        assert!(days[4].is_active);

        let next = facade.with_clock(Clock::Fixed(
            Utc.with_ymd_and_hms(2025, 12, 6, 0, 0, 1)
                .single()
                .expect("valid"),
        ));
        let changed = refresh_status(&mut days, december().start(), &next);
        assert_eq!(changed, 2);
        assert!(!days[4].is_today);
        assert!(days[5].is_today && days[5].is_active);

        assert_eq!(refresh_status(&mut days, december().start(), &next), 0);
    }

    #[test]
    fn range_iterates_across_month_and_year() {
        let range = DateRange::new(ymd(2025, 12, 30), ymd(2026, 1, 2)).expect("range");
        let dates: Vec<NaiveDate> = range.dates().collect();
        assert_eq!(
            dates,
            vec![ymd(2025, 12, 30), ymd(2025, 12, 31), ymd(2026, 1, 1), ymd(2026, 1, 2)]
        );
        assert_eq!(range.day_count(), 4);
        assert!(range.contains(ymd(2026, 1, 1)));
        assert!(!range.contains(ymd(2026, 1, 3)));
    }
}
