use chrono::{Datelike, NaiveDate, Weekday};
use tracing::{debug, info, instrument};

use crate::calendar::{self, CalendarDay, DateRange};
use crate::diagnostics::DiagnosticSink;
use crate::error::Result;
use crate::grid::{self, GridCell};
use crate::locale::{self, CalendarLocale, FirstDayOfWeek};
use crate::time::{Clock, LocalZone, TimeFacade, TimeMode};

/// Everything needed to build a calendar apart from the task list.
#[derive(Debug, Clone)]
pub struct CalendarSettings {
    pub range: DateRange,
    pub mode: TimeMode,
    pub zone: LocalZone,
    pub clock: Clock,
    pub locale: CalendarLocale,
    pub first_day_of_week: FirstDayOfWeek,
}

/// Consecutive days sharing a month, for month headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthSection {
    pub year: i32,
    pub month: u32,
    pub label: String,
    /// Index into [`AdventCalendar::days`] of the first day of the section.
    pub start: usize,
    pub len: usize,
}

/// Owner of the calendar state. Holds the only copy of the day list and
/// keeps derived flags in step with its inputs.
#[derive(Debug, Clone)]
pub struct AdventCalendar<T> {
    range: DateRange,
    facade: TimeFacade,
    first_day_pref: FirstDayOfWeek,
    first_day: Weekday,
    tasks: Vec<T>,
    days: Vec<CalendarDay<T>>,
    today: NaiveDate,
}

impl<T: Clone> AdventCalendar<T> {
    #[instrument(skip_all, fields(start = %settings.range.start(), end = %settings.range.end()))]
    pub fn new(settings: CalendarSettings, tasks: Vec<T>, sink: &mut dyn DiagnosticSink) -> Result<Self> {
        let facade = TimeFacade::new(settings.mode, settings.zone, settings.clock, settings.locale);
        let days = calendar::generate_days(settings.range, &facade, &tasks, sink)?;
        let first_day = locale::resolve_first_day_of_week(settings.first_day_of_week, facade.locale());
        let today = facade.today();
        info!(
            days = days.len(),
            tasks = tasks.len(),
            mode = ?facade.mode(),
            %today,
            "calendar ready"
        );
        Ok(Self {
            range: settings.range,
            facade,
            first_day_pref: settings.first_day_of_week,
            first_day,
            tasks,
            days,
            today,
        })
    }

    pub fn days(&self) -> &[CalendarDay<T>] {
        &self.days
    }

    pub fn tasks(&self) -> &[T] {
        &self.tasks
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn facade(&self) -> &TimeFacade {
        &self.facade
    }

    pub fn first_day_of_week(&self) -> Weekday {
        self.first_day
    }

    /// The day the flags were last computed for.
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn day(&self, id: u32) -> Option<&CalendarDay<T>> {
        self.days.iter().find(|day| day.id == id)
    }

    pub fn today_day(&self) -> Option<&CalendarDay<T>> {
        self.days.iter().find(|day| day.is_today)
    }

    /// The day whose task is unlocked right now.
    pub fn active_day(&self) -> Option<&CalendarDay<T>> {
        self.days.iter().find(|day| day.is_active)
    }

    pub fn selected(&self) -> Option<&CalendarDay<T>> {
        self.days.iter().find(|day| day.is_selected)
    }

    /// Replaces the time mode and recomputes the today flags. The day list
    /// itself does not depend on the mode and is kept.
    #[instrument(skip(self))]
    pub fn set_time_mode(&mut self, mode: TimeMode) -> usize {
        if mode == self.facade.mode() {
            return 0;
        }
        self.facade = self.facade.with_mode(mode);
        self.recompute_flags()
    }

    /// Swaps the clock, e.g. to freeze or unfreeze the current moment.
    pub fn set_clock(&mut self, clock: Clock) -> usize {
        self.facade = self.facade.with_clock(clock);
        self.recompute_flags()
    }

    /// Rebuilds the day list for a new range. On error the previous state is
    /// left untouched.
    #[instrument(skip(self, sink))]
    pub fn set_range(&mut self, range: DateRange, sink: &mut dyn DiagnosticSink) -> Result<()> {
        let days = calendar::generate_days(range, &self.facade, &self.tasks, sink)?;
        self.range = range;
        self.install(days);
        Ok(())
    }

    /// Rebuilds the day list for a new task list. On error the previous state
    /// is left untouched.
    #[instrument(skip_all, fields(tasks = tasks.len()))]
    pub fn set_tasks(&mut self, tasks: Vec<T>, sink: &mut dyn DiagnosticSink) -> Result<()> {
        let days = calendar::generate_days(self.range, &self.facade, &tasks, sink)?;
        self.tasks = tasks;
        self.install(days);
        Ok(())
    }

    pub fn set_first_day_of_week(&mut self, pref: FirstDayOfWeek) {
        self.first_day_pref = pref;
        self.first_day = locale::resolve_first_day_of_week(pref, self.facade.locale());
    }

    pub fn first_day_preference(&self) -> FirstDayOfWeek {
        self.first_day_pref
    }

    /// Checks whether the clock has moved to another day and, if so, updates
    /// the today flags in place. Returns `true` when the day changed.
    pub fn refresh_today(&mut self) -> bool {
        let today = self.facade.today();
        if today == self.today {
            return false;
        }
        debug!(from = %self.today, to = %today, "day rolled over");
        self.recompute_flags();
        true
    }

    /// Marks the day with `id` as the only selected day. Unknown ids leave
    /// the selection as it was.
    pub fn select(&mut self, id: u32) -> bool {
        if self.day(id).is_none() {
            debug!(id, "ignoring selection of unknown day");
            return false;
        }
        for day in &mut self.days {
            day.is_selected = day.id == id;
        }
        true
    }

    pub fn clear_selection(&mut self) {
        for day in &mut self.days {
            day.is_selected = false;
        }
    }

    /// The day a view should bring into sight: the selection, else today,
    /// else the next upcoming day, else the last day of the range.
    pub fn scroll_target(&self) -> Option<u32> {
        self.selected()
            .or_else(|| self.today_day())
            .or_else(|| self.days.iter().find(|day| day.date > self.today))
            .or_else(|| self.days.last())
            .map(|day| day.id)
    }

    /// Groups the day list by month, in order.
    pub fn month_sections(&self) -> Vec<MonthSection> {
        let mut sections: Vec<MonthSection> = Vec::new();
        for (i, day) in self.days.iter().enumerate() {
            let (year, month) = (day.date.year(), day.date.month());
            match sections.last_mut() {
                Some(section) if section.year == year && section.month == month => {
                    section.len += 1;
                }
                _ => sections.push(MonthSection {
                    year,
                    month,
                    label: self.facade.month_label(day.date),
                    start: i,
                    len: 1,
                }),
            }
        }
        sections
    }

    /// Whether the day at `index` opens a new month section.
    pub fn is_month_boundary(&self, index: usize) -> bool {
        match (index.checked_sub(1).and_then(|prev| self.days.get(prev)), self.days.get(index)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(prev), Some(day)) => {
                (prev.date.year(), prev.date.month()) != (day.date.year(), day.date.month())
            }
        }
    }

    pub fn grid(&self) -> Vec<GridCell<'_, T>> {
        grid::build_grid(&self.days, self.first_day)
    }

    pub fn weekday_labels(&self) -> Vec<String> {
        locale::weekday_labels(self.first_day, self.facade.locale())
    }

    fn install(&mut self, mut days: Vec<CalendarDay<T>>) {
        let selected = self.selected().map(|day| day.date);
        if let Some(date) = selected
            && let Some(day) = days.iter_mut().find(|day| day.date == date)
        {
            day.is_selected = true;
        }
        self.days = days;
        self.today = self.facade.today();
    }

    fn recompute_flags(&mut self) -> usize {
        self.today = self.facade.today();
        calendar::refresh_status(&mut self.days, self.range.start(), &self.facade)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::diagnostics::Diagnostic;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
            .single()
            .expect("valid instant")
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn settings(start: &str, end: &str, now: DateTime<Utc>) -> CalendarSettings {
        CalendarSettings {
            range: DateRange::parse(start, end).expect("valid range"),
            mode: TimeMode::Local,
            zone: LocalZone::Named(chrono_tz::America::New_York),
            clock: Clock::Fixed(now),
            locale: CalendarLocale::parse("en-US"),
            first_day_of_week: FirstDayOfWeek::Monday,
        }
    }

    fn tasks(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("offer {i}")).collect()
    }

    fn build(start: &str, end: &str, now: DateTime<Utc>, n: usize) -> AdventCalendar<String> {
        let mut warnings: Vec<Diagnostic> = Vec::new();
        AdventCalendar::new(settings(start, end, now), tasks(n), &mut warnings).expect("calendar")
    }

    #[test]
    fn mode_switch_recomputes_flags_in_place() {
        // 02:00 UTC on Dec 10 is Dec 9 in New York.
        let mut cal = build("2025-12-01", "2025-12-24", at(2025, 12, 10, 2), 24);
        assert_eq!(cal.today_day().map(|d| d.id), Some(9));
        assert_eq!(cal.active_day().map(|d| d.id), Some(9));
        cal.select(3);

        assert_eq!(cal.set_time_mode(TimeMode::Utc), 2);
        assert_eq!(cal.today_day().map(|d| d.id), Some(10));
        assert_eq!(cal.active_day().map(|d| d.id), Some(10));
        assert_eq!(cal.selected().map(|d| d.id), Some(3));

        assert_eq!(cal.set_time_mode(TimeMode::Local), 2);
        assert_eq!(cal.today_day().map(|d| d.id), Some(9));
        assert_eq!(cal.set_time_mode(TimeMode::Local), 0);
        assert_eq!(cal.days().len(), 24);
    }

    #[test]
    fn frozen_day_holds_across_mode_switches() {
        let settings = CalendarSettings {
            zone: LocalZone::Named(chrono_tz::Europe::Berlin),
            clock: Clock::parse_override("2025-12-05").expect("date override"),
            ..settings("2025-12-01", "2025-12-24", at(2025, 12, 1, 0))
        };
        let mut warnings: Vec<Diagnostic> = Vec::new();
        let mut cal = AdventCalendar::new(settings, tasks(24), &mut warnings).expect("calendar");
        assert_eq!(cal.today(), ymd(2025, 12, 5));
        assert_eq!(cal.active_day().map(|d| d.id), Some(5));

        assert_eq!(cal.set_time_mode(TimeMode::Utc), 0);
        assert_eq!(cal.today(), ymd(2025, 12, 5));
        assert_eq!(cal.today_day().map(|d| d.id), Some(5));
        assert_eq!(cal.active_day().map(|d| d.id), Some(5));

        assert_eq!(cal.set_time_mode(TimeMode::Local), 0);
        assert_eq!(cal.active_day().map(|d| d.id), Some(5));
    }

    #[test]
    fn refresh_today_only_reports_rollovers() {
        let mut cal = build("2025-12-01", "2025-12-24", at(2025, 12, 10, 12), 24);
        assert!(!cal.refresh_today());

        cal.set_clock(Clock::Fixed(at(2025, 12, 10, 20)));
        assert!(!cal.refresh_today());
        assert_eq!(cal.today(), ymd(2025, 12, 10));

        // set_clock already applied the new day, so a later poll is a no-op.
        cal.set_clock(Clock::Fixed(at(2025, 12, 11, 12)));
        assert_eq!(cal.today_day().map(|d| d.id), Some(11));
        assert!(!cal.refresh_today());
    }

    #[test]
    fn scroll_target_prefers_selection_then_today() {
        let mut cal = build("2025-12-01", "2025-12-24", at(2025, 12, 10, 12), 24);
        assert_eq!(cal.scroll_target(), Some(10));
        assert!(cal.select(20));
        assert_eq!(cal.scroll_target(), Some(20));
        assert!(!cal.select(99));
        assert_eq!(cal.scroll_target(), Some(20));
        cal.clear_selection();
        assert_eq!(cal.scroll_target(), Some(10));

        let before = build("2025-12-01", "2025-12-24", at(2025, 11, 1, 12), 24);
        assert_eq!(before.scroll_target(), Some(1));

        let after = build("2025-12-01", "2025-12-24", at(2026, 1, 5, 12), 24);
        assert_eq!(after.scroll_target(), Some(24));
    }

    #[test]
    fn month_sections_split_on_month_change() {
        let cal = build("2025-11-29", "2025-12-02", at(2025, 11, 1, 12), 4);
        let sections = cal.month_sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].label, "November 2025");
        assert_eq!((sections[0].start, sections[0].len), (0, 2));
        assert_eq!(sections[1].label, "December 2025");
        assert_eq!((sections[1].start, sections[1].len), (2, 2));

        assert!(cal.is_month_boundary(0));
        assert!(!cal.is_month_boundary(1));
        assert!(cal.is_month_boundary(2));
        assert!(!cal.is_month_boundary(4));
    }

    #[test]
    fn failed_rebuild_keeps_previous_state() {
        let mut cal = build("2025-12-01", "2025-12-24", at(2025, 12, 10, 12), 24);
        let mut warnings: Vec<Diagnostic> = Vec::new();
        assert!(cal.set_tasks(Vec::new(), &mut warnings).is_err());
        assert_eq!(cal.days().len(), 24);
        assert_eq!(cal.tasks().len(), 24);
    }

    #[test]
    fn rebuild_keeps_selection_by_date() {
        let mut cal = build("2025-12-01", "2025-12-24", at(2025, 12, 10, 12), 24);
        cal.select(5);
        let mut warnings: Vec<Diagnostic> = Vec::new();
        let range = DateRange::parse("2025-12-03", "2025-12-26").expect("range");
        cal.set_range(range, &mut warnings).expect("rebuild");

        assert!(warnings.is_empty());
        let selected = cal.selected().expect("selection survives");
        assert_eq!(selected.date, ymd(2025, 12, 5));
        assert_eq!(selected.id, 3);
        assert_eq!(cal.days()[0].task, "offer 0");
    }

    #[test]
    fn grid_and_labels_follow_first_day() {
        // 2025-10-01 is a Wednesday.
        let mut cal = build("2025-10-01", "2025-10-24", at(2025, 10, 1, 12), 24);
        assert_eq!(cal.grid().iter().filter(|c| c.is_placeholder()).count(), 2);
        assert_eq!(cal.weekday_labels()[0], "Mon");

        cal.set_first_day_of_week(FirstDayOfWeek::Sunday);
        assert_eq!(cal.grid().iter().filter(|c| c.is_placeholder()).count(), 3);
        assert_eq!(cal.weekday_labels()[0], "Sun");
    }
}
