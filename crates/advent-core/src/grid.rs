use chrono::{Datelike, NaiveDate, Weekday};

use crate::calendar::CalendarDay;

pub const GRID_COLUMNS: usize = 7;

/// A slot in the weekday-aligned grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridCell<'a, T> {
    /// Padding before the first real day. Carries no date.
    Placeholder,
    Day(&'a CalendarDay<T>),
}

impl<'a, T> GridCell<'a, T> {
    pub fn day(&self) -> Option<&'a CalendarDay<T>> {
        match self {
            GridCell::Placeholder => None,
            GridCell::Day(day) => Some(day),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, GridCell::Placeholder)
    }
}

/// Number of empty cells needed so `first_date` lands in its weekday column
/// when the grid starts on `first_day_of_week`.
pub fn leading_placeholders(first_date: NaiveDate, first_day_of_week: Weekday) -> usize {
    let weekday = first_date.weekday().num_days_from_sunday() as usize;
    let first = first_day_of_week.num_days_from_sunday() as usize;
    (weekday + GRID_COLUMNS - first) % GRID_COLUMNS
}

/// Leading placeholders followed by every day in order.
pub fn build_grid<T>(days: &[CalendarDay<T>], first_day_of_week: Weekday) -> Vec<GridCell<'_, T>> {
    let Some(first) = days.first() else {
        return Vec::new();
    };
    let offset = leading_placeholders(first.date, first_day_of_week);
    std::iter::repeat_with(|| GridCell::Placeholder)
        .take(offset)
        .chain(days.iter().map(GridCell::Day))
        .collect()
}

/// Splits grid cells into rows of seven. The last row may be shorter.
pub fn grid_rows<'g, 'a, T>(cells: &'g [GridCell<'a, T>]) -> impl Iterator<Item = &'g [GridCell<'a, T>]> {
    cells.chunks(GRID_COLUMNS)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Weekday};

    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn day(id: u32, date: NaiveDate) -> CalendarDay<u32> {
        CalendarDay {
            id,
            date,
            day_of_month: date.day(),
            is_today: false,
            is_active: false,
            is_selected: false,
            has_task: true,
            task: id,
        }
    }

    #[test]
    fn wednesday_start_with_monday_first_needs_two_cells() {
        // 2025-10-01 is a Wednesday.
        let wednesday = ymd(2025, 10, 1);
        assert_eq!(wednesday.weekday(), Weekday::Wed);
        assert_eq!(leading_placeholders(wednesday, Weekday::Mon), 2);
        assert_eq!(leading_placeholders(wednesday, Weekday::Sun), 3);
    }

    #[test]
    fn no_padding_when_first_day_matches() {
        // 2025-12-01 is a Monday.
        assert_eq!(leading_placeholders(ymd(2025, 12, 1), Weekday::Mon), 0);
        assert_eq!(leading_placeholders(ymd(2025, 12, 1), Weekday::Sun), 1);
        // 2025-11-30 is a Sunday.
        assert_eq!(leading_placeholders(ymd(2025, 11, 30), Weekday::Mon), 6);
    }

    #[test]
    fn grid_places_days_after_placeholders() {
        let days: Vec<CalendarDay<u32>> = (0..10)
            .map(|i| day(i + 1, ymd(2025, 10, 1 + i)))
            .collect();
        let cells = build_grid(&days, Weekday::Mon);

        assert_eq!(cells.len(), 12);
        assert!(cells[0].is_placeholder());
        assert!(cells[1].is_placeholder());
        assert_eq!(cells[2].day().map(|d| d.id), Some(1));
        assert_eq!(cells[11].day().map(|d| d.id), Some(10));

        let rows: Vec<usize> = grid_rows(&cells).map(|row| row.len()).collect();
        assert_eq!(rows, vec![7, 5]);
    }

    #[test]
    fn empty_day_list_gives_empty_grid() {
        let days: Vec<CalendarDay<u32>> = Vec::new();
        assert!(build_grid(&days, Weekday::Sun).is_empty());
    }
}
