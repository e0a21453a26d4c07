use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::content::TaskContent;
use crate::controller::AdventCalendar;
use crate::grid::{self, GridCell};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self {
            color: color && io::stdout().is_terminal(),
        }
    }

    #[tracing::instrument(skip_all)]
    pub fn write_days<W: Write>(
        &self,
        mut out: W,
        cal: &AdventCalendar<TaskContent>,
    ) -> anyhow::Result<()> {
        let facade = cal.facade();
        let headers = vec![
            "ID".to_string(),
            "Date".to_string(),
            "Day".to_string(),
            "Status".to_string(),
            "Task".to_string(),
        ];

        let mut rows = Vec::with_capacity(cal.days().len());
        for (i, day) in cal.days().iter().enumerate() {
            if cal.is_month_boundary(i) {
                rows.push(vec![
                    String::new(),
                    self.paint(&facade.month_label(day.date), "1"),
                    String::new(),
                    String::new(),
                    String::new(),
                ]);
            }

            let mut flags = Vec::new();
            if day.is_today {
                flags.push("today");
            }
            if day.is_active {
                flags.push("active");
            }
            if day.is_selected {
                flags.push("selected");
            }
            if facade.is_past(day.date) {
                flags.push("past");
            }
            let status = flags.join(",");
            let status = if day.is_today {
                self.paint(&status, "32")
            } else {
                status
            };

            rows.push(vec![
                self.paint(&day.id.to_string(), "33"),
                facade.format(day.date),
                facade.display_short(day.date),
                status,
                day.task.title.clone(),
            ]);
        }

        write_table(&mut out, headers, rows)
    }

    pub fn write_days_json<W: Write>(
        &self,
        mut out: W,
        cal: &AdventCalendar<TaskContent>,
    ) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut out, cal.days())?;
        writeln!(out)?;
        Ok(())
    }

    /// Seven-column month grid. Today is marked with `*`.
    #[tracing::instrument(skip_all)]
    pub fn write_grid<W: Write>(
        &self,
        mut out: W,
        cal: &AdventCalendar<TaskContent>,
    ) -> anyhow::Result<()> {
        let title = cal
            .month_sections()
            .into_iter()
            .map(|section| section.label)
            .collect::<Vec<_>>()
            .join(" - ");
        writeln!(out, "{}", self.paint(&title, "1"))?;

        let labels = cal.weekday_labels();
        let cells = cal.grid();
        let texts: Vec<String> = cells.iter().map(cell_text).collect();
        let width = labels
            .iter()
            .chain(texts.iter())
            .map(|text| UnicodeWidthStr::width(text.as_str()))
            .max()
            .unwrap_or(2);

        let header: Vec<String> = labels.iter().map(|label| pad_left(label, width)).collect();
        writeln!(out, "{}", header.join(" ").trim_end())?;

        for (row_cells, row_texts) in grid::grid_rows(&cells).zip(texts.chunks(grid::GRID_COLUMNS)) {
            let line: Vec<String> = row_cells
                .iter()
                .zip(row_texts)
                .map(|(cell, text)| {
                    let padded = pad_left(text, width);
                    match cell.day() {
                        Some(day) if day.is_today => self.paint(&padded, "32"),
                        _ => padded,
                    }
                })
                .collect();
            writeln!(out, "{}", line.join(" ").trim_end())?;
        }

        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn cell_text<T>(cell: &GridCell<'_, T>) -> String {
    match cell.day() {
        None => String::new(),
        Some(day) if day.is_today => format!("{}*", day.day_of_month),
        Some(day) => day.day_of_month.to_string(),
    }
}

fn pad_left(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(text);
    format!("{}{}", " ".repeat(width.saturating_sub(visible)), text)
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        let line: String = row
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
                let padding = widths[idx].saturating_sub(visible_width);
                format!("{}{} ", cell, " ".repeat(padding))
            })
            .collect();
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
