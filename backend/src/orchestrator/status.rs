//! Status rows and sinks
//!
//! The engine emits one [`StatusRow`] per logging interval. The header is
//! written once before the first row. Sinks are injected, so the same run
//! can print to a CSV file, a terminal, or an in-memory buffer for tests.

use crate::core::time::ElapsedTime;
use crate::models::state::SimulationState;
use std::io::{self, Write};
use std::sync::Arc;

/// Fixed time columns preceding any extra columns
pub const TIME_COLUMNS: [&str; 7] = ["Tick", "Second", "Min", "Hour", "Day", "Month", "Year"];

/// Extra column value read from the state when a row is emitted
pub type ColumnFn = Arc<dyn Fn(&SimulationState) -> f64 + Send + Sync>;

/// Named extra column
#[derive(Clone)]
pub struct StatusColumn {
    pub name: String,
    pub value: ColumnFn,
}

impl StatusColumn {
    pub fn new<F>(name: impl Into<String>, value: F) -> Self
    where
        F: Fn(&SimulationState) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            value: Arc::new(value),
        }
    }
}

impl std::fmt::Debug for StatusColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusColumn").field("name", &self.name).finish()
    }
}

/// One column per recorded KPI, showing its latest sample (0 before the first)
pub fn kpi_columns(metrics: &[&str]) -> Vec<StatusColumn> {
    metrics
        .iter()
        .map(|metric| {
            let metric = metric.to_string();
            StatusColumn::new(metric.clone(), move |state: &SimulationState| {
                state
                    .kpis()
                    .latest(&metric)
                    .ok()
                    .flatten()
                    .unwrap_or(0.0)
            })
        })
        .collect()
}

/// A single emitted status row
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRow {
    pub tick: usize,
    pub elapsed: ElapsedTime,
    pub extras: Vec<(String, f64)>,
}

impl StatusRow {
    pub fn capture(state: &SimulationState, columns: &[StatusColumn]) -> Self {
        Self {
            tick: state.tick(),
            elapsed: state.time().elapsed(),
            extras: columns
                .iter()
                .map(|c| (c.name.clone(), (c.value)(state)))
                .collect(),
        }
    }

    pub fn header(&self) -> Vec<String> {
        TIME_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.extras.iter().map(|(name, _)| name.clone()))
            .collect()
    }

    pub fn values(&self) -> Vec<f64> {
        let e = &self.elapsed;
        let mut values = vec![
            self.tick as f64,
            e.seconds,
            e.minutes,
            e.hours,
            e.days,
            e.months,
            e.years,
        ];
        values.extend(self.extras.iter().map(|(_, v)| *v));
        values
    }

    /// Short human-readable line for log output
    pub fn console_line(&self) -> String {
        let mut line = format!(
            "Tick={} ({} d, {} mo, {} y)",
            self.tick,
            format_g(self.elapsed.days),
            format_g(self.elapsed.months),
            format_g(self.elapsed.years)
        );
        for (name, value) in &self.extras {
            line.push_str(&format!(", {}={}", name, format_g(*value)));
        }
        line
    }
}

/// Destination for status output
pub trait StatusSink {
    fn write_header(&mut self, columns: &[String]) -> io::Result<()>;
    fn write_row(&mut self, row: &StatusRow) -> io::Result<()>;
}

impl<S: StatusSink + ?Sized> StatusSink for Box<S> {
    fn write_header(&mut self, columns: &[String]) -> io::Result<()> {
        (**self).write_header(columns)
    }

    fn write_row(&mut self, row: &StatusRow) -> io::Result<()> {
        (**self).write_row(row)
    }
}

/// Keeps every header and row in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub headers: Vec<Vec<String>>,
    pub rows: Vec<StatusRow>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusSink for MemorySink {
    fn write_header(&mut self, columns: &[String]) -> io::Result<()> {
        self.headers.push(columns.to_vec());
        Ok(())
    }

    fn write_row(&mut self, row: &StatusRow) -> io::Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }
}

/// Writes comma-separated rows to any writer
pub struct CsvSink<W: Write> {
    writer: W,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StatusSink for CsvSink<W> {
    fn write_header(&mut self, columns: &[String]) -> io::Result<()> {
        writeln!(self.writer, "{}", columns.join(", "))
    }

    fn write_row(&mut self, row: &StatusRow) -> io::Result<()> {
        let cells: Vec<String> = row.values().into_iter().map(format_g).collect();
        writeln!(self.writer, "{}", cells.join(", "))?;
        self.writer.flush()
    }
}

/// Format like C's `%g`: six significant digits, trailing zeros trimmed,
/// exponent notation outside [1e-4, 1e6)
pub fn format_g(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let exponent = value.abs().log10().floor() as i32;
    if (-4..6).contains(&exponent) {
        let decimals = (5 - exponent).max(0) as usize;
        trim_zeros(format!("{:.*}", decimals, value))
    } else {
        let formatted = format!("{:.5e}", value);
        let (mantissa, exp) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let exp: i32 = exp.parse().unwrap_or(0);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa.to_string()), sign, exp.abs())
    }
}

fn trim_zeros(s: String) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_g() {
        assert_eq!(format_g(0.0), "0");
        assert_eq!(format_g(24.0), "24");
        assert_eq!(format_g(86400.0), "86400");
        assert_eq!(format_g(0.5), "0.5");
        assert_eq!(format_g(1.0 / 3.0), "0.333333");
        assert_eq!(format_g(1_000_000.0), "1e+06");
        assert_eq!(format_g(150e6), "1.5e+08");
        assert_eq!(format_g(-2.5), "-2.5");
        assert_eq!(format_g(0.00001), "1e-05");
    }

    #[test]
    fn test_csv_sink_output() {
        let mut sink = CsvSink::new(Vec::new());
        let row = StatusRow {
            tick: 24,
            elapsed: ElapsedTime::from_seconds(86400),
            extras: vec![("researchers".to_string(), 2.0)],
        };
        sink.write_header(&row.header()).unwrap();
        sink.write_row(&row).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Tick, Second, Min, Hour, Day, Month, Year, researchers"
        );
        assert!(lines[1].starts_with("24, 86400, 1440, 24, 1, "));
        assert!(lines[1].ends_with(", 2"));
    }
}
