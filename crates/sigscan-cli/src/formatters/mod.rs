//! Output formatters for scan records.

pub mod csv;
pub mod escape;
pub mod json;
pub mod plain;

pub use self::csv::CsvFormatter;
pub use escape::escape_bytes;
pub use json::JsonFormatter;
pub use plain::PlainFormatter;

use sigscan_core::ScanRecord;
use std::io::{self, Write};

/// Trait for rendering scan records as they stream in
pub trait Formatter {
    /// Write one record
    fn write_record(&mut self, out: &mut dyn Write, record: &ScanRecord) -> io::Result<()>;
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Csv,
    Json,
}

/// Build the formatter for `format`
pub fn formatter_for(format: OutputFormat, print_strings: bool, color: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Plain => Box::new(PlainFormatter::new(print_strings, color)),
        OutputFormat::Csv => Box::new(CsvFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(print_strings)),
    }
}
