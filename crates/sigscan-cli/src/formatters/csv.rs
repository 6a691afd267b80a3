//! CSV formatter: `rule,namespace,path`, empty fields for files without hits.

use super::Formatter;
use sigscan_core::ScanRecord;
use std::borrow::Cow;
use std::io::{self, Write};

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn write_record(&mut self, out: &mut dyn Write, record: &ScanRecord) -> io::Result<()> {
        let path = record.path.to_string_lossy();
        write!(
            out,
            "{},{},{}\r\n",
            quote(record.outcome.rule().unwrap_or("")),
            quote(record.outcome.namespace().unwrap_or("")),
            quote(&path)
        )
    }
}

/// Quote a field when it contains a delimiter, quote or line break
fn quote(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
