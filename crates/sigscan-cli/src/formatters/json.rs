//! JSON lines formatter: one object per record.

use super::escape::escape_bytes;
use super::Formatter;
use serde::Serialize;
use sigscan_core::{Outcome, ScanRecord};
use std::io::{self, Write};

pub struct JsonFormatter {
    print_strings: bool,
}

impl JsonFormatter {
    pub fn new(print_strings: bool) -> Self {
        Self { print_strings }
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    rule: Option<&'a str>,
    namespace: Option<&'a str>,
    path: String,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    strings: Option<Vec<JsonString<'a>>>,
}

#[derive(Serialize)]
struct JsonString<'a> {
    offset: u64,
    identifier: &'a str,
    data: String,
}

impl Formatter for JsonFormatter {
    fn write_record(&mut self, out: &mut dyn Write, record: &ScanRecord) -> io::Result<()> {
        let hit = record.outcome.hit();
        let strings = match (&record.outcome, self.print_strings) {
            (Outcome::Hit(hit), true) => Some(
                hit.strings
                    .iter()
                    .map(|s| JsonString {
                        offset: s.offset,
                        identifier: &s.identifier,
                        data: escape_bytes(&s.data),
                    })
                    .collect(),
            ),
            _ => None,
        };

        let json = JsonRecord {
            rule: record.outcome.rule(),
            namespace: record.outcome.namespace(),
            path: record.path.to_string_lossy().into_owned(),
            tags: hit.map(|h| h.tags.as_slice()).unwrap_or(&[]),
            strings,
        };

        serde_json::to_writer(&mut *out, &json)?;
        writeln!(out)
    }
}
