//! Plain text formatter: one `<rule> <namespace> <path>` line per record.

use super::escape::escape_bytes;
use super::Formatter;
use colored::Colorize;
use sigscan_core::{Outcome, ScanRecord};
use std::io::{self, Write};

pub struct PlainFormatter {
    print_strings: bool,
    color: bool,
}

impl PlainFormatter {
    pub fn new(print_strings: bool, color: bool) -> Self {
        Self {
            print_strings,
            color,
        }
    }
}

impl Formatter for PlainFormatter {
    fn write_record(&mut self, out: &mut dyn Write, record: &ScanRecord) -> io::Result<()> {
        let path = record.path.display();
        let hit = match &record.outcome {
            Outcome::Hit(hit) => hit,
            Outcome::NoHit => {
                let none = if self.color {
                    "None None".dimmed().to_string()
                } else {
                    "None None".to_string()
                };
                return writeln!(out, "{} {}", none, path);
            }
        };

        if self.color {
            writeln!(out, "{} {} {}", hit.rule.green().bold(), hit.namespace, path)?;
        } else {
            writeln!(out, "{} {} {}", hit.rule, hit.namespace, path)?;
        }

        if self.print_strings {
            for s in &hit.strings {
                writeln!(
                    out,
                    "0x{:x}:{}: {}",
                    s.offset,
                    s.identifier,
                    escape_bytes(&s.data)
                )?;
            }
        }
        Ok(())
    }
}
