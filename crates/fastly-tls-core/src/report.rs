//! Human-facing output of a lifecycle operation

use crate::challenge::{self, RecordDisplay};
use crate::model::Challenge;

/// One piece of a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Plain status line
    Message(String),
    /// Heading line followed by a blank line
    Section(String),
    /// DNS record to publish, tagged with its challenge type
    Record { kind: String, display: RecordDisplay },
    /// Benign terminal outcome, e.g. a domain without TLS
    Warning(String),
}

/// Ordered report returned by every lifecycle operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    entries: Vec<Entry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(&mut self, text: impl Into<String>) {
        self.entries.push(Entry::Message(text.into()));
    }

    pub fn section(&mut self, text: impl Into<String>) {
        self.entries.push(Entry::Section(text.into()));
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.entries.push(Entry::Warning(text.into()));
    }

    /// Append every challenge of type `kind`
    pub fn records(&mut self, challenges: &[Challenge], kind: &str) {
        for selected in challenge::select_by_type(challenges, kind) {
            self.entries.push(Entry::Record {
                kind: selected.kind.clone(),
                display: challenge::format(selected),
            });
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Challenge types of the records in this report, in order
    pub fn record_kinds(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Record { kind, .. } => Some(kind.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_record(&self, kind: &str) -> bool {
        self.record_kinds().contains(&kind)
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Warning(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            match entry {
                Entry::Message(text) => writeln!(f, "{}", text)?,
                Entry::Section(text) => writeln!(f, "{}\n", text)?,
                Entry::Record { display, .. } => writeln!(f, "{}\n", display)?,
                Entry::Warning(text) => writeln!(f, "Warning: {}", text)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{MANAGED_DNS, MANAGED_HTTP_CNAME};

    #[test]
    fn test_render() {
        let challenges = vec![Challenge {
            kind: MANAGED_HTTP_CNAME.to_string(),
            record_type: "CNAME".to_string(),
            record_name: "www.example.org".to_string(),
            values: vec!["j.sni.global.fastly.net".to_string()],
        }];

        let mut report = Report::new();
        report.section("To use the certificate configure the following CNAME record");
        report.records(&challenges, MANAGED_HTTP_CNAME);
        report.records(&challenges, MANAGED_DNS);
        report.message("done");

        assert_eq!(report.record_kinds(), vec![MANAGED_HTTP_CNAME]);
        assert!(!report.has_record(MANAGED_DNS));
        assert_eq!(
            report.to_string(),
            "To use the certificate configure the following CNAME record\n\n\
             DNS Record Type: CNAME\n\
             DNS Record Name: www.example.org\n\
             DNS Record value(s): j.sni.global.fastly.net\n\n\
             done\n"
        );
    }

    #[test]
    fn test_warnings() {
        let mut report = Report::new();
        assert!(report.is_empty());
        report.warning("Domain www.example.org does not support TLS.");
        assert_eq!(
            report.warnings(),
            vec!["Domain www.example.org does not support TLS."]
        );
        assert_eq!(
            report.to_string(),
            "Warning: Domain www.example.org does not support TLS.\n"
        );
    }
}
