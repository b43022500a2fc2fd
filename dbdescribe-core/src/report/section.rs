//! Labeled list sections that disappear when empty.

/// A report section whose header is only materialized once a row exists.
///
/// Rows are rendered into a private buffer; [`Section::flush_into`] copies
/// header and rows into the report only if at least one row was pushed.
#[derive(Debug)]
pub struct Section {
    header: &'static str,
    body: String,
}

impl Section {
    /// Starts an empty section with the given header line (no trailing newline).
    pub fn new(header: &'static str) -> Self {
        Self {
            header,
            body: String::new(),
        }
    }

    /// Appends one tab-indented row (no trailing newline).
    pub fn push_row(&mut self, row: &str) {
        self.body.push('\t');
        self.body.push_str(row);
        self.body.push('\n');
    }

    /// Returns true if no rows were pushed.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Writes the section into `out` unless it is empty.
    pub fn flush_into(self, out: &mut String) {
        if self.is_empty() {
            return;
        }
        out.push_str(self.header);
        out.push('\n');
        out.push_str(&self.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_section_writes_nothing() {
        let mut out = String::from("Table \"public.t\"\n");
        Section::new("Indexes:").flush_into(&mut out);
        assert_eq!(out, "Table \"public.t\"\n");
    }

    #[test]
    fn test_section_with_rows() {
        let mut section = Section::new("Check constraints:");
        section.push_row("\"qty_positive\" CHECK (qty > 0)");
        section.push_row("\"price_positive\" CHECK (price > 0)");
        assert!(!section.is_empty());

        let mut out = String::new();
        section.flush_into(&mut out);
        assert_eq!(
            out,
            "Check constraints:\n\t\"qty_positive\" CHECK (qty > 0)\n\t\"price_positive\" CHECK (price > 0)\n"
        );
    }
}
