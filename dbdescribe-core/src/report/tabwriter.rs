//! Elastic tab-stop writer for the column table.
//!
//! Text is written as tab-terminated cells and newline-terminated lines.
//! On [`TabWriter::finish`] each column is padded to the widest cell in its
//! block of consecutive lines plus one space, and a `|` is emitted before
//! every cell except the first. The final cell of a line is never padded.
//!
//! A column block is a run of adjacent lines that all have a cell in that
//! column, so a line with fewer cells (for example a description containing
//! a raw newline) starts new blocks for the columns it lacks.

use std::fmt;

const PADDING: usize = 1;
const COLUMN_SEPARATOR: char = '|';

#[derive(Debug)]
struct Cell {
    text: String,
    width: usize,
}

/// Buffers cells and renders them aligned.
#[derive(Debug, Default)]
pub struct TabWriter {
    buf: String,
}

impl TabWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one line built from `cells`, separated by tabs.
    pub fn write_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut first = true;
        for cell in cells {
            if !first {
                self.buf.push('\t');
            }
            first = false;
            self.buf.push_str(cell.as_ref());
        }
        self.buf.push('\n');
    }

    /// Formats everything written so far and appends it to `out`.
    pub fn finish(self, out: &mut String) {
        let lines = split_lines(&self.buf);
        let mut widths = Vec::new();
        format_block(&lines, out, &mut widths, 0, lines.len());
    }
}

impl fmt::Write for TabWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.push_str(s);
        Ok(())
    }
}

fn split_lines(text: &str) -> Vec<Vec<Cell>> {
    let mut lines: Vec<Vec<Cell>> = Vec::new();
    let mut segments = text.split('\n').peekable();
    while let Some(segment) = segments.next() {
        let is_last = segments.peek().is_none();
        if is_last && segment.is_empty() {
            // trailing newline leaves an empty, cell-less final line
            lines.push(Vec::new());
            break;
        }
        lines.push(
            segment
                .split('\t')
                .map(|text| Cell {
                    text: text.to_string(),
                    width: text.chars().count(),
                })
                .collect(),
        );
    }
    lines
}

fn format_block(
    lines: &[Vec<Cell>],
    out: &mut String,
    widths: &mut Vec<usize>,
    start: usize,
    end: usize,
) {
    let column = widths.len();
    let mut line0 = start;
    let mut this = start;

    while this < end {
        // the last cell of a line does not belong to any column
        if column.saturating_add(1) >= lines[this].len() {
            this = this.saturating_add(1);
            continue;
        }

        write_lines(lines, out, widths, line0, this);
        line0 = this;

        let mut width = 0;
        while this < end && column.saturating_add(1) < lines[this].len() {
            width = width.max(lines[this][column].width.saturating_add(PADDING));
            this = this.saturating_add(1);
        }

        widths.push(width);
        format_block(lines, out, widths, line0, this);
        widths.pop();
        line0 = this;
    }

    write_lines(lines, out, widths, line0, end);
}

fn write_lines(lines: &[Vec<Cell>], out: &mut String, widths: &[usize], start: usize, end: usize) {
    for (i, line) in lines.iter().enumerate().take(end).skip(start) {
        for (j, cell) in line.iter().enumerate() {
            if j > 0 {
                out.push(COLUMN_SEPARATOR);
            }
            out.push_str(&cell.text);
            if let Some(&width) = widths.get(j) {
                pad(out, width.saturating_sub(cell.width));
            }
        }
        if i.saturating_add(1) < lines.len() {
            out.push('\n');
        }
    }
}

fn pad(out: &mut String, n: usize) {
    out.extend(std::iter::repeat_n(' ', n));
}
