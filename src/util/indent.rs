use std::fmt;

pub const INDENT_WIDTH: usize = 4;

/// A writer that prefixes every non-empty line with the current indentation.
///
/// Indentation is applied lazily, when the first character of a line is
/// written, so changing the level in the middle of a line affects the next
/// one. Blank lines carry no trailing whitespace.
pub struct IndentWriter<W> {
    inner: W,
    level: usize,
    at_line_start: bool,
}

impl<W: fmt::Write> IndentWriter<W> {
    pub fn new(inner: W) -> IndentWriter<W> {
        IndentWriter {
            inner,
            level: 0,
            at_line_start: true,
        }
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    /// Decreases the level. Saturates at zero.
    pub fn unindent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: fmt::Write> fmt::Write for IndentWriter<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for line in s.split_inclusive('\n') {
            if self.at_line_start && line != "\n" {
                write!(self.inner, "{:width$}", "", width = self.level * INDENT_WIDTH)?;
            }
            self.inner.write_str(line)?;
            self.at_line_start = line.ends_with('\n');
        }
        Ok(())
    }
}
