//! Locates the transaction table on a page.
//!
//! The table starts on the line after the column header and ends at the first
//! footer marker (or the end of the page). A page has at most one table.

use std::ops::Range;

use crate::format::StatementFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Header,
    Footer,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    SeekingHeader,
    InTable { start: usize },
    Closed { start: usize, end: usize },
}

impl SegmenterState {
    /// Transition on the line at `index`.
    pub fn next(self, index: usize, class: LineClass) -> Self {
        match (self, class) {
            (SegmenterState::SeekingHeader, LineClass::Header) => {
                SegmenterState::InTable { start: index + 1 }
            }
            (SegmenterState::SeekingHeader, _) => self,
            (SegmenterState::InTable { start }, LineClass::Footer) => {
                SegmenterState::Closed { start, end: index }
            }
            (SegmenterState::InTable { .. }, _) => self,
            (SegmenterState::Closed { .. }, _) => self,
        }
    }

    /// Line range once the page is exhausted.
    pub fn finish(self, line_count: usize) -> Option<Range<usize>> {
        match self {
            SegmenterState::SeekingHeader => None,
            SegmenterState::InTable { start } => Some(start..line_count.max(start)),
            SegmenterState::Closed { start, end } => Some(start..end),
        }
    }
}

pub struct TableSegmenter<'f> {
    format: &'f StatementFormat,
}

impl<'f> TableSegmenter<'f> {
    pub fn new(format: &'f StatementFormat) -> Self {
        Self { format }
    }

    pub fn classify(&self, line: &str) -> LineClass {
        if self.format.table_header.is_match(line) {
            LineClass::Header
        } else if self.format.is_footer(line) {
            LineClass::Footer
        } else {
            LineClass::Body
        }
    }

    pub fn segment<S: AsRef<str>>(&self, lines: &[S]) -> Option<Range<usize>> {
        let mut state = SegmenterState::SeekingHeader;
        for (i, line) in lines.iter().enumerate() {
            state = state.next(i, self.classify(line.as_ref()));
            if matches!(state, SegmenterState::Closed { .. }) {
                break;
            }
        }
        state.finish(lines.len())
    }
}
