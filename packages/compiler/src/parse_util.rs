//! Parse Utilities
//!
//! Source files, locations and spans used to attach diagnostics to template text.

use std::fmt;
use std::sync::Arc;

use crate::expression_parser::ast::AbsoluteSourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseSourceFile {
    pub content: String,
    pub url: String,
}

impl ParseSourceFile {
    pub fn new(content: String, url: String) -> Self {
        ParseSourceFile { content, url }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseLocation {
    pub file: Arc<ParseSourceFile>,
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl ParseLocation {
    pub fn new(file: Arc<ParseSourceFile>, offset: usize, line: usize, col: usize) -> Self {
        ParseLocation {
            file,
            offset,
            line,
            col,
        }
    }

    /// Computes line and column (both zero based) for an absolute offset into `file`.
    pub fn from_offset(file: Arc<ParseSourceFile>, offset: usize) -> Self {
        let clamped = offset.min(file.content.len());
        let mut line = 0;
        let mut col = 0;
        for (idx, ch) in file.content.char_indices() {
            if idx >= clamped {
                break;
            }
            if ch == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        ParseLocation::new(file, clamped, line, col)
    }
}

impl fmt::Display for ParseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.file.url, self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseSourceSpan {
    pub start: ParseLocation,
    pub end: ParseLocation,
}

impl ParseSourceSpan {
    pub fn new(start: ParseLocation, end: ParseLocation) -> Self {
        ParseSourceSpan { start, end }
    }

    /// Resolves an absolute offset span against the file it was parsed from.
    pub fn from_absolute(file: &Arc<ParseSourceFile>, span: AbsoluteSourceSpan) -> Self {
        ParseSourceSpan::new(
            ParseLocation::from_offset(Arc::clone(file), span.start),
            ParseLocation::from_offset(Arc::clone(file), span.end.max(span.start)),
        )
    }

    /// The source text covered by this span.
    pub fn text(&self) -> &str {
        let content = &self.start.file.content;
        let start = self.start.offset.min(content.len());
        let end = self.end.offset.clamp(start, content.len());
        content.get(start..end).unwrap_or("")
    }
}

impl fmt::Display for ParseSourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}
