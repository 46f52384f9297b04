//! Structural marks produced by the scanner

/// The only characters the record engine cares about outside comments and literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    /// `{`
    Open,
    /// `}`
    Close,
    /// `.` introducing a designated initializer
    Dot,
    Eof,
}

/// Byte offsets of a mark in the scanned source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A structural mark with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub kind: MarkKind,
    pub span: Span,
}
