//! itemdex Text - record-store text engine
//!
//! Parses and patches the hand-authored files of a decomp item database
//! without a general grammar, preserving every byte it does not mean to change.
//!
//! Architecture:
//! ```text
//! record table source
//!     ↓
//! Scanner (braces outside comments and literals)
//!     ↓
//! BlockExtractor (record spans)  ──→  GlyphCodec (names)
//!     ↓
//! RecordParser / RecordWriter (minimal-diff rewrite)
//!
//! table header ──→ SymbolTable ──→ DescriptionStore ←── description store
//! id header    ──→ IdAllocator
//! graphics     ──→ GraphicsIndex
//! ```

pub mod descriptions;
pub mod glyph;
pub mod graphics;
pub mod ids;
pub mod lexer;
pub mod record;
pub mod symbols;

// Re-export key types for convenience
pub use descriptions::{DescriptionChange, DescriptionStore};
pub use graphics::GraphicsIndex;
pub use ids::IdAllocator;
pub use record::{
    extract_records, extract_spans, find_array, parse_record, render_literal, render_record,
    ArrayLiteral, ParsedRecord, RecordSpan,
};
pub use symbols::{Promotion, SymbolTable};
