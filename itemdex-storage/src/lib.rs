//! itemdex Storage - Record Repository
//!
//! Loads the identifier header, record table, table header, description store
//! and icon directory of a decomp tree into one consistent snapshot, applies
//! edits in memory and writes every affected file back out.

pub mod commit;
pub mod icon;
pub mod repository;

pub use commit::{Commit, StagedWrite};
pub use icon::prepare_icon;
pub use repository::{DescriptionView, NewRecordSymbols, RecordRepository};
