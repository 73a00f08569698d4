//! File-backed collaborators for the daily pipeline: JSON tables, the rolling
//! index file, the editable row store, raw-result day files and the alert
//! ledger. Every write goes through [`json_file::write_atomic`] so a failed
//! run never leaves a half-written file behind.

pub mod editable;
pub mod index_file;
pub mod json_file;
pub mod ledger;
pub mod source;
pub mod table_file;

pub use editable::EditableDir;
pub use index_file::RollingIndexFile;
pub use ledger::AlertLedgerFile;
pub use source::JsonlSource;
pub use table_file::{read_table, write_table};
