pub mod config;
pub mod error;
pub mod normalize;
pub mod table;
pub mod types;

pub use config::FileConfig;
pub use error::PulseError;
pub use normalize::*;
pub use table::{cell, Row, Table};
pub use types::*;
