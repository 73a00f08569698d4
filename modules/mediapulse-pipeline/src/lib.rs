pub mod aggregate;
pub mod alerts;
pub mod classify;
pub mod edit_merge;
pub mod intake;
pub mod pipeline;
pub mod resolver;
pub mod rolling_index;
pub mod roster;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod theme;
pub mod traits;
