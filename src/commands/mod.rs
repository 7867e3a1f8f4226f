//! CLI command implementations.

pub mod replay;
pub mod search;
pub mod serve;

pub use replay::ReplayCommand;
pub use search::SearchCommand;
pub use serve::ServeCommand;
