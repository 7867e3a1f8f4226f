//! JustWatch-specific modules: page contract, extraction, models and sessions.

pub mod country;
pub mod extract;
pub mod models;
pub mod selectors;
pub mod session;

pub use country::Country;
pub use models::{MediaEntry, Offer};
pub use session::{Session, SessionOptions, Timeouts};
