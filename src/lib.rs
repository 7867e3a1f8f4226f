//! streamfinder - where to watch a movie or show, per country
//!
//! Drives a headless browser through JustWatch search results and turns the
//! offers on the page into typed [`MediaEntry`] values.

pub mod browser;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod justwatch;
pub mod server;

pub use config::Config;
pub use error::LookupError;
pub use justwatch::{Country, MediaEntry, Offer, Session};
