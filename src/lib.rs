// Library surface for headless/integration tests and reuse.
// The binary only adds terminal setup and the event loop.
pub mod app;
pub mod app_dirs;
pub mod chart;
pub mod clock;
pub mod config;
pub mod decks;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod question;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod shuffle;
pub mod store;
pub mod ui;
