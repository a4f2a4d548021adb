// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds terminal setup and argument parsing.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod export;
pub mod history;
pub mod i18n;
pub mod logging;
pub mod report;
pub mod runtime;
pub mod store;
pub mod tracker;
pub mod ui;
pub mod util;
