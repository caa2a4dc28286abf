// Library surface for the binary and for headless/integration tests.
pub mod accounts;
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod form;
pub mod logging;
pub mod quotes;
pub mod reporting;
pub mod results;
pub mod runtime;
pub mod session;
pub mod ui;
pub mod util;
