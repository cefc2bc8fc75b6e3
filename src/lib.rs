pub mod aggregate;
pub mod app;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod logging;
pub mod pipeline;
pub mod records;
pub mod report;
pub mod ui;
pub mod windows;
