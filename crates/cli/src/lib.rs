//! Public library modules for the CLI crate
pub mod app;
pub mod paths;
pub mod report;
