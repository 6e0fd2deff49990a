//! weatherdash library
//!
//! Fetch controller, presentation mapping and terminal UI for the weather
//! dashboard. The binary in `main.rs` wires these together.

pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod data;
pub mod logging;
pub mod theme;
pub mod ui;
