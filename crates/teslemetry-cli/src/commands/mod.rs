//! Command implementations for the teslemetry CLI

pub mod fields;
pub mod monitor;
pub mod signals;
pub mod vehicle_config;

pub use fields::add_field;
pub use monitor::monitor;
pub use signals::signals;
pub use vehicle_config::{replace_config, show_config};
