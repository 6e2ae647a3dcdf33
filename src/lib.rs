pub mod api;
pub mod config;
pub mod druid;
pub mod error;
pub mod history;
pub mod tables;
pub mod validation;
