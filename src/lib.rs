pub mod api;
pub mod config;
pub mod humanize;
pub mod imaging;
pub mod observability;
