pub mod config;
pub mod errors;
pub mod logging;
pub mod store;
pub mod views;
pub mod web;
