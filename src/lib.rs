pub mod app;
pub mod config;
pub mod council;
pub mod error;
pub mod meals;
pub mod state;
pub mod users;
