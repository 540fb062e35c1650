//! API route handlers.

pub mod generate;
pub mod health;
pub mod models;
