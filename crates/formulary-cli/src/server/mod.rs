//! JSON API server for a formulary session.

pub mod app;
pub mod error;
pub mod handlers;
pub mod state;
