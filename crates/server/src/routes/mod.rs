//! HTTP route handlers.

pub mod article;
pub mod health;
pub mod root;
