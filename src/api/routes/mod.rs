//! API Routes
//!
//! Route handlers organized by functionality.

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod health;
