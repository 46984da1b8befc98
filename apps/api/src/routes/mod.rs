//! API routes

pub mod admin;
pub mod calculate;
pub mod contract;
pub mod health;
