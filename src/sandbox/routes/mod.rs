//! Sandbox route handlers

pub mod auth;
pub mod health;
pub mod portfolios;
pub mod upload;
