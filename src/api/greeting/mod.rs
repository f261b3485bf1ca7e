//! The greeting API.

pub mod greeting_api;
pub mod greeting_service;
