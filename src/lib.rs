//! A web service that returns personalized greetings.

pub mod api;
pub mod app;
pub mod infra;
