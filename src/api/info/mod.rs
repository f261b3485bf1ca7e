//! The info API.

pub mod info_api;
