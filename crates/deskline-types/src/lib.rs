//! Shared types for the Deskline helpdesk backend.
//!
//! `models` holds the closed domain enums and the resource views returned by
//! the API; `api` holds request bodies and the response envelope.

pub mod api;
pub mod models;
