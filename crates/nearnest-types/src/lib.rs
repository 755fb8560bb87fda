//! Shared data models for the NearNest client.
//!
//! Row types mirror the backend tables, payload types mirror the request
//! bodies the client sends, and event types cover auth and realtime frames.

pub mod api;
pub mod events;
pub mod models;
