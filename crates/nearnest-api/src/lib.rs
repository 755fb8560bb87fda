//! Client for the managed backend: GoTrue auth, PostgREST tables and
//! Realtime change notifications.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod realtime;
pub mod rest;
pub mod supabase;

pub use backend::Backend;
pub use config::BackendConfig;
pub use error::ApiError;
pub use realtime::Subscription;
pub use supabase::SupabaseBackend;
