//! Screens and state of the NearNest client, independent of any UI.
//!
//! Each component owns its view state, talks to the backend through
//! [`nearnest_api::Backend`], and re-fetches whole result sets instead of
//! merging changes.

pub mod composer;
pub mod display;
pub mod dm;
pub mod error;
pub mod feed;
pub mod geo;
pub mod location;
pub mod nearby;
pub mod profile;
pub mod session;
pub mod throttle;
pub mod validate;

pub use error::ClientError;
