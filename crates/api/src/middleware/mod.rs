//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the acting user, taken from identity headers set
//!   by the upstream identity provider.

pub mod auth;
