//! Signed access tokens for joining real-time audio/video channels.
//!
//! Tokens use the AccessToken2 format: a versioned, compressed, HMAC-signed body listing
//! the [Service]s and privileges granted to a user, each with an expiration.
//!
//! See [RtcTokenBuilder] for the common case and [AccessToken] for encoding and verification.

mod access_token;
mod builder;
mod error;
mod service;

pub mod coding;

pub use access_token::*;
pub use builder::*;
pub use error::*;
pub use service::*;
