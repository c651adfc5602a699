//! # dispatchpi-oauth
//!
//! Keeps the Gmail access token of the inbox that feeds `dispatchpi` frames
//! usable.
//!
//! Credentials live in Google's authorized-user `token.json`, the file written
//! by Google's client libraries after a one-time consent. When the access
//! token is expired it is renewed with the stored refresh token:
//!
//! ```ignore
//! use dispatchpi_oauth::AuthorizedUser;
//!
//! let mut user = AuthorizedUser::load(path).await?;
//! if user.ensure_fresh().await? {
//!     user.save(path).await?;
//! }
//! let access_token = user.token;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod client;
pub mod endpoint;
mod error;
pub mod token;

pub use client::RefreshClient;
pub use endpoint::TokenEndpoint;
pub use error::{Error, Result};
pub use token::{AccessToken, AuthorizedUser};
