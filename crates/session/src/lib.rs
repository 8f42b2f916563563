//! Session manager for the Rentdesk API
//!
//! This crate keeps the bearer-token pair, attaches the access token to
//! outgoing requests, and recovers from an expired access token by
//! refreshing it once and replaying the request. Concurrent requests that
//! hit an expired token share a single refresh call.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rentdesk_session::{ApiRequest, MemoryTokenStore, SessionManager};
//!
//! # async fn run() -> Result<(), rentdesk_session::SessionError> {
//! let session = SessionManager::builder("http://localhost:8000/api".parse()?)
//!     .store(Arc::new(MemoryTokenStore::new()))
//!     .navigator(Arc::new(|| println!("please log in again")))
//!     .build();
//!
//! let response = session.send(ApiRequest::get("/rooms/")).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod error;
mod manager;
mod navigator;
mod request;
mod store;

pub use error::{RefreshError, Result, SessionError, StoreError};
pub use manager::{
    Attempt, Decision, SessionManager, SessionManagerBuilder, DEFAULT_REFRESH_PATH,
};
pub use navigator::{Navigator, NoopNavigator};
pub use request::{ApiRequest, FormField, RequestBody};
pub use store::{
    CredentialPair, FileTokenStore, MemoryTokenStore, TokenStore, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};

pub use reqwest::{Method, Response, StatusCode};
