//! Rentdesk Rust Client Library
//!
//! A Rust client for the Rentdesk property-rental management API: account
//! and profile management, and room management (create, edit, list,
//! soft/hard delete, restore). Requests go through a session manager that
//! attaches the bearer token and transparently refreshes it once when it
//! has expired.

pub mod auth;
pub mod config;
pub mod error;
mod fetch;
pub mod form;
pub mod rooms;

use std::sync::Arc;

use reqwest::Client;
use url::Url;

use rentdesk_session::{
    FileTokenStore, MemoryTokenStore, Navigator, NoopNavigator, SessionError, SessionManager,
    TokenStore,
};

use crate::auth::{AuthClient, AuthContext};
use crate::config::ClientOptions;
use crate::error::Error;
use crate::rooms::RoomClient;

pub use rentdesk_session as session;
pub use rentdesk_validation as validation;

/// The main entry point for the Rentdesk client
#[derive(Debug, Clone)]
pub struct Rentdesk {
    /// The API base URL
    pub url: Url,
    /// Client options
    pub options: ClientOptions,
    session: SessionManager,
}

impl Rentdesk {
    /// Create a new client with default options
    ///
    /// # Example
    ///
    /// ```
    /// use rentdesk::Rentdesk;
    ///
    /// let rentdesk = Rentdesk::new("http://localhost:8000/api").unwrap();
    /// assert!(!rentdesk.auth().is_authenticated());
    /// ```
    pub fn new(api_url: &str) -> Result<Self, Error> {
        Self::new_with_options(ClientOptions::default().with_api_url(api_url))
    }

    /// Create a new client with custom options. Forced logouts are only
    /// logged; use [`with_navigator`](Self::with_navigator) to react to
    /// them.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rentdesk::{Rentdesk, config::ClientOptions};
    ///
    /// let options = ClientOptions::from_env().with_session_file("session.json");
    /// let rentdesk = Rentdesk::new_with_options(options).unwrap();
    /// ```
    pub fn new_with_options(options: ClientOptions) -> Result<Self, Error> {
        Self::with_navigator(options, Arc::new(NoopNavigator))
    }

    /// Create a new client that calls `navigator` when the session ends
    pub fn with_navigator(
        options: ClientOptions,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, Error> {
        let store: Arc<dyn TokenStore> = match &options.session_file {
            Some(path) => Arc::new(FileTokenStore::open(path).map_err(SessionError::from)?),
            None => Arc::new(MemoryTokenStore::new()),
        };
        Self::with_store(options, store, navigator)
    }

    /// Create a new client on an explicit token store
    pub fn with_store(
        options: ClientOptions,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, Error> {
        let url = Url::parse(&options.api_url)?;

        let mut http_client = Client::builder();
        if let Some(timeout) = options.request_timeout {
            http_client = http_client.timeout(timeout);
        }
        let http_client = http_client.build()?;

        let session = SessionManager::builder(url.clone())
            .http_client(http_client)
            .store(store)
            .navigator(navigator)
            .auto_refresh(options.auto_refresh_token)
            .build();

        log::debug!("Rentdesk client for {}", url);

        Ok(Self {
            url,
            options,
            session,
        })
    }

    /// The session manager shared by every client handed out here
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Get the auth client for login, logout and profile operations
    pub fn auth(&self) -> AuthClient {
        AuthClient::new(self.session.clone())
    }

    /// Get the room client
    pub fn rooms(&self) -> RoomClient {
        RoomClient::new(self.session.clone())
    }

    /// Create an auth context holding the logged-in user's profile
    pub fn auth_context(&self) -> AuthContext {
        AuthContext::new(self.auth())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{AuthClient, AuthContext, LoginCredentials, User};
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::form::Upload;
    pub use crate::rooms::{Room, RoomClient, RoomFormData, RoomStatus, RoomUpdate};
    pub use crate::Rentdesk;
}
