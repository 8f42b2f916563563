//! The authenticated request pipeline
//!
//! `send` = attach token → send → on 401 refresh and retry once → decide.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use url::Url;

use crate::error::{RefreshError, Result, SessionError, StoreError};
use crate::navigator::{Navigator, NoopNavigator};
use crate::request::ApiRequest;
use crate::store::{
    CredentialPair, MemoryTokenStore, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};

/// Default path of the token refresh endpoint
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh/";

type RefreshOutcome = std::result::Result<String, RefreshError>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    /// Present when the server rotates refresh tokens
    #[serde(default)]
    refresh: Option<String>,
}

/// A request on its way through the pipeline
#[derive(Debug, Clone)]
pub struct Attempt {
    pub request: ApiRequest,
    /// Set once the request has been replayed after a refresh
    pub already_retried: bool,
    /// Access token the request was last sent with
    pub sent_token: Option<String>,
}

impl Attempt {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            already_retried: false,
            sent_token: None,
        }
    }

    fn into_retry(self) -> Self {
        Self {
            already_retried: true,
            ..self
        }
    }
}

/// What to do with a response
#[derive(Debug)]
pub enum Decision {
    /// Hand the response to the caller
    Complete(Response),
    /// Send the request again with the current access token
    Retry(Attempt),
}

/// Everything the refresh future needs; kept apart from the in-flight slot
/// so the pending future does not own the slot it lives in.
struct Backend {
    http_client: Client,
    base_url: Url,
    refresh_path: String,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
}

impl Backend {
    fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    /// Both keys are always removed; the first failure is reported
    fn clear_credentials(&self) -> std::result::Result<(), StoreError> {
        let access = self.store.remove(ACCESS_TOKEN_KEY);
        let refresh = self.store.remove(REFRESH_TOKEN_KEY);
        access.and(refresh)
    }

    fn end_session(&self) {
        if let Err(err) = self.clear_credentials() {
            log::error!("Failed to clear stored credentials: {}", err);
        }
        self.navigator.redirect_to_login();
    }

    async fn run_refresh(self: Arc<Self>) -> RefreshOutcome {
        let outcome = self.request_new_token().await;
        match &outcome {
            Ok(_) => log::info!("Access token refreshed"),
            Err(err) => {
                log::warn!("Token refresh failed, ending session: {}", err);
                self.end_session();
            }
        }
        outcome
    }

    async fn request_new_token(&self) -> RefreshOutcome {
        let refresh_token = self
            .store
            .get(REFRESH_TOKEN_KEY)
            .ok_or(RefreshError::MissingRefreshToken)?;

        let request = ApiRequest::post(self.refresh_path.as_str())
            .json(&RefreshRequest {
                refresh: &refresh_token,
            })
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        // The refresh call never carries the (expired) access token
        let response = request
            .build(&self.http_client, &self.base_url, None)
            .map_err(|err| RefreshError::Transport(err.to_string()))?
            .send()
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let tokens: RefreshResponse = response
            .json()
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        self.store
            .set(ACCESS_TOKEN_KEY, &tokens.access)
            .map_err(|err| RefreshError::Storage(err.to_string()))?;
        if let Some(rotated) = &tokens.refresh {
            self.store
                .set(REFRESH_TOKEN_KEY, rotated)
                .map_err(|err| RefreshError::Storage(err.to_string()))?;
        }

        Ok(tokens.access)
    }
}

struct Inner {
    backend: Arc<Backend>,
    auto_refresh: bool,
    in_flight: Mutex<Option<PendingRefresh>>,
}

/// Owns the bearer-token lifecycle for one API.
///
/// Cloning is cheap; clones share the token store and the in-flight refresh.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("base_url", &self.inner.backend.base_url.as_str())
            .field("auto_refresh", &self.inner.auto_refresh)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl SessionManager {
    /// Start building a session manager for the API at `base_url`
    pub fn builder(base_url: Url) -> SessionManagerBuilder {
        SessionManagerBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.backend.base_url
    }

    /// Whether an access token is stored. Does not check that it is still
    /// valid.
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.backend.access_token()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner.backend.store.get(REFRESH_TOKEN_KEY)
    }

    /// Persist a freshly issued credential pair
    pub fn store_credentials(&self, credentials: &CredentialPair) -> Result<()> {
        let store = &self.inner.backend.store;
        store.set(ACCESS_TOKEN_KEY, &credentials.access_token)?;
        store.set(REFRESH_TOKEN_KEY, &credentials.refresh_token)?;
        Ok(())
    }

    pub fn clear_credentials(&self) -> Result<()> {
        self.inner.backend.clear_credentials()?;
        Ok(())
    }

    /// Clear the stored credentials and send the user to the login screen.
    /// Storage failures are logged; the redirect always happens.
    pub fn end_session(&self) {
        self.inner.backend.end_session();
    }

    /// Build the request with the stored access token attached (if any) and
    /// record the token on the attempt
    pub fn attach_auth(&self, attempt: &mut Attempt) -> Result<reqwest::RequestBuilder> {
        let token = self.access_token();
        let backend = &self.inner.backend;
        let builder = attempt
            .request
            .build(&backend.http_client, &backend.base_url, token.as_deref())?;
        attempt.sent_token = token;
        Ok(builder)
    }

    /// Decide what to do with a response.
    ///
    /// Anything but 401 is handed back untouched, as is a 401 for a request
    /// sent without a token. A first 401 refreshes the access token (or
    /// picks up one refreshed meanwhile) and asks for a retry; a 401 on the
    /// retry is [`SessionError::Unauthorized`].
    pub async fn handle_response(&self, response: Response, attempt: Attempt) -> Result<Decision> {
        if response.status() != StatusCode::UNAUTHORIZED || !self.inner.auto_refresh {
            return Ok(Decision::Complete(response));
        }

        let Some(sent_token) = attempt.sent_token.clone() else {
            return Ok(Decision::Complete(response));
        };

        if attempt.already_retried {
            log::warn!(
                "{} {} rejected after token refresh",
                attempt.request.method,
                attempt.request.path
            );
            return Err(SessionError::Unauthorized);
        }

        let retry = attempt.into_retry();

        match self.access_token() {
            Some(current) if current != sent_token => {
                log::debug!("Access token changed since the request was sent; retrying");
                return Ok(Decision::Retry(retry));
            }
            // Another request already ended the session
            None => return Err(RefreshError::MissingRefreshToken.into()),
            Some(_) => {}
        }

        self.refresh().await?;
        Ok(Decision::Retry(retry))
    }

    /// Obtain a new access token.
    ///
    /// At most one refresh call is on the wire at a time: callers arriving
    /// while one is in flight wait for its outcome. On failure both tokens
    /// are cleared and the navigator is told to show the login screen, once
    /// per failed refresh.
    pub async fn refresh(&self) -> std::result::Result<String, RefreshError> {
        let pending = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(pending) => {
                    log::debug!("Joining in-flight token refresh");
                    pending.clone()
                }
                None => {
                    log::debug!("Starting token refresh");
                    let pending = Arc::clone(&self.inner.backend)
                        .run_refresh()
                        .boxed()
                        .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        let outcome = pending.clone().await;

        let mut slot = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&pending))
        {
            *slot = None;
        }

        outcome
    }

    /// Send a request through the authentication pipeline and return the
    /// raw response. Non-401 statuses, success or not, are the caller's to
    /// interpret.
    pub async fn send(&self, request: ApiRequest) -> Result<Response> {
        let mut attempt = Attempt::new(request);
        loop {
            let builder = self.attach_auth(&mut attempt)?;
            log::debug!(
                "{} {}{}",
                attempt.request.method,
                attempt.request.path,
                if attempt.already_retried { " (retry)" } else { "" }
            );
            let response = builder.send().await?;

            match self.handle_response(response, attempt).await? {
                Decision::Complete(response) => return Ok(response),
                Decision::Retry(next) => attempt = next,
            }
        }
    }
}

/// Builder for [`SessionManager`]
pub struct SessionManagerBuilder {
    base_url: Url,
    http_client: Option<Client>,
    store: Option<Arc<dyn TokenStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    refresh_path: String,
    auto_refresh: bool,
}

impl SessionManagerBuilder {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            http_client: None,
            store: None,
            navigator: None,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            auto_refresh: true,
        }
    }

    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn refresh_path(mut self, path: &str) -> Self {
        self.refresh_path = path.to_string();
        self
    }

    /// When disabled, 401 responses are returned to the caller as-is
    pub fn auto_refresh(mut self, value: bool) -> Self {
        self.auto_refresh = value;
        self
    }

    pub fn build(self) -> SessionManager {
        let backend = Backend {
            http_client: self.http_client.unwrap_or_default(),
            base_url: self.base_url,
            refresh_path: self.refresh_path,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryTokenStore::new())),
            navigator: self.navigator.unwrap_or_else(|| Arc::new(NoopNavigator)),
        };

        SessionManager {
            inner: Arc::new(Inner {
                backend: Arc::new(backend),
                auto_refresh: self.auto_refresh,
                in_flight: Mutex::new(None),
            }),
        }
    }
}
