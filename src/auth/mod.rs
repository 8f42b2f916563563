//! Authentication and profile management

mod context;
mod types;

use rentdesk_session::{ApiRequest, Attempt, CredentialPair, Decision, SessionManager};
use serde::Serialize;

use crate::error::Error;
use crate::fetch::{check_status, execute};

pub use context::AuthContext;
pub use types::*;

#[derive(Serialize)]
struct LogoutRequest<'a> {
    refresh: &'a str,
}

fn logout_request(refresh_token: &str) -> Result<ApiRequest, Error> {
    Ok(ApiRequest::post("/auth/logout/").json(&LogoutRequest {
        refresh: refresh_token,
    })?)
}

/// Client for the authentication and profile endpoints
#[derive(Debug, Clone)]
pub struct AuthClient {
    session: SessionManager,
}

impl AuthClient {
    /// Create a new auth client on top of a session
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Register a new account. Does not log in.
    pub async fn signup(&self, data: &SignupData) -> Result<AuthResponse, Error> {
        let request = ApiRequest::post("/auth/signup/").json(data)?;
        execute(&self.session, request).await
    }

    /// Log in and store the issued token pair
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<TokenResponse, Error> {
        let request = ApiRequest::post("/auth/login/").json(credentials)?;
        let tokens: TokenResponse = execute(&self.session, request).await?;

        self.session
            .store_credentials(&CredentialPair::from(&tokens))?;
        log::info!("Logged in as {}", credentials.email);

        Ok(tokens)
    }

    /// Log out.
    ///
    /// The server is asked to revoke the refresh token, but local
    /// credentials are cleared whether or not that call succeeds. The
    /// navigator is invoked once: by the failed refresh if the session had
    /// already expired, otherwise here.
    pub async fn logout(&self) {
        let outcome = match self.session.refresh_token() {
            Some(refresh_token) => self.revoke(&refresh_token).await,
            None => Ok(()),
        };

        match outcome {
            Err(err) if err.is_session_expired() => {
                log::warn!("Logout request failed, session already ended: {}", err);
                if let Err(err) = self.session.clear_credentials() {
                    log::error!("Failed to clear stored credentials: {}", err);
                }
            }
            outcome => {
                if let Err(err) = outcome {
                    log::warn!("Logout request failed: {}", err);
                }
                self.session.end_session();
            }
        }
        log::info!("Logged out");
    }

    /// Post the refresh token to the logout endpoint. A replay after a
    /// token refresh carries the refresh token stored at that point, which
    /// differs from the first one when the server rotates them.
    async fn revoke(&self, refresh_token: &str) -> Result<(), Error> {
        let mut attempt = Attempt::new(logout_request(refresh_token)?);
        loop {
            let response = self.session.attach_auth(&mut attempt)?.send().await?;
            match self.session.handle_response(response, attempt).await? {
                Decision::Complete(response) => {
                    check_status(response).await?;
                    return Ok(());
                }
                Decision::Retry(mut next) => {
                    let Some(current) = self.session.refresh_token() else {
                        return Ok(());
                    };
                    next.request = logout_request(&current)?;
                    attempt = next;
                }
            }
        }
    }

    /// Fetch the profile of the logged-in user
    pub async fn get_profile(&self) -> Result<User, Error> {
        execute(&self.session, ApiRequest::get("/user/profile/")).await
    }

    /// Update the profile; only supplied fields are sent
    pub async fn edit_profile(&self, data: &EditProfileData) -> Result<AuthResponse, Error> {
        let request = ApiRequest::patch("/user/edit-profile/").form(data.to_form().into_fields());
        execute(&self.session, request).await
    }

    /// Request a password reset token
    pub async fn forgot_password(
        &self,
        data: &ForgotPasswordData,
    ) -> Result<ForgotPasswordResponse, Error> {
        let request = ApiRequest::post("/auth/forgot-password/").json(data)?;
        execute(&self.session, request).await
    }

    /// Set a new password using a reset token
    pub async fn reset_password(&self, data: &ResetPasswordData) -> Result<MessageResponse, Error> {
        let request = ApiRequest::post("/auth/reset-password/").json(data)?;
        execute(&self.session, request).await
    }

    /// Whether an access token is stored (not whether it is still valid)
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }
}
