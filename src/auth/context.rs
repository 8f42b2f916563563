//! Logged-in user state for the view layer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use super::{AuthClient, LoginCredentials, SignupData, User};
use crate::error::Error;

/// Holds the current user's profile next to the auth client.
///
/// The profile lives in memory only; it is fetched after login and on
/// [`init`](Self::init), and dropped on logout.
#[derive(Debug)]
pub struct AuthContext {
    auth: AuthClient,
    user: RwLock<Option<User>>,
    loading: AtomicBool,
}

impl AuthContext {
    /// Create a context; it reports loading until [`init`](Self::init) ran
    pub fn new(auth: AuthClient) -> Self {
        Self {
            auth,
            user: RwLock::new(None),
            loading: AtomicBool::new(true),
        }
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// The cached profile, if logged in
    pub fn user(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    fn set_user(&self, user: Option<User>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    /// Restore the user from stored credentials at start-up.
    ///
    /// If the profile cannot be fetched the stored credentials are
    /// discarded and the context stays logged out.
    pub async fn init(&self) {
        if self.auth.is_authenticated() {
            match self.auth.get_profile().await {
                Ok(user) => self.set_user(Some(user)),
                Err(err) => {
                    log::warn!("Failed to fetch user profile: {}", err);
                    if let Err(err) = self.auth.session().clear_credentials() {
                        log::error!("Failed to clear stored credentials: {}", err);
                    }
                    self.set_user(None);
                }
            }
        }
        self.loading.store(false, Ordering::SeqCst);
    }

    /// Log in and load the profile
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        self.auth.login(credentials).await?;
        let user = self.auth.get_profile().await?;
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    /// Register; the user still has to log in afterwards
    pub async fn signup(&self, data: &SignupData) -> Result<(), Error> {
        self.auth.signup(data).await?;
        Ok(())
    }

    pub async fn logout(&self) {
        self.auth.logout().await;
        self.set_user(None);
    }

    /// Re-fetch the profile, e.g. after editing it. No-op when logged out.
    pub async fn refresh_user(&self) -> Result<(), Error> {
        if self.auth.is_authenticated() {
            let user = self.auth.get_profile().await?;
            self.set_user(Some(user));
        }
        Ok(())
    }
}
