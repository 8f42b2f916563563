//! Navigation boundary invoked when the session ends

/// Receives the forced-logout signal.
///
/// Front-ends implement this to send the user back to the login screen.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

impl<F> Navigator for F
where
    F: Fn() + Send + Sync,
{
    fn redirect_to_login(&self) {
        self()
    }
}

/// Navigator for headless use; only logs the redirect
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect_to_login(&self) {
        log::info!("Session ended; login required");
    }
}
