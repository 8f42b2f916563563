//! Sending requests through the session and decoding the responses

use rentdesk_session::{ApiRequest, Response, SessionManager};
use serde::de::DeserializeOwned;

use crate::error::Error;

/// Turn a non-success response into [`Error::Api`]
pub(crate) async fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    log::debug!("Request failed with status {}: {}", status, body);
    Err(Error::api(status.as_u16(), body))
}

/// Execute the request and parse the response as JSON
pub(crate) async fn execute<T: DeserializeOwned>(
    session: &SessionManager,
    request: ApiRequest,
) -> Result<T, Error> {
    let response = check_status(session.send(request).await?).await?;
    let result = response.json::<T>().await?;
    Ok(result)
}

/// Execute the request, discarding any response body
pub(crate) async fn execute_empty(
    session: &SessionManager,
    request: ApiRequest,
) -> Result<(), Error> {
    check_status(session.send(request).await?).await?;
    Ok(())
}
