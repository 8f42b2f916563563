//! Room management

mod types;

use rentdesk_session::{ApiRequest, SessionManager};

use crate::error::Error;
use crate::fetch::{execute, execute_empty};

pub use types::*;

/// Client for the `/rooms/` endpoints
#[derive(Debug, Clone)]
pub struct RoomClient {
    session: SessionManager,
}

impl RoomClient {
    /// Create a new room client on top of a session
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    /// List the user's rooms; soft-deleted rooms are included only when
    /// `include_deleted` is set
    pub async fn list(&self, include_deleted: bool) -> Result<Vec<Room>, Error> {
        let request = ApiRequest::get("/rooms/").query("include_deleted", include_deleted);
        execute(&self.session, request).await
    }

    pub async fn get(&self, id: i64) -> Result<Room, Error> {
        execute(&self.session, ApiRequest::get(format!("/rooms/{}/", id))).await
    }

    pub async fn create(&self, data: &RoomFormData) -> Result<Room, Error> {
        let request = ApiRequest::post("/rooms/").form(data.to_form().into_fields());
        execute(&self.session, request).await
    }

    /// Apply a partial update; only the fields set on `data` are sent
    pub async fn update(&self, id: i64, data: &RoomUpdate) -> Result<Room, Error> {
        let request =
            ApiRequest::patch(format!("/rooms/{}/", id)).form(data.to_form().into_fields());
        execute(&self.session, request).await
    }

    /// Mark the room deleted; it can be brought back with [`restore`](Self::restore)
    pub async fn soft_delete(&self, id: i64) -> Result<(), Error> {
        execute_empty(&self.session, ApiRequest::delete(format!("/rooms/{}/", id))).await
    }

    /// Delete the room permanently
    pub async fn hard_delete(&self, id: i64) -> Result<(), Error> {
        let request = ApiRequest::delete(format!("/rooms/{}/hard-delete/", id));
        execute_empty(&self.session, request).await
    }

    /// Undo a soft delete
    pub async fn restore(&self, id: i64) -> Result<Room, Error> {
        execute(&self.session, ApiRequest::post(format!("/rooms/{}/restore/", id))).await
    }
}
