// 🪟 Views - Per-screen state machines
// Each view owns its state and a channel on which spawned API calls report back.
// Rendering lives in `ui`; nothing here touches the terminal.

pub mod admin;
pub mod requester;

pub use admin::{AdminEvent, AdminPhase, AdminView, RejectModal, RequestControls, StatusFilter};
pub use requester::{RequesterEvent, RequesterView, REFRESH_DELAY};

use std::future::Future;
use tokio::sync::mpsc::UnboundedSender;

/// Run `fut` on the runtime and post its result back to the view.
/// If the view is gone by then the result is dropped.
fn spawn_into<E, F>(tx: &UnboundedSender<E>, fut: F)
where
    E: Send + 'static,
    F: Future<Output = E> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        let _ = tx.send(fut.await);
    });
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory backend used by the view tests

    use crate::client::AccessApi;
    use crate::error::ApiError;
    use crate::models::{AccessRequest, AccessRequestStatus, CostObject};
    use async_trait::async_trait;
    use chrono::Utc;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub const CALLER_ID: i64 = 7;
    pub const ADMIN_ID: i64 = 1;

    #[derive(Default)]
    pub struct FakeApi {
        pub objects: Mutex<Vec<CostObject>>,
        pub requests: Mutex<Vec<AccessRequest>>,
        pub fail_actions: AtomicBool,
        pub fail_loads: AtomicBool,
        pub list_calls: AtomicUsize,
        pub my_calls: AtomicUsize,
    }

    pub fn object(id: i64, code: &str, name: &str) -> CostObject {
        CostObject {
            id,
            name: name.to_string(),
            code: Some(code.to_string()),
            status: Some("active".to_string()),
            contract_number: None,
        }
    }

    pub fn pending(id: i64, object_id: i64) -> AccessRequest {
        AccessRequest {
            id,
            object_id,
            object: None,
            user_id: Some(CALLER_ID),
            user: None,
            status: AccessRequestStatus::Pending,
            reason: None,
            created_at: Some(Utc::now()),
            processed_at: None,
            processed_by: None,
            rejection_reason: None,
        }
    }

    fn server_error() -> ApiError {
        ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: None,
        }
    }

    fn bad_request(detail: &str) -> ApiError {
        ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            detail: Some(detail.to_string()),
        }
    }

    impl FakeApi {
        pub fn new(objects: Vec<CostObject>, requests: Vec<AccessRequest>) -> Self {
            FakeApi {
                objects: Mutex::new(objects),
                requests: Mutex::new(requests),
                ..Default::default()
            }
        }

        pub fn status_of(&self, request_id: i64) -> Option<AccessRequestStatus> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == request_id)
                .map(|r| r.status)
        }

        fn decide(
            &self,
            object_id: i64,
            request_id: i64,
            next: AccessRequestStatus,
            reason: Option<&str>,
        ) -> Result<(), ApiError> {
            if self.fail_actions.load(Ordering::SeqCst) {
                return Err(server_error());
            }
            let mut requests = self.requests.lock().unwrap();
            let req = requests
                .iter_mut()
                .find(|r| r.id == request_id && r.object_id == object_id)
                .ok_or_else(|| bad_request("Request not found"))?;
            if !req.status.can_transition_to(next) {
                return Err(bad_request("Request already processed"));
            }
            req.status = next;
            req.processed_at = Some(Utc::now());
            req.processed_by = Some(ADMIN_ID);
            req.rejection_reason = reason.map(String::from);
            Ok(())
        }
    }

    #[async_trait]
    impl AccessApi for FakeApi {
        async fn list_objects(&self) -> Result<Vec<CostObject>, ApiError> {
            if self.fail_loads.load(Ordering::SeqCst) {
                return Err(server_error());
            }
            Ok(self.objects.lock().unwrap().clone())
        }

        async fn list_access_requests(&self, object_id: i64) -> Result<Vec<AccessRequest>, ApiError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_loads.load(Ordering::SeqCst) {
                return Err(server_error());
            }
            Ok(self
                .requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.object_id == object_id)
                .cloned()
                .collect())
        }

        async fn approve(&self, object_id: i64, request_id: i64) -> Result<(), ApiError> {
            self.decide(object_id, request_id, AccessRequestStatus::Approved, None)
        }

        async fn reject(&self, object_id: i64, request_id: i64, reason: &str) -> Result<(), ApiError> {
            self.decide(object_id, request_id, AccessRequestStatus::Rejected, Some(reason))
        }

        async fn my_requests(&self) -> Result<Vec<AccessRequest>, ApiError> {
            self.my_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_loads.load(Ordering::SeqCst) {
                return Err(server_error());
            }
            Ok(self
                .requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.user_id == Some(CALLER_ID))
                .cloned()
                .collect())
        }

        async fn request_access(&self, object_id: i64, reason: Option<&str>) -> Result<(), ApiError> {
            if self.fail_actions.load(Ordering::SeqCst) {
                return Err(server_error());
            }
            let mut requests = self.requests.lock().unwrap();
            let duplicate = requests.iter().any(|r| {
                r.object_id == object_id
                    && r.user_id == Some(CALLER_ID)
                    && r.status == AccessRequestStatus::Pending
            });
            if duplicate {
                return Err(bad_request("You already have a pending request for this object"));
            }
            let id = requests.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            let mut req = pending(id, object_id);
            req.reason = reason.map(String::from);
            requests.push(req);
            Ok(())
        }
    }
}
