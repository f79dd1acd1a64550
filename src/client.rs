// 🌐 Access API Client - REST round trips against the backend
// One request per call, bearer-authenticated, no retries.

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::models::{AccessRequest, CostObject, RejectBody, RequestAccessBody};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

// ============================================================================
// API SURFACE
// ============================================================================

/// Backend operations the views depend on
#[async_trait]
pub trait AccessApi: Send + Sync {
    /// GET /objects/
    async fn list_objects(&self) -> Result<Vec<CostObject>, ApiError>;

    /// GET /objects/{id}/access-requests
    async fn list_access_requests(&self, object_id: i64) -> Result<Vec<AccessRequest>, ApiError>;

    /// POST /objects/{id}/access-requests/{req}/approve
    async fn approve(&self, object_id: i64, request_id: i64) -> Result<(), ApiError>;

    /// POST /objects/{id}/access-requests/{req}/reject
    async fn reject(&self, object_id: i64, request_id: i64, reason: &str) -> Result<(), ApiError>;

    /// GET /objects/access-requests/my
    async fn my_requests(&self) -> Result<Vec<AccessRequest>, ApiError>;

    /// POST /objects/{id}/request-access
    async fn request_access(&self, object_id: i64, reason: Option<&str>) -> Result<(), ApiError>;
}

// ============================================================================
// HTTP IMPLEMENTATION
// ============================================================================

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    auth: AuthContext,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, auth: AuthContext) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, base_url, auth))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, auth: AuthContext) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient { client, base_url, auth }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        tracing::debug!(path, "GET");
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(self.auth.token())
            .send()
            .await?;

        let body = read_success(resp, path).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> Result<(), ApiError> {
        tracing::debug!(path, "POST");
        let mut req = self.client.post(self.url(path)).bearer_auth(self.auth.token());
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        read_success(resp, path).await?;
        Ok(())
    }
}

/// Collect the body, turning non-2xx into `ApiError::Status`
async fn read_success(resp: reqwest::Response, path: &str) -> Result<Vec<u8>, ApiError> {
    let status = resp.status();
    let body = resp.bytes().await?;

    if status.is_success() {
        return Ok(body.to_vec());
    }

    let err = ApiError::from_status(status, &body);
    tracing::warn!(path, %status, error = %err, "request failed");
    Err(err)
}

#[async_trait]
impl AccessApi for ApiClient {
    async fn list_objects(&self) -> Result<Vec<CostObject>, ApiError> {
        self.get_json("/objects/").await
    }

    async fn list_access_requests(&self, object_id: i64) -> Result<Vec<AccessRequest>, ApiError> {
        self.get_json(&format!("/objects/{}/access-requests", object_id))
            .await
    }

    async fn approve(&self, object_id: i64, request_id: i64) -> Result<(), ApiError> {
        let path = format!("/objects/{}/access-requests/{}/approve", object_id, request_id);
        self.post::<()>(&path, None).await?;
        tracing::info!(object_id, request_id, "access request approved");
        Ok(())
    }

    async fn reject(&self, object_id: i64, request_id: i64, reason: &str) -> Result<(), ApiError> {
        let path = format!("/objects/{}/access-requests/{}/reject", object_id, request_id);
        let body = RejectBody { reason: reason.to_string() };
        self.post(&path, Some(&body)).await?;
        tracing::info!(object_id, request_id, "access request rejected");
        Ok(())
    }

    async fn my_requests(&self) -> Result<Vec<AccessRequest>, ApiError> {
        self.get_json("/objects/access-requests/my").await
    }

    async fn request_access(&self, object_id: i64, reason: Option<&str>) -> Result<(), ApiError> {
        let path = format!("/objects/{}/request-access", object_id);
        let body = RequestAccessBody::new(reason);
        self.post(&path, Some(&body)).await?;
        tracing::info!(object_id, "access requested");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccessRequestStatus;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(format!("{}/", server.uri()), AuthContext::new("test-token")).unwrap()
    }

    #[tokio::test]
    async fn test_list_objects_sends_bearer() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/objects/"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "Obj1", "code": "A", "status": "active"},
                {"id": 2, "name": "Obj2", "code": "B", "status": "active", "contract_number": "C-17"}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let objects = client_for(&mock_server).list_objects().await.unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].contract_number.as_deref(), Some("C-17"));
    }

    #[tokio::test]
    async fn test_list_access_requests_for_object() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/objects/1/access-requests"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 10, "object_id": 1, "status": "PENDING"}
            ])))
            .mount(&mock_server)
            .await;

        let requests = client_for(&mock_server).list_access_requests(1).await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].status, AccessRequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_approve_and_reject_paths() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/objects/1/access-requests/10/approve"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/objects/1/access-requests/11/reject"))
            .and(body_json(json!({"reason": "incomplete paperwork"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        client.approve(1, 10).await.unwrap();
        client.reject(1, 11, "incomplete paperwork").await.unwrap();
    }

    #[tokio::test]
    async fn test_request_access_duplicate_surfaces_detail() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/objects/2/request-access"))
            .and(body_json(json!({"reason": null})))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"detail": "Access request already pending"})),
            )
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server)
            .request_access(2, Some("  "))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(err.detail(), Some("Access request already pending"));
    }

    #[tokio::test]
    async fn test_request_access_created() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/objects/3/request-access"))
            .and(body_json(json!({"reason": "monthly report"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 99})))
            .expect(1)
            .mount(&mock_server)
            .await;

        client_for(&mock_server)
            .request_access(3, Some("monthly report"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_my_requests_bad_json_is_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/objects/access-requests/my"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server).my_requests().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_generic() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/objects/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server).list_objects().await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.detail(), None);
    }

    #[tokio::test]
    async fn test_transport_failure() {
        // nothing listens on port 9 of localhost
        let client = ApiClient::new("http://127.0.0.1:9", AuthContext::new("t")).unwrap();
        let err = client.list_objects().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
