// 🙋 Requester View - Ask for access to an object, follow own requests

use super::spawn_into;
use crate::banner::{self, Banner};
use crate::client::AccessApi;
use crate::error::ApiError;
use crate::models::{AccessRequest, AccessRequestStatus, CostObject};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Delay between a successful submit and the history refresh,
/// so the confirmation is readable before the list changes
pub const REFRESH_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug)]
pub enum RequesterEvent {
    ObjectsLoaded(Result<Vec<CostObject>, ApiError>),
    MyRequestsLoaded(Result<Vec<AccessRequest>, ApiError>),
    Submitted {
        object_id: i64,
        result: Result<(), ApiError>,
    },
}

pub struct RequesterView {
    api: Arc<dyn AccessApi>,
    tx: UnboundedSender<RequesterEvent>,
    rx: UnboundedReceiver<RequesterEvent>,

    objects: Vec<CostObject>,
    my_requests: Vec<AccessRequest>,

    // form
    selected_object: Option<i64>,
    pub reason: String,
    submitting: bool,

    banner: Option<Banner>,
    refresh_at: Option<Instant>,
    loading: usize,
}

impl RequesterView {
    pub fn new(api: Arc<dyn AccessApi>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        RequesterView {
            api,
            tx,
            rx,
            objects: Vec::new(),
            my_requests: Vec::new(),
            selected_object: None,
            reason: String::new(),
            submitting: false,
            banner: None,
            refresh_at: None,
            loading: 0,
        }
    }

    /// Kick off both independent loads
    pub fn mount(&mut self) {
        self.loading += 1;
        let api = Arc::clone(&self.api);
        spawn_into(&self.tx, async move {
            RequesterEvent::ObjectsLoaded(api.list_objects().await)
        });
        self.load_my_requests();
    }

    fn load_my_requests(&mut self) {
        self.loading += 1;
        let api = Arc::clone(&self.api);
        spawn_into(&self.tx, async move {
            RequesterEvent::MyRequestsLoaded(api.my_requests().await)
        });
    }

    // ------------------------------------------------------------------------
    // Form
    // ------------------------------------------------------------------------

    /// True when the caller already has a PENDING request for the object.
    /// A hint only; the backend still rejects duplicates.
    pub fn is_object_disabled(&self, object_id: i64) -> bool {
        self.my_requests
            .iter()
            .any(|r| r.object_id == object_id && r.status == AccessRequestStatus::Pending)
    }

    /// Returns false (selection unchanged) for disabled objects
    pub fn select_object(&mut self, object_id: i64) -> bool {
        if self.is_object_disabled(object_id) {
            return false;
        }
        self.selected_object = Some(object_id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected_object = None;
    }

    pub fn selected_object_id(&self) -> Option<i64> {
        self.selected_object
    }

    pub fn selected_object(&self) -> Option<&CostObject> {
        self.selected_object
            .and_then(|id| self.objects.iter().find(|o| o.id == id))
    }

    pub fn can_submit(&self) -> bool {
        self.selected_object.is_some() && !self.submitting
    }

    /// Send the request for the selected object.
    /// Without a selection nothing is sent and the form is left as is.
    pub fn submit(&mut self) -> bool {
        if self.submitting {
            return false;
        }
        let object_id = match self.selected_object {
            Some(id) => id,
            None => {
                self.banner = Some(Banner::error("Select an object first"));
                return false;
            }
        };

        self.submitting = true;
        let reason = self.reason.clone();
        let api = Arc::clone(&self.api);
        spawn_into(&self.tx, async move {
            let reason = Some(reason.as_str()).filter(|r| !r.trim().is_empty());
            RequesterEvent::Submitted {
                object_id,
                result: api.request_access(object_id, reason).await,
            }
        });
        true
    }

    // ------------------------------------------------------------------------
    // Event handling
    // ------------------------------------------------------------------------

    pub fn apply(&mut self, event: RequesterEvent, now: Instant) {
        match event {
            RequesterEvent::ObjectsLoaded(result) => {
                self.loading = self.loading.saturating_sub(1);
                match result {
                    Ok(objects) => self.objects = objects,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to load objects");
                        self.banner = Some(Banner::error("Failed to load objects"));
                    }
                }
            }
            RequesterEvent::MyRequestsLoaded(result) => {
                self.loading = self.loading.saturating_sub(1);
                match result {
                    Ok(requests) => {
                        for req in &requests {
                            if let Err(violation) = req.check_invariants() {
                                tracing::warn!(%violation, "backend record breaks lifecycle rules");
                            }
                        }
                        self.my_requests = requests;
                        if let Some(id) = self.selected_object {
                            if self.is_object_disabled(id) {
                                tracing::debug!(object_id = id, "selection already has a pending request");
                                self.selected_object = None;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to load own requests");
                        self.banner = Some(Banner::error("Failed to load your requests"));
                    }
                }
            }
            RequesterEvent::Submitted { object_id, result } => {
                self.submitting = false;
                match result {
                    Ok(()) => {
                        tracing::info!(object_id, "access request submitted");
                        self.selected_object = None;
                        self.reason.clear();
                        self.banner = Some(Banner::success("Access request submitted", now));
                        self.refresh_at = Some(now + REFRESH_DELAY);
                    }
                    Err(e) => {
                        tracing::warn!(object_id, error = %e, "submit failed");
                        self.banner = Some(Banner::error(e.user_message("Failed to submit request")));
                    }
                }
            }
        }
    }

    pub fn drain(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.apply(event, now);
            applied += 1;
        }
        applied
    }

    pub async fn next_event(&mut self) -> bool {
        match self.rx.recv().await {
            Some(event) => {
                self.apply(event, Instant::now());
                true
            }
            None => false,
        }
    }

    /// Expire the banner and fire the delayed refresh once due
    pub fn tick(&mut self, now: Instant) {
        banner::expire(&mut self.banner, now);
        if self.refresh_at.map(|t| now >= t).unwrap_or(false) {
            self.refresh_at = None;
            self.load_my_requests();
        }
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    // ------------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------------

    pub fn objects(&self) -> &[CostObject] {
        &self.objects
    }

    pub fn my_requests(&self) -> &[AccessRequest] {
        &self.my_requests
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_loading(&self) -> bool {
        self.loading > 0
    }

    pub fn refresh_pending(&self) -> bool {
        self.refresh_at.is_some()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banner::BannerKind;
    use crate::views::fake::{object, pending, FakeApi};
    use std::sync::atomic::Ordering;

    fn objects() -> Vec<crate::models::CostObject> {
        vec![object(1, "A", "Obj1"), object(2, "B", "Obj2")]
    }

    async fn mounted(api: Arc<FakeApi>) -> RequesterView {
        let mut view = RequesterView::new(api);
        view.mount();
        view.next_event().await;
        view.next_event().await;
        view
    }

    #[tokio::test]
    async fn test_mount_loads_objects_and_history() {
        let api = Arc::new(FakeApi::new(objects(), vec![pending(5, 2)]));
        let view = mounted(api).await;

        assert_eq!(view.objects().len(), 2);
        assert_eq!(view.my_requests().len(), 1);
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn test_pending_object_is_disabled() {
        let api = Arc::new(FakeApi::new(objects(), vec![pending(5, 2)]));
        let mut view = mounted(api).await;

        assert!(view.is_object_disabled(2));
        assert!(!view.is_object_disabled(1));

        assert!(!view.select_object(2));
        assert_eq!(view.selected_object_id(), None);
        assert!(view.select_object(1));
        assert_eq!(view.selected_object().and_then(|o| o.code.as_deref()), Some("A"));
    }

    #[tokio::test]
    async fn test_decided_request_does_not_disable() {
        let mut rejected = pending(5, 2);
        rejected.status = AccessRequestStatus::Rejected;
        rejected.processed_at = Some(chrono::Utc::now());
        rejected.rejection_reason = Some("no".to_string());
        let api = Arc::new(FakeApi::new(objects(), vec![rejected]));
        let mut view = mounted(api).await;

        assert!(!view.is_object_disabled(2));
        assert!(view.select_object(2));
    }

    #[tokio::test]
    async fn test_submit_without_selection_is_local_error() {
        let api = Arc::new(FakeApi::new(objects(), vec![]));
        let mut view = mounted(api.clone()).await;
        view.reason = "keep me".to_string();

        assert!(!view.submit());
        assert_eq!(view.banner().map(|b| b.kind), Some(BannerKind::Error));
        assert_eq!(view.reason, "keep me");
        assert!(api.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_success_clears_form_and_refreshes_later() {
        let api = Arc::new(FakeApi::new(objects(), vec![]));
        let mut view = mounted(api.clone()).await;
        let my_calls = api.my_calls.load(Ordering::SeqCst);

        view.select_object(1);
        view.reason = "weekly cost review".to_string();
        assert!(view.submit());
        assert!(view.is_submitting());
        assert!(!view.can_submit());

        view.next_event().await;
        assert!(!view.is_submitting());
        assert_eq!(view.selected_object_id(), None);
        assert!(view.reason.is_empty());
        assert_eq!(view.banner().map(|b| b.kind), Some(BannerKind::Success));
        assert!(view.refresh_pending());

        // not due yet
        view.tick(Instant::now());
        assert_eq!(api.my_calls.load(Ordering::SeqCst), my_calls);

        view.tick(Instant::now() + REFRESH_DELAY + Duration::from_millis(100));
        assert!(!view.refresh_pending());
        view.next_event().await;
        assert_eq!(api.my_calls.load(Ordering::SeqCst), my_calls + 1);

        assert_eq!(view.my_requests().len(), 1);
        assert_eq!(view.my_requests()[0].reason.as_deref(), Some("weekly cost review"));
        assert!(view.is_object_disabled(1));
    }

    #[tokio::test]
    async fn test_forced_duplicate_shows_backend_detail() {
        let api = Arc::new(FakeApi::new(objects(), vec![pending(5, 2)]));

        // history not loaded yet, so the guard cannot apply
        let mut view = RequesterView::new(api.clone());
        assert!(view.select_object(2));

        assert!(view.submit());
        view.next_event().await;

        let banner = view.banner().unwrap();
        assert_eq!(banner.kind, BannerKind::Error);
        assert_eq!(banner.text, "You already have a pending request for this object");
        assert_eq!(view.selected_object_id(), Some(2));
    }

    #[tokio::test]
    async fn test_early_selection_dropped_when_history_shows_pending() {
        let api = Arc::new(FakeApi::new(objects(), vec![pending(5, 2)]));
        let mut view = RequesterView::new(api);
        assert!(view.select_object(2));

        view.mount();
        view.next_event().await;
        view.next_event().await;

        assert!(view.is_object_disabled(2));
        assert_eq!(view.selected_object_id(), None);
        assert!(!view.can_submit());
    }

    #[tokio::test]
    async fn test_submit_server_error_is_generic() {
        let api = Arc::new(FakeApi::new(objects(), vec![]));
        let mut view = mounted(api.clone()).await;
        api.fail_actions.store(true, Ordering::SeqCst);

        view.select_object(1);
        view.submit();
        view.next_event().await;

        assert_eq!(view.banner().map(|b| b.text.as_str()), Some("Failed to submit request"));
        assert!(!view.refresh_pending());
    }

    #[tokio::test]
    async fn test_load_failure_does_not_retry() {
        let api = Arc::new(FakeApi::new(objects(), vec![]));
        api.fail_loads.store(true, Ordering::SeqCst);
        let mut view = mounted(api.clone()).await;

        assert!(view.banner().is_some());
        assert!(view.objects().is_empty());

        view.tick(Instant::now() + Duration::from_secs(60));
        assert_eq!(api.my_calls.load(Ordering::SeqCst), 1);
        assert_eq!(view.drain(Instant::now()), 0);
    }
}
