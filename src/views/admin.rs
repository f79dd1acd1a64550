// 🛡️ Admin Review View - Approve / reject access requests per object
//
// Unselected → ObjectSelected → RequestsLoaded
// The view never flips a request's status itself: a successful action
// only triggers a refetch, and the backend's answer is what gets shown.

use super::spawn_into;
use crate::banner::{self, Banner};
use crate::client::AccessApi;
use crate::error::ApiError;
use crate::models::{AccessRequest, AccessRequestStatus, CostObject, RequestCounts};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

// ============================================================================
// FILTER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    All,
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Pending,
        StatusFilter::Approved,
        StatusFilter::Rejected,
    ];

    pub fn matches(&self, req: &AccessRequest) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => req.status == AccessRequestStatus::Pending,
            StatusFilter::Approved => req.status == AccessRequestStatus::Approved,
            StatusFilter::Rejected => req.status == AccessRequestStatus::Rejected,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Pending => "Pending",
            StatusFilter::Approved => "Approved",
            StatusFilter::Rejected => "Rejected",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Pending,
            StatusFilter::Pending => StatusFilter::Approved,
            StatusFilter::Approved => StatusFilter::Rejected,
            StatusFilter::Rejected => StatusFilter::All,
        }
    }
}

impl From<Option<AccessRequestStatus>> for StatusFilter {
    fn from(status: Option<AccessRequestStatus>) -> Self {
        match status {
            None => StatusFilter::All,
            Some(AccessRequestStatus::Pending) => StatusFilter::Pending,
            Some(AccessRequestStatus::Approved) => StatusFilter::Approved,
            Some(AccessRequestStatus::Rejected) => StatusFilter::Rejected,
        }
    }
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminPhase {
    Unselected,
    ObjectSelected(i64),
    RequestsLoaded(i64),
}

/// What the action area of one request card offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestControls {
    /// Request is decided; no actions
    Hidden,
    Enabled,
    /// An action on this request is in flight
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectModal {
    pub request_id: i64,
    pub reason: String,
}

impl RejectModal {
    pub fn has_reason(&self) -> bool {
        !self.reason.trim().is_empty()
    }
}

/// Results of spawned API calls, applied by `AdminView::apply`
#[derive(Debug)]
pub enum AdminEvent {
    ObjectsLoaded(Result<Vec<CostObject>, ApiError>),
    RequestsLoaded {
        object_id: i64,
        result: Result<Vec<AccessRequest>, ApiError>,
    },
    Approved {
        request_id: i64,
        result: Result<(), ApiError>,
    },
    Rejected {
        request_id: i64,
        result: Result<(), ApiError>,
    },
}

pub struct AdminView {
    api: Arc<dyn AccessApi>,
    tx: UnboundedSender<AdminEvent>,
    rx: UnboundedReceiver<AdminEvent>,

    objects: Vec<CostObject>,
    selected_object: Option<i64>,
    requests: Vec<AccessRequest>,
    requests_loaded_for: Option<i64>,

    pub filter: StatusFilter,
    /// Requests with an approve/reject call in flight
    processing: HashSet<i64>,
    reject_modal: Option<RejectModal>,
    banner: Option<Banner>,

    loading_objects: bool,
    loading_requests: bool,
}

impl AdminView {
    pub fn new(api: Arc<dyn AccessApi>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        AdminView {
            api,
            tx,
            rx,
            objects: Vec::new(),
            selected_object: None,
            requests: Vec::new(),
            requests_loaded_for: None,
            filter: StatusFilter::default(),
            processing: HashSet::new(),
            reject_modal: None,
            banner: None,
            loading_objects: false,
            loading_requests: false,
        }
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Load the object list; the first object gets selected when it arrives
    pub fn mount(&mut self) {
        self.loading_objects = true;
        let api = Arc::clone(&self.api);
        spawn_into(&self.tx, async move {
            AdminEvent::ObjectsLoaded(api.list_objects().await)
        });
    }

    pub fn select_object(&mut self, object_id: i64) {
        if self.selected_object != Some(object_id) {
            self.requests.clear();
            self.requests_loaded_for = None;
        }
        self.selected_object = Some(object_id);
        self.load_requests(object_id);
    }

    pub fn select_object_at(&mut self, index: usize) {
        if let Some(id) = self.objects.get(index).map(|o| o.id) {
            self.select_object(id);
        }
    }

    fn load_requests(&mut self, object_id: i64) {
        self.loading_requests = true;
        let api = Arc::clone(&self.api);
        spawn_into(&self.tx, async move {
            AdminEvent::RequestsLoaded {
                object_id,
                result: api.list_access_requests(object_id).await,
            }
        });
    }

    fn refresh(&mut self) {
        if let Some(id) = self.selected_object {
            self.load_requests(id);
        }
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    pub fn controls_for(&self, req: &AccessRequest) -> RequestControls {
        if !req.is_actionable() {
            RequestControls::Hidden
        } else if self.processing.contains(&req.id) {
            RequestControls::Busy
        } else {
            RequestControls::Enabled
        }
    }

    fn actionable(&self, request_id: i64) -> Option<&AccessRequest> {
        self.requests
            .iter()
            .find(|r| r.id == request_id)
            .filter(|r| self.controls_for(r) == RequestControls::Enabled)
    }

    /// Start an approval. Returns false when the request offers no controls.
    pub fn approve(&mut self, request_id: i64) -> bool {
        let object_id = match self.actionable(request_id) {
            Some(req) => req.object_id,
            None => return false,
        };

        self.processing.insert(request_id);
        let api = Arc::clone(&self.api);
        spawn_into(&self.tx, async move {
            AdminEvent::Approved {
                request_id,
                result: api.approve(object_id, request_id).await,
            }
        });
        true
    }

    pub fn open_reject(&mut self, request_id: i64) -> bool {
        if self.actionable(request_id).is_none() {
            return false;
        }
        self.reject_modal = Some(RejectModal {
            request_id,
            reason: String::new(),
        });
        true
    }

    pub fn reject_modal(&self) -> Option<&RejectModal> {
        self.reject_modal.as_ref()
    }

    pub fn reject_reason_mut(&mut self) -> Option<&mut String> {
        self.reject_modal.as_mut().map(|m| &mut m.reason)
    }

    pub fn cancel_reject(&mut self) {
        self.reject_modal = None;
    }

    /// Reject submit is live only with a non-blank reason and nothing in flight
    pub fn can_submit_reject(&self) -> bool {
        match &self.reject_modal {
            Some(modal) => modal.has_reason() && !self.processing.contains(&modal.request_id),
            None => false,
        }
    }

    pub fn confirm_reject(&mut self) -> bool {
        if !self.can_submit_reject() {
            return false;
        }
        let (request_id, reason) = match &self.reject_modal {
            Some(m) => (m.request_id, m.reason.trim().to_string()),
            None => return false,
        };
        let object_id = match self.requests.iter().find(|r| r.id == request_id) {
            Some(req) => req.object_id,
            None => {
                // the list was refetched and the request is gone
                tracing::warn!(request_id, "reject target no longer loaded");
                self.reject_modal = None;
                self.banner = Some(Banner::error("Request is no longer available"));
                return false;
            }
        };

        self.processing.insert(request_id);
        let api = Arc::clone(&self.api);
        spawn_into(&self.tx, async move {
            AdminEvent::Rejected {
                request_id,
                result: api.reject(object_id, request_id, &reason).await,
            }
        });
        true
    }

    // ------------------------------------------------------------------------
    // Event handling
    // ------------------------------------------------------------------------

    pub fn apply(&mut self, event: AdminEvent, now: Instant) {
        match event {
            AdminEvent::ObjectsLoaded(Ok(objects)) => {
                self.loading_objects = false;
                tracing::debug!(count = objects.len(), "objects loaded");
                self.objects = objects;
                let still_there = self
                    .selected_object
                    .map(|id| self.objects.iter().any(|o| o.id == id))
                    .unwrap_or(false);
                if !still_there {
                    if let Some(first) = self.objects.first().map(|o| o.id) {
                        self.select_object(first);
                    }
                }
            }
            AdminEvent::ObjectsLoaded(Err(e)) => {
                self.loading_objects = false;
                tracing::warn!(error = %e, "failed to load objects");
                self.banner = Some(Banner::error("Failed to load objects"));
            }
            AdminEvent::RequestsLoaded { object_id, result } => {
                if self.selected_object != Some(object_id) {
                    tracing::debug!(object_id, "dropping requests for deselected object");
                    return;
                }
                self.loading_requests = false;
                match result {
                    Ok(requests) => {
                        for req in &requests {
                            if let Err(violation) = req.check_invariants() {
                                tracing::warn!(%violation, "backend record breaks lifecycle rules");
                            }
                        }
                        self.requests = requests;
                        self.requests_loaded_for = Some(object_id);
                    }
                    Err(e) => {
                        tracing::warn!(object_id, error = %e, "failed to load access requests");
                        self.banner = Some(Banner::error("Failed to load access requests"));
                    }
                }
            }
            AdminEvent::Approved { request_id, result } => {
                self.finish_processing(request_id);
                match result {
                    Ok(()) => {
                        self.banner = Some(Banner::success(
                            format!("Request #{} approved", request_id),
                            now,
                        ));
                        self.refresh();
                    }
                    Err(e) => {
                        tracing::warn!(request_id, error = %e, "approve failed");
                        self.banner = Some(Banner::error("Failed to approve request"));
                    }
                }
            }
            AdminEvent::Rejected { request_id, result } => {
                self.finish_processing(request_id);
                match result {
                    Ok(()) => {
                        if self.reject_modal.as_ref().map(|m| m.request_id) == Some(request_id) {
                            self.reject_modal = None;
                        }
                        self.banner = Some(Banner::success(
                            format!("Request #{} rejected", request_id),
                            now,
                        ));
                        self.refresh();
                    }
                    Err(e) => {
                        // modal stays open with its reason so the admin can retry
                        tracing::warn!(request_id, error = %e, "reject failed");
                        self.banner = Some(Banner::error("Failed to reject request"));
                    }
                }
            }
        }
    }

    fn finish_processing(&mut self, request_id: i64) {
        self.processing.remove(&request_id);
    }

    /// Apply every result that has arrived so far
    pub fn drain(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.apply(event, now);
            applied += 1;
        }
        applied
    }

    /// Wait for the next result and apply it
    pub async fn next_event(&mut self) -> bool {
        match self.rx.recv().await {
            Some(event) => {
                self.apply(event, Instant::now());
                true
            }
            None => false,
        }
    }

    pub fn tick(&mut self, now: Instant) {
        banner::expire(&mut self.banner, now);
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    // ------------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------------

    pub fn phase(&self) -> AdminPhase {
        match self.selected_object {
            None => AdminPhase::Unselected,
            Some(id) if self.requests_loaded_for == Some(id) => AdminPhase::RequestsLoaded(id),
            Some(id) => AdminPhase::ObjectSelected(id),
        }
    }

    pub fn objects(&self) -> &[CostObject] {
        &self.objects
    }

    pub fn selected_object(&self) -> Option<&CostObject> {
        self.selected_object
            .and_then(|id| self.objects.iter().find(|o| o.id == id))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_object
            .and_then(|id| self.objects.iter().position(|o| o.id == id))
    }

    pub fn requests(&self) -> &[AccessRequest] {
        &self.requests
    }

    pub fn visible_requests(&self) -> Vec<&AccessRequest> {
        self.requests
            .iter()
            .filter(|r| self.filter.matches(r))
            .collect()
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    pub fn counts(&self) -> RequestCounts {
        RequestCounts::tally(&self.requests)
    }

    /// Pending count for the sidebar. Only the loaded object can have one;
    /// other objects show nothing until selected.
    pub fn pending_badge(&self, object_id: i64) -> Option<usize> {
        if self.requests_loaded_for != Some(object_id) {
            return None;
        }
        let pending = self
            .requests
            .iter()
            .filter(|r| r.status == AccessRequestStatus::Pending)
            .count();
        if pending > 0 {
            Some(pending)
        } else {
            None
        }
    }

    pub fn is_processing(&self, request_id: i64) -> bool {
        self.processing.contains(&request_id)
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading_objects || self.loading_requests
    }
}

// ============================================================================
// TESTS
// ============================================================================
