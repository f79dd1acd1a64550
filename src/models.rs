// 📋 Access Request Models - Wire types + lifecycle rules
// Requests start PENDING and are decided exactly once (APPROVED or REJECTED).
// The backend owns these records; the client only mirrors them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessRequestStatus {
    #[serde(alias = "pending")]
    Pending,

    #[serde(alias = "approved")]
    Approved,

    #[serde(alias = "rejected")]
    Rejected,
}

impl AccessRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessRequestStatus::Pending => "PENDING",
            AccessRequestStatus::Approved => "APPROVED",
            AccessRequestStatus::Rejected => "REJECTED",
        }
    }

    /// Human label used in listings
    pub fn label(&self) -> &'static str {
        match self {
            AccessRequestStatus::Pending => "Pending",
            AccessRequestStatus::Approved => "Approved",
            AccessRequestStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AccessRequestStatus::Pending)
    }

    /// Only a pending request can move, and only to a decision
    pub fn can_transition_to(&self, next: AccessRequestStatus) -> bool {
        matches!(
            (self, next),
            (AccessRequestStatus::Pending, AccessRequestStatus::Approved)
                | (AccessRequestStatus::Pending, AccessRequestStatus::Rejected)
        )
    }

    /// Case-insensitive parse, used by the CLI `--status` flag
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "PENDING" => Some(AccessRequestStatus::Pending),
            "APPROVED" => Some(AccessRequestStatus::Approved),
            "REJECTED" => Some(AccessRequestStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for AccessRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// REFERENCES
// ============================================================================

/// Short reference to the object a request targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Short reference to the requester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    #[serde(alias = "full_name", default)]
    pub name: String,
}

// ============================================================================
// ACCESS REQUEST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub id: i64,

    /// Target object id (always present on the wire)
    pub object_id: i64,

    /// Expanded target object, when the backend joins it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    /// Expanded requester, when the backend joins it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,

    pub status: AccessRequestStatus,

    /// Free text supplied by the requester
    #[serde(default)]
    pub reason: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,

    /// Id of the administrator who decided the request
    #[serde(default)]
    pub processed_by: Option<i64>,

    /// Present only on REJECTED requests
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleViolation {
    #[error("request {0} is REJECTED but has no rejection reason")]
    MissingRejectionReason(i64),

    #[error("request {0} carries a rejection reason but is {1}")]
    UnexpectedRejectionReason(i64, AccessRequestStatus),

    #[error("request {0} is {1} but has no processing timestamp")]
    MissingProcessedAt(i64, AccessRequestStatus),

    #[error("request {0} is PENDING but already carries processing data")]
    ProcessedWhilePending(i64),
}

impl AccessRequest {
    /// Approve/Reject controls are offered only while this holds
    pub fn is_actionable(&self) -> bool {
        self.status == AccessRequestStatus::Pending
    }

    /// Check the record against the lifecycle rules:
    /// rejection_reason <=> REJECTED, processed_at/processed_by <=> not PENDING.
    /// `processed_by` may be absent on a processed record.
    pub fn check_invariants(&self) -> Result<(), LifecycleViolation> {
        let has_reason = self
            .rejection_reason
            .as_deref()
            .map(|r| !r.trim().is_empty())
            .unwrap_or(false);

        match self.status {
            AccessRequestStatus::Rejected if !has_reason => {
                return Err(LifecycleViolation::MissingRejectionReason(self.id));
            }
            AccessRequestStatus::Pending | AccessRequestStatus::Approved if has_reason => {
                return Err(LifecycleViolation::UnexpectedRejectionReason(self.id, self.status));
            }
            _ => {}
        }

        match self.status {
            AccessRequestStatus::Pending => {
                if self.processed_at.is_some() || self.processed_by.is_some() {
                    return Err(LifecycleViolation::ProcessedWhilePending(self.id));
                }
            }
            status => {
                if self.processed_at.is_none() {
                    return Err(LifecycleViolation::MissingProcessedAt(self.id, status));
                }
            }
        }

        Ok(())
    }

    /// Display name of the target object, falling back to its id
    pub fn object_label(&self) -> String {
        match &self.object {
            Some(obj) => match &obj.code {
                Some(code) if !code.is_empty() => format!("{} ({})", obj.name, code),
                _ => obj.name.clone(),
            },
            None => format!("Object #{}", self.object_id),
        }
    }

    /// Display name of the requester, falling back to the user id
    pub fn requester_label(&self) -> String {
        match (&self.user, self.user_id) {
            (Some(user), _) if !user.name.is_empty() => user.name.clone(),
            (Some(user), _) => format!("User #{}", user.id),
            (None, Some(id)) => format!("User #{}", id),
            (None, None) => "Unknown".to_string(),
        }
    }
}

// ============================================================================
// COST OBJECT
// ============================================================================

/// Trackable project/object, read-only reference data on the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostObject {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    /// Lifecycle status, opaque to this client
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub contract_number: Option<String>,
}

impl CostObject {
    pub fn label(&self) -> String {
        match self.code.as_deref() {
            Some(code) if !code.is_empty() => format!("{} · {}", code, self.name),
            _ => self.name.clone(),
        }
    }
}

// ============================================================================
// REQUEST BODIES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RequestAccessBody {
    pub reason: Option<String>,
}

impl RequestAccessBody {
    /// Blank reasons go over the wire as null
    pub fn new(reason: Option<&str>) -> Self {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from);
        RequestAccessBody { reason }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectBody {
    pub reason: String,
}

// ============================================================================
// COUNTERS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl RequestCounts {
    pub fn tally<'a, I>(requests: I) -> Self
    where
        I: IntoIterator<Item = &'a AccessRequest>,
    {
        let mut counts = RequestCounts::default();
        for req in requests {
            counts.total += 1;
            match req.status {
                AccessRequestStatus::Pending => counts.pending += 1,
                AccessRequestStatus::Approved => counts.approved += 1,
                AccessRequestStatus::Rejected => counts.rejected += 1,
            }
        }
        counts
    }
}

// ============================================================================
// TESTS
// ============================================================================
