use std::time::{Duration, Instant};

/// How long a success banner stays up
pub const SUCCESS_BANNER_TTL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

/// Notification line shown above a view.
/// Success banners expire on their own; error banners stay until dismissed
/// or replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
    expires_at: Option<Instant>,
}

impl Banner {
    pub fn success(text: impl Into<String>, now: Instant) -> Self {
        Banner {
            kind: BannerKind::Success,
            text: text.into(),
            expires_at: Some(now + SUCCESS_BANNER_TTL),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Banner {
            kind: BannerKind::Error,
            text: text.into(),
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|t| now >= t).unwrap_or(false)
    }
}

/// Drop `slot` once its deadline has passed
pub fn expire(slot: &mut Option<Banner>, now: Instant) {
    if slot.as_ref().map(|b| b.is_expired(now)).unwrap_or(false) {
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_expires_after_ttl() {
        let start = Instant::now();
        let mut slot = Some(Banner::success("done", start));

        expire(&mut slot, start + Duration::from_millis(2999));
        assert!(slot.is_some());

        expire(&mut slot, start + Duration::from_millis(3000));
        assert!(slot.is_none());
    }

    #[test]
    fn test_error_is_sticky() {
        let start = Instant::now();
        let mut slot = Some(Banner::error("failed"));
        expire(&mut slot, start + Duration::from_secs(3600));
        assert_eq!(slot.map(|b| b.kind), Some(BannerKind::Error));
    }
}
