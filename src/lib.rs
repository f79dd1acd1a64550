// Object Access - Core Library
// Access-request lifecycle, REST client and view state for CLI and TUI

pub mod auth;
pub mod banner;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod views;

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use auth::AuthContext;
pub use banner::{Banner, BannerKind};
pub use client::{AccessApi, ApiClient};
pub use config::Config;
pub use error::ApiError;
pub use models::{
    AccessRequest, AccessRequestStatus, CostObject, LifecycleViolation,
    ObjectRef, RequestCounts, UserRef,
};
pub use views::{AdminView, RequesterView, StatusFilter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
