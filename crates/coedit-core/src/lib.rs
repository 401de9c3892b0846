//! # Coedit Core
//!
//! Core data models, error types, and configuration for the document
//! versioning and collaborative-locking engine. This crate defines the
//! canonical types that all other crates depend on.
//!
//! ## Architecture Principles
//!
//! - **Type-Driven Design**: `LockState` is a tagged enum, so an expired lock
//!   cannot linger as a half-present field
//! - **Zero Panic in Libraries**: All errors are `Result<T, Error>`
//! - **Append-only History**: a `Version` is written once and never changed
//! - **Injected Collaborators**: time ([`Clock`]) and authorization
//!   ([`Authorizer`]) come from the caller
//!
//! ## Core Modules
//!
//! - [`models`] - Documents, versions, locks and caller identity
//! - [`error`] - Error taxonomy and Result alias
//! - [`config`] - Engine configuration with builder and YAML persistence
//! - [`profiles`] - Preset configurations
//! - [`clock`] - System and manual clocks
//! - [`auth`] - Lock override authorization
//! - [`metrics`] - Lock-free engine counters
//!
//! ## Usage Examples
//!
//! ```
//! use coedit_core::prelude::*;
//! use chrono::Utc;
//!
//! let doc = Document::new("Notes", "a b c", Utc::now());
//! assert_eq!(doc.current_version, 1);
//! assert_eq!(doc.stats.word_count, 3);
//! assert!(doc.check_invariants().is_ok());
//! ```

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod profiles;

pub use auth::{Authorizer, RoleAuthorizer};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::*;
pub use error::{Error, Result};
pub use metrics::{Counter, EngineMetrics, MetricsSnapshot};
pub use models::*;
pub use profiles::ConfigProfile;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::auth::{Authorizer, RoleAuthorizer};
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::EngineConfig;
    pub use crate::error::{Error, Result};
    pub use crate::metrics::{EngineMetrics, MetricsSnapshot};
    pub use crate::models::{
        CallerIdentity, ChangeType, Document, DocumentId, DocumentLock, DocumentStats, LockState,
        Role, UserRef, Version, VersionDiff,
    };
    pub use crate::profiles::ConfigProfile;
}
