//! Authorization seam for lock overrides.

use crate::models::{CallerIdentity, Document};

/// Decides whether a caller may release a lock held by someone else
pub trait Authorizer: Send + Sync {
    fn can_override_lock(&self, caller: &CallerIdentity, document: &Document) -> bool;
}

/// Grants overrides to elevated roles only
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAuthorizer;

impl Authorizer for RoleAuthorizer {
    fn can_override_lock(&self, caller: &CallerIdentity, _document: &Document) -> bool {
        caller.role.is_elevated()
    }
}
