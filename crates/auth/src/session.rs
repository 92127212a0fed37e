use std::sync::{Arc, RwLock};

use stockforge_core::{DomainError, DomainResult};

use crate::Principal;

/// Source of the caller's identity for ledger operations.
///
/// Every mutating and reading operation resolves its principal through this
/// trait; an absent principal is refused before any storage access happens.
pub trait Session: Send + Sync {
    /// The authenticated principal, if any.
    fn current_principal(&self) -> Option<Principal>;

    /// The authenticated principal, or [`DomainError::Unauthenticated`].
    fn require_principal(&self) -> DomainResult<Principal> {
        self.current_principal()
            .ok_or(DomainError::Unauthenticated)
    }
}

impl<S: Session> Session for Arc<S> {
    fn current_principal(&self) -> Option<Principal> {
        self.as_ref().current_principal()
    }
}

/// Session pinned to one principal for its whole lifetime. Suitable for
/// tests and single-operator deployments.
#[derive(Debug, Clone)]
pub struct FixedSession {
    principal: Principal,
}

impl FixedSession {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }
}

impl Session for FixedSession {
    fn current_principal(&self) -> Option<Principal> {
        Some(self.principal.clone())
    }
}

/// Session with nobody signed in. Every operation behind it is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSession;

impl Session for NoSession {
    fn current_principal(&self) -> Option<Principal> {
        None
    }
}

/// Mutable session shared across threads: principals sign in and out over
/// the process lifetime.
#[derive(Debug, Default)]
pub struct SharedSession {
    current: RwLock<Option<Principal>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(principal: Principal) -> Self {
        Self {
            current: RwLock::new(Some(principal)),
        }
    }

    pub fn sign_in(&self, principal: Principal) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(principal);
    }

    pub fn sign_out(&self) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

impl Session for SharedSession {
    fn current_principal(&self) -> Option<Principal> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
