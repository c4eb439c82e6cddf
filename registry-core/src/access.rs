//! Access control: administrator identity and issuer authorization
//!
//! Stateless predicate checks composed as preconditions in front of every
//! mutating operation. The administrator identity is fixed at construction;
//! the authorized-issuer set is mutable only through
//! [`AccessControl::set_issuer_authorization`].

use crate::error::{Error, Result};
use crate::types::Address;
use std::collections::HashSet;

/// Administrator identity plus the authorized-issuer set
#[derive(Debug, Clone)]
pub struct AccessControl {
    owner: Address,
    authorized_issuers: HashSet<Address>,
}

impl AccessControl {
    /// Create with the given administrator identity
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            authorized_issuers: HashSet::new(),
        }
    }

    /// The administrator identity
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Whether `identity` is the administrator
    pub fn is_owner(&self, identity: &Address) -> bool {
        &self.owner == identity
    }

    /// Whether `identity` may issue credits
    pub fn is_authorized_issuer(&self, identity: &Address) -> bool {
        self.authorized_issuers.contains(identity)
    }

    /// Grant or revoke issuer authorization.
    ///
    /// No existence requirement on the target: authorization can be granted
    /// before the identity registers.
    pub fn set_issuer_authorization(&mut self, identity: Address, allowed: bool) {
        if allowed {
            self.authorized_issuers.insert(identity);
        } else {
            self.authorized_issuers.remove(&identity);
        }
    }

    /// Fail with `Unauthorized` unless `caller` is the administrator
    pub fn require_owner(&self, caller: &Address) -> Result<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(Error::Unauthorized(format!(
                "{caller} is not the registry administrator"
            )))
        }
    }
}
