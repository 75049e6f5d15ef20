//! # Ownership manager
//!
//! At most one client owns the arm at any time. Ownership is held in the [`SessionState`] so it
//! is guarded by the same lock as the rest of the session.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::arm::Client;
use log::info;

use crate::state::SessionState;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Grants and revokes exclusive control of the arm.
#[derive(Clone)]
pub struct OwnershipManager {
    state: SessionState,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A successful change of ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipChange {
    /// The client is now the owner of the arm.
    Connected(Client),

    /// The client is no longer the owner of the arm.
    Disconnected(Client),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OwnershipError {
    #[error("The arm is already owned by {0}")]
    Busy(Client),

    #[error("The client is not valid (empty identifier)")]
    InvalidClient,

    #[error("The client is not the owner of the arm")]
    NotOwner,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OwnershipManager {
    pub fn new(state: SessionState) -> Self {
        Self { state }
    }

    /// Make the candidate the owner of the arm, if the arm has no owner.
    pub fn acquire(&self, candidate: &Client) -> Result<OwnershipChange, OwnershipError> {
        if !candidate.is_valid() {
            return Err(OwnershipError::InvalidClient);
        }

        let mut inner = self.state.lock();

        match &inner.owner {
            Some(owner) => Err(OwnershipError::Busy(owner.clone())),
            None => {
                inner.owner = Some(candidate.clone());
                info!("Arm is now owned by {}", candidate);
                Ok(OwnershipChange::Connected(candidate.clone()))
            }
        }
    }

    /// Release the arm, if the requester is its owner.
    ///
    /// Requests from any other client leave the owner untouched.
    pub fn release(&self, requester: &Client) -> Result<OwnershipChange, OwnershipError> {
        let mut inner = self.state.lock();

        match &inner.owner {
            Some(owner) if owner == requester => {
                inner.owner = None;
                info!("Arm released by {}", requester);
                Ok(OwnershipChange::Disconnected(requester.clone()))
            }
            _ => Err(OwnershipError::NotOwner),
        }
    }

    /// Return true if there is an owner and it is the requester.
    pub fn authorize(&self, requester: &Client) -> bool {
        matches!(&self.state.lock().owner, Some(owner) if owner == requester)
    }

    /// The current owner of the arm.
    pub fn owner(&self) -> Option<Client> {
        self.state.owner()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_acquire_when_unowned() {
        let om = OwnershipManager::new(SessionState::new());

        assert_eq!(
            om.acquire(&Client::new("alice")),
            Ok(OwnershipChange::Connected(Client::new("alice")))
        );
        assert_eq!(om.owner(), Some(Client::new("alice")));
        assert!(om.authorize(&Client::new("alice")));
        assert!(!om.authorize(&Client::new("bob")));
    }

    #[test]
    fn test_second_acquire_is_busy() {
        let om = OwnershipManager::new(SessionState::new());

        om.acquire(&Client::new("alice")).unwrap();

        assert_eq!(
            om.acquire(&Client::new("bob")),
            Err(OwnershipError::Busy(Client::new("alice")))
        );
        assert_eq!(
            om.acquire(&Client::new("alice")),
            Err(OwnershipError::Busy(Client::new("alice")))
        );
        assert_eq!(om.owner(), Some(Client::new("alice")));
    }

    #[test]
    fn test_invalid_client_cannot_acquire() {
        let om = OwnershipManager::new(SessionState::new());

        assert_eq!(om.acquire(&Client::new("")), Err(OwnershipError::InvalidClient));
        assert_eq!(om.owner(), None);
        assert!(!om.authorize(&Client::new("")));
    }

    #[test]
    fn test_release_only_by_owner() {
        let om = OwnershipManager::new(SessionState::new());

        assert_eq!(om.release(&Client::new("alice")), Err(OwnershipError::NotOwner));

        om.acquire(&Client::new("alice")).unwrap();

        assert_eq!(om.release(&Client::new("bob")), Err(OwnershipError::NotOwner));
        assert_eq!(om.owner(), Some(Client::new("alice")));

        assert_eq!(
            om.release(&Client::new("alice")),
            Ok(OwnershipChange::Disconnected(Client::new("alice")))
        );
        assert_eq!(om.owner(), None);

        // The arm can be acquired again once released
        assert!(om.acquire(&Client::new("bob")).is_ok());
    }
}
