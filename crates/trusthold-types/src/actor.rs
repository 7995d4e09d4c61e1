//! The "performed by" reference attached to every mutating action.
//!
//! A tagged `{kind, id}` pair instead of a dynamically-resolved reference:
//! the escrow core never needs to load the actor, only to record who acted.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The class of actor performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Admin,
    User,
    Seller,
    System,
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN"),
            Self::User => write!(f, "USER"),
            Self::Seller => write!(f, "SELLER"),
            Self::System => write!(f, "SYSTEM"),
        }
    }
}

/// Who performed an action. `System` carries no id; everyone else does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorRef {
    pub kind: ActorKind,
    pub id: Option<Uuid>,
}

impl ActorRef {
    #[must_use]
    pub fn system() -> Self {
        Self {
            kind: ActorKind::System,
            id: None,
        }
    }

    #[must_use]
    pub fn admin(id: Uuid) -> Self {
        Self {
            kind: ActorKind::Admin,
            id: Some(id),
        }
    }

    #[must_use]
    pub fn user(id: Uuid) -> Self {
        Self {
            kind: ActorKind::User,
            id: Some(id),
        }
    }

    #[must_use]
    pub fn seller(id: Uuid) -> Self {
        Self {
            kind: ActorKind::Seller,
            id: Some(id),
        }
    }

    #[must_use]
    pub fn is_system(&self) -> bool {
        self.kind == ActorKind::System
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}:{id}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}
