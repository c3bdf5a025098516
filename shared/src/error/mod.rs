//! Unified error taxonomy for the workflow core
//!
//! Every public operation returns a typed result; all variants are
//! recoverable at the call site. The core never terminates the process.
//!
//! # Error code ranges
//!
//! - E0xxx: validation / lookup
//! - E4xxx: order state machine
//! - E5xxx: delivery & settlement
//! - E6xxx: shift ledger
//! - E9xxx: store / concurrency

use thiserror::Error;

use crate::models::order::OrderStatus;

/// Domain error
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    /// Malformed input: bad quantities, out-of-range discount, negative cash
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Target status is not reachable from the current status
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// State-machine contract violated outside the transition graph
    /// (e.g. assigning a courier to an order that is not READY)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Order-mutating operation attempted without an open shift
    #[error("No open shift")]
    NoOpenShift,

    /// Only one shift may be open at a time
    #[error("A shift is already open")]
    ShiftAlreadyOpen,

    /// Shift is sealed and immutable
    #[error("Shift already closed: {0}")]
    ShiftAlreadyClosed(String),

    /// Settlement batch contained an already-settled order
    #[error("Order already settled: {0}")]
    AlreadySettled(String),

    /// Referenced order/courier/shift/neighborhood does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Lost-update race; the caller should retry with fresh state
    #[error("Conflict, retry with fresh state: {0}")]
    Conflict(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Stable machine-readable code for logs and API surfaces
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "E0002",
            DomainError::NotFound(_) => "E0003",
            DomainError::InvalidTransition { .. } => "E4001",
            DomainError::InvalidState(_) => "E4002",
            DomainError::NoOpenShift => "E4003",
            DomainError::AlreadySettled(_) => "E5001",
            DomainError::ShiftAlreadyOpen => "E6001",
            DomainError::ShiftAlreadyClosed(_) => "E6002",
            DomainError::Conflict(_) => "E9001",
        }
    }
}
