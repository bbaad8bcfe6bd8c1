//! Error types.
//!
//! Transition failures never surface from `display`; they are absorbed into
//! `fail` events. These errors cover the host-facing edges only.

use thiserror::Error;

use crate::transition::Ticket;
use crate::FrameId;

/// Failure reported by the fetch collaborator for a frame's content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("frame {0} has no source url")]
    MissingSource(FrameId),

    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected response status {0}")]
    Status(u16),
}

/// Errors returned to the host driving a router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("no pending effect for ticket {0}")]
    UnknownTicket(Ticket),

    #[error("ticket {0} was issued for a different kind of effect")]
    TicketMismatch(Ticket),

    #[error("no router attached to container {0}")]
    NotAttached(String),
}

/// Configuration parsing errors.
#[cfg(feature = "toml")]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid router options: {0}")]
    Toml(#[from] toml::de::Error),
}
