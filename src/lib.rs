//! # hashnav-core
//!
//! Hash-fragment frame routing for web views.
//!
//! A container holds sibling *frames*, elements marked with `data-frame`.
//! The router shows exactly one of them, chosen by the location fragment,
//! and fades between them when the fragment changes.
//!
//! This crate provides platform-agnostic logic for:
//! - Resolving the location fragment (or its absence) to a frame
//! - Sequencing transitions: lazy loading from `data-url`, fades, events
//! - Passing context from a navigation command to the resulting transition
//! - Driving a real DOM container (with optional web support)
//!
//! ## Features
//!
//! - `serde` - Enable serialization/deserialization for options and commands
//! - `toml` - Parse router options from TOML
//! - `web` - Enable the web-sys driver for DOM containers
//!
//! ## Example
//!
//! ```rust,ignore
//! use hashnav_core::{Command, Effect, FrameRouter, RouterOptions};
//!
//! // Attach to a container; the host implements FrameTree + Navigation
//! let mut router = FrameRouter::attach(&document, RouterOptions::new());
//!
//! // Carry out queued effects, completing fades and fetches later
//! while let Some(effect) = router.poll_effect() {
//!     host.perform(effect);
//! }
//!
//! // Navigate, handing a context value to the next transition
//! router.command(&document, Command::display_with("orders", order_id));
//! ```

pub mod error;
mod events;
mod fragment;
mod frame;
mod host;
mod loader;
pub mod memory;
mod options;
mod registry;
mod router;
mod transition;
#[cfg(feature = "web")]
pub mod web;

pub use error::{FetchError, RouterError};
#[cfg(feature = "toml")]
pub use error::ConfigError;
pub use events::{EventBus, EventKind, ListenerId, RouterEvent};
pub use fragment::{is_blank, Fragment, CONTEXT_SEPARATOR};
pub use frame::{FrameId, FrameRef, DEFAULT_ATTR, FRAME_ATTR, URL_ATTR};
pub use host::{Effect, FrameTree, Navigation, PLACEHOLDER_HTML};
pub use loader::LoadState;
pub use options::{Command, RouterOptions};
pub use registry::RouterRegistry;
pub use router::FrameRouter;
pub use transition::{Context, Ticket, Transition};

#[cfg(feature = "web")]
pub use web::{WebConfig, WebRouter};
