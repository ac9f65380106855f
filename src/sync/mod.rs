//! Backend synchronization.
//!
//! The backend owns the permission graph. This module talks to it through a
//! [`Transport`] and keeps the client-side copy current.

mod api;
mod controller;
mod error;
mod fetch;
mod transport;

#[cfg(test)]
mod fake;

pub use api::{BackendClient, IS_ADDITION};
pub use controller::{LoadTicket, Outcome, SelectionTicket, SyncController};
pub use error::SyncError;
pub use fetch::FetchTransport;
pub use transport::Transport;
