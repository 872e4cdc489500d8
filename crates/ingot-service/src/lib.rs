// SPDX-License-Identifier: MIT OR Apache-2.0
//! The ticket service: one entry point from a free-form reference to a
//! normalized ticket.
//!
//! [`TicketService::get_ticket`] runs the full acquisition flow — provider
//! lookup, canonical-id parse, cache read, primary fetch with fallback,
//! normalization, cache write — and owns the lifetime of its fetchers and
//! cache. [`ServiceBuilder`] composes a service from a backend handle
//! and/or an authentication manager, wiring the fetcher topology the
//! support matrix allows.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod service;

pub use builder::ServiceBuilder;
pub use service::{GetTicketOptions, TicketService, run_scoped};
