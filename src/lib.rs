//! Transaction request workflow for a property-management backend.
//!
//! A request moves a sale or lease of a property through a gated approval
//! sequence: each step names the role that may act, some steps require a
//! specific document to be attached first, every accepted step appends one
//! immutable audit entry, and approving a lease binds the uploaded contract
//! to the property record. [`service::RequestService`] is the only writer;
//! [`state::evaluate`] holds the whole rule table.

pub mod details;
pub mod document;
pub mod error;
pub mod history;
pub mod request;
pub mod service;
pub mod state;
pub mod store;
pub mod utils;
