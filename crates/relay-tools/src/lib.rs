//! # relay-tools
//!
//! The tool layer of the Relay dispatch core.
//!
//! [`RelayTool`] is the trait every tool handler implements;
//! [`ToolRegistry`] is the name-keyed index the runtime dispatches
//! through; [`schema::validate_arguments`] gates every invocation so a
//! handler never runs on arguments that don't match its schema.
//!
//! The [`customer`] module contains the customer-service tool set
//! (order lookup and listing, refund calculation and processing) over an
//! in-memory order store.

pub mod customer;
pub mod errors;
pub mod registry;
pub mod schema;
pub mod traits;

pub use errors::ToolError;
pub use registry::ToolRegistry;
pub use traits::{RelayTool, ToolContext};
