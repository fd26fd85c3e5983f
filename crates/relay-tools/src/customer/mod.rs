//! Customer-service tool set.
//!
//! An in-memory [`OrderStore`] plus the four tools the order and refund
//! agents call: [`LookupOrderTool`], [`ListOrdersTool`],
//! [`CalculateRefundTool`], and [`ProcessRefundTool`]. Every tool checks
//! that the requested order belongs to the customer the session is on
//! behalf of.

pub mod orders;
pub mod refunds;
pub mod store;

pub use orders::{ListOrdersTool, LookupOrderTool};
pub use refunds::{CalculateRefundTool, ProcessRefundTool};
pub use store::{CustomerProfile, Order, OrderStatus, OrderStore};
