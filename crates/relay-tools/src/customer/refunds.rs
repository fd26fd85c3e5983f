//! Refund calculation and processing tools.
//!
//! Policy: orders still processing can be cancelled for a full refund;
//! shipped orders are refundable on return for premium customers only;
//! delivered orders are refundable, with manager approval above $50.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use relay_core::tools::{Tool, ToolOutput, ToolParameterSchema, text_result};

use crate::customer::store::{OrderStatus, OrderStore, format_price};
use crate::errors::ToolError;
use crate::traits::{RelayTool, ToolContext};

/// Above this amount, delivered-order refunds need manager approval.
const APPROVAL_THRESHOLD_CENTS: u64 = 5000;

// ─────────────────────────────────────────────────────────────────────────────
// calculate_refund
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CalculateRefundParams {
    order_id: String,
    reason: String,
}

/// Determine refund eligibility and amount for an order.
pub struct CalculateRefundTool {
    store: Arc<OrderStore>,
}

impl CalculateRefundTool {
    /// Create the tool over the given store.
    #[must_use]
    pub fn new(store: Arc<OrderStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RelayTool for CalculateRefundTool {
    fn name(&self) -> &str {
        "calculate_refund"
    }

    fn definition(&self) -> Tool {
        Tool {
            name: "calculate_refund".into(),
            description: "Calculate refund eligibility and amount for an order.".into(),
            parameters: ToolParameterSchema {
                schema_type: "object".into(),
                properties: Some({
                    let mut m = serde_json::Map::new();
                    let _ = m.insert(
                        "order_id".into(),
                        json!({"type": "string", "description": "The order ID, e.g. ORD-002"}),
                    );
                    let _ = m.insert(
                        "reason".into(),
                        json!({"type": "string", "description": "Why the customer wants a refund"}),
                    );
                    m
                }),
                required: Some(vec!["order_id".into(), "reason".into()]),
                description: None,
                extra: serde_json::Map::new(),
            },
        }
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let params: CalculateRefundParams = serde_json::from_value(params)?;

        let Some(order) = self.store.order(&params.order_id) else {
            return Ok(text_result(
                format!("Order {} not found.", params.order_id),
                false,
            ));
        };

        if order.customer_id != ctx.customer.customer_id {
            return Ok(text_result(
                "This order does not belong to your account.",
                false,
            ));
        }

        let price = format_price(order.price_cents);
        let reason = &params.reason;
        let verdict = match order.status {
            OrderStatus::Processing => format!(
                "Order {} can be cancelled for a full refund of {price}. Reason: {reason}",
                order.id
            ),
            OrderStatus::Shipped => {
                if ctx.customer.premium {
                    format!(
                        "Premium customer: eligible for a full refund of {price} upon return. Reason: {reason}"
                    )
                } else {
                    format!(
                        "Order in transit. Please wait for delivery to request a refund. Reason: {reason}"
                    )
                }
            }
            OrderStatus::Delivered => {
                let approval_note = if order.price_cents > APPROVAL_THRESHOLD_CENTS {
                    " (requires manager approval)"
                } else {
                    ""
                };
                format!("Refund eligible: {price}{approval_note}. Reason: {reason}")
            }
        };
        Ok(text_result(verdict, false))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// process_refund
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ProcessRefundParams {
    order_id: String,
}

/// Process an approved refund for an order.
pub struct ProcessRefundTool {
    store: Arc<OrderStore>,
}

impl ProcessRefundTool {
    /// Create the tool over the given store.
    #[must_use]
    pub fn new(store: Arc<OrderStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RelayTool for ProcessRefundTool {
    fn name(&self) -> &str {
        "process_refund"
    }

    fn definition(&self) -> Tool {
        Tool {
            name: "process_refund".into(),
            description: "Process an approved refund for an order.".into(),
            parameters: ToolParameterSchema {
                schema_type: "object".into(),
                properties: Some({
                    let mut m = serde_json::Map::new();
                    let _ = m.insert(
                        "order_id".into(),
                        json!({"type": "string", "description": "The order ID to refund"}),
                    );
                    m
                }),
                required: Some(vec!["order_id".into()]),
                description: None,
                extra: serde_json::Map::new(),
            },
        }
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let params: ProcessRefundParams = serde_json::from_value(params)?;

        let Some(order) = self.store.order(&params.order_id) else {
            return Ok(text_result(
                format!("Order {} not found.", params.order_id),
                false,
            ));
        };

        if order.customer_id != ctx.customer.customer_id {
            return Ok(text_result(
                "This order does not belong to your account.",
                false,
            ));
        }

        let receipt = format!(
            "Refund processed successfully!\n- Order: {}\n- Amount: {}\n- Method: Original payment method\n- Timeline: 3-5 business days\n\nThank you for your patience, {}!",
            order.id,
            format_price(order.price_cents),
            ctx.customer.name,
        );
        Ok(text_result(receipt, false))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
