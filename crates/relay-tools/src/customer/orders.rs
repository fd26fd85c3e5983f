//! Order lookup tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use relay_core::tools::{Tool, ToolOutput, ToolParameterSchema, text_result};

use crate::customer::store::{OrderStore, format_price};
use crate::errors::ToolError;
use crate::traits::{RelayTool, ToolContext};

// ─────────────────────────────────────────────────────────────────────────────
// lookup_order
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LookupOrderParams {
    order_id: String,
}

/// Look up the details of a single order by ID.
pub struct LookupOrderTool {
    store: Arc<OrderStore>,
}

impl LookupOrderTool {
    /// Create the tool over the given store.
    #[must_use]
    pub fn new(store: Arc<OrderStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RelayTool for LookupOrderTool {
    fn name(&self) -> &str {
        "lookup_order"
    }

    fn definition(&self) -> Tool {
        Tool {
            name: "lookup_order".into(),
            description: "Look up order details by order ID.".into(),
            parameters: ToolParameterSchema {
                schema_type: "object".into(),
                properties: Some({
                    let mut m = serde_json::Map::new();
                    let _ = m.insert(
                        "order_id".into(),
                        json!({"type": "string", "description": "The order ID, e.g. ORD-001"}),
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
        let params: LookupOrderParams = serde_json::from_value(params)?;

        let Some(order) = self.store.order(&params.order_id) else {
            return Ok(text_result(
                format!("Order {} not found.", params.order_id),
                false,
            ));
        };

        if order.customer_id != ctx.customer.customer_id {
            return Ok(text_result(
                format!("Order {} does not belong to your account.", params.order_id),
                false,
            ));
        }

        let tracking = order.tracking.as_deref().unwrap_or("Not yet available");
        let eta = order.eta.as_deref().unwrap_or("N/A");
        let summary = format!(
            "Order {}:\n- Item: {}\n- Price: {}\n- Status: {}\n- Tracking: {}\n- ETA: {}",
            order.id,
            order.item,
            format_price(order.price_cents),
            order.status.to_string().to_uppercase(),
            tracking,
            eta,
        );
        Ok(text_result(summary, false))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// list_customer_orders
// ─────────────────────────────────────────────────────────────────────────────

/// List every order belonging to the session's customer.
pub struct ListOrdersTool {
    store: Arc<OrderStore>,
}

impl ListOrdersTool {
    /// Create the tool over the given store.
    #[must_use]
    pub fn new(store: Arc<OrderStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RelayTool for ListOrdersTool {
    fn name(&self) -> &str {
        "list_customer_orders"
    }

    fn definition(&self) -> Tool {
        Tool {
            name: "list_customer_orders".into(),
            description: "List all orders for the current customer.".into(),
            parameters: ToolParameterSchema::empty_object(),
        }
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let orders = self.store.orders_for(&ctx.customer.customer_id);
        if orders.is_empty() {
            return Ok(text_result("No orders found for your account.", false));
        }

        let lines: Vec<String> = orders
            .iter()
            .map(|o| {
                format!(
                    "- {}: {} ({}) - {}",
                    o.id,
                    o.item,
                    format_price(o.price_cents),
                    o.status
                )
            })
            .collect();
        Ok(text_result(
            format!("Your orders:\n{}", lines.join("\n")),
            false,
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::ids::{SessionId, ToolCallId};
    use serde_json::Map;
    use tokio_util::sync::CancellationToken;

    use crate::customer::store::CustomerProfile;

    fn alice_ctx() -> ToolContext {
        ToolContext {
            tool_call_id: ToolCallId::new(),
            session_id: SessionId::new(),
            customer: CustomerProfile {
                customer_id: "CUST-123".into(),
                name: "Alice Johnson".into(),
                premium: true,
            },
            scratch: Map::new(),
            cancellation: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn lookup_returns_order_details() {
        let tool = LookupOrderTool::new(Arc::new(OrderStore::seeded()));
        let out = tool
            .execute(json!({"order_id": "ORD-001"}), &alice_ctx())
            .await
            .unwrap();
        assert!(!out.is_error());
        assert!(out.content.contains("Wireless Headphones"));
        assert!(out.content.contains("$79.99"));
        assert!(out.content.contains("SHIPPED"));
        assert!(out.content.contains("1Z999AA10123456784"));
    }

    #[tokio::test]
    async fn lookup_unknown_order() {
        let tool = LookupOrderTool::new(Arc::new(OrderStore::seeded()));
        let out = tool
            .execute(json!({"order_id": "ORD-999"}), &alice_ctx())
            .await
            .unwrap();
        assert_eq!(out.content, "Order ORD-999 not found.");
    }

    #[tokio::test]
    async fn lookup_refuses_foreign_order() {
        let tool = LookupOrderTool::new(Arc::new(OrderStore::seeded()));
        // ORD-003 belongs to CUST-456
        let out = tool
            .execute(json!({"order_id": "ORD-003"}), &alice_ctx())
            .await
            .unwrap();
        assert_eq!(out.content, "Order ORD-003 does not belong to your account.");
    }

    #[tokio::test]
    async fn lookup_missing_param_is_json_error() {
        let tool = LookupOrderTool::new(Arc::new(OrderStore::seeded()));
        let result = tool.execute(json!({}), &alice_ctx()).await;
        assert!(matches!(result, Err(ToolError::Json(_))));
    }

    #[tokio::test]
    async fn list_returns_customer_orders_only() {
        let tool = ListOrdersTool::new(Arc::new(OrderStore::seeded()));
        let out = tool.execute(json!({}), &alice_ctx()).await.unwrap();
        assert!(out.content.contains("ORD-001"));
        assert!(out.content.contains("ORD-002"));
        assert!(!out.content.contains("ORD-003"));
    }

    #[tokio::test]
    async fn list_empty_for_unknown_customer() {
        let tool = ListOrdersTool::new(Arc::new(OrderStore::seeded()));
        let mut ctx = alice_ctx();
        ctx.customer.customer_id = "CUST-000".into();
        let out = tool.execute(json!({}), &ctx).await.unwrap();
        assert_eq!(out.content, "No orders found for your account.");
    }
}
