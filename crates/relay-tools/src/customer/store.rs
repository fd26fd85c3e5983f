//! In-memory order and customer store.
//!
//! Backs the customer-service tools. The store is read-only after
//! construction; refund processing reports against it without mutating
//! it, so tool dispatch stays idempotent.

use std::collections::HashMap;
use std::fmt;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// The customer a session is acting on behalf of.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    /// Stable customer identifier (e.g. `"CUST-123"`).
    pub customer_id: String,
    /// Display name.
    pub name: String,
    /// Whether the customer has premium status (affects refund policy).
    pub premium: bool,
}

/// Fulfillment state of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Payment taken, not yet shipped.
    Processing,
    /// In transit.
    Shipped,
    /// Delivered to the customer.
    Delivered,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        };
        f.write_str(s)
    }
}

/// A single order on file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order identifier (e.g. `"ORD-001"`).
    pub id: String,
    /// Owning customer.
    pub customer_id: String,
    /// Item description.
    pub item: String,
    /// Price in cents.
    pub price_cents: u64,
    /// Fulfillment state.
    pub status: OrderStatus,
    /// Carrier tracking number, once available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking: Option<String>,
    /// Estimated or actual delivery date (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
}

/// Format a cent amount as `$X.YY`.
#[must_use]
pub fn format_price(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

/// In-memory order and customer database.
pub struct OrderStore {
    orders: HashMap<String, Order>,
    customers: HashMap<String, CustomerProfile>,
}

impl OrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
            customers: HashMap::new(),
        }
    }

    /// A store seeded with the demo fixtures: two customers and three
    /// orders in each fulfillment state.
    #[must_use]
    pub fn seeded() -> Self {
        let mut store = Self::new();
        let eta_in_transit = (Utc::now() + Duration::days(2)).format("%Y-%m-%d").to_string();
        let delivered_on = (Utc::now() - Duration::days(3)).format("%Y-%m-%d").to_string();

        store.insert_customer(CustomerProfile {
            customer_id: "CUST-123".into(),
            name: "Alice Johnson".into(),
            premium: true,
        });
        store.insert_customer(CustomerProfile {
            customer_id: "CUST-456".into(),
            name: "Bob Smith".into(),
            premium: false,
        });

        store.insert_order(Order {
            id: "ORD-001".into(),
            customer_id: "CUST-123".into(),
            item: "Wireless Headphones".into(),
            price_cents: 7999,
            status: OrderStatus::Shipped,
            tracking: Some("1Z999AA10123456784".into()),
            eta: Some(eta_in_transit),
        });
        store.insert_order(Order {
            id: "ORD-002".into(),
            customer_id: "CUST-123".into(),
            item: "Phone Case".into(),
            price_cents: 1999,
            status: OrderStatus::Delivered,
            tracking: Some("1Z999AA10123456785".into()),
            eta: Some(delivered_on),
        });
        store.insert_order(Order {
            id: "ORD-003".into(),
            customer_id: "CUST-456".into(),
            item: "USB Cable".into(),
            price_cents: 1299,
            status: OrderStatus::Processing,
            tracking: None,
            eta: None,
        });
        store
    }

    /// Add or replace an order.
    pub fn insert_order(&mut self, order: Order) {
        let _ = self.orders.insert(order.id.clone(), order);
    }

    /// Add or replace a customer profile.
    pub fn insert_customer(&mut self, customer: CustomerProfile) {
        let _ = self
            .customers
            .insert(customer.customer_id.clone(), customer);
    }

    /// Look up an order by ID.
    #[must_use]
    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// All orders belonging to a customer, sorted by order ID.
    #[must_use]
    pub fn orders_for(&self, customer_id: &str) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id)
            .collect();
        orders.sort_by(|a, b| a.id.cmp(&b.id));
        orders
    }

    /// Look up a customer profile by ID.
    #[must_use]
    pub fn customer(&self, customer_id: &str) -> Option<&CustomerProfile> {
        self.customers.get(customer_id)
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
