//! Product stock domain entities
//!
//! Warehouse stock per SKU plus per-DA consignment holdings. The stock
//! table's badge colors and restock hints are derived here, not stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::agent::AgentId;

/// When suggesting a restock, aim for this many multiples of the reorder level
pub const RESTOCK_MULTIPLIER: i64 = 2;

/// Stock-keeping unit, e.g. `SKU-BEV-001`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sku(pub String);

impl Sku {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl std::fmt::Display for Sku {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Sku {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Health badge for a stock level (the dashboard's color thresholds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockHealth {
    Healthy,
    Low,
    Critical,
    OutOfStock,
}

impl StockHealth {
    /// Classify a quantity against its reorder level
    pub fn from_qty(qty: i64, reorder_level: i64) -> Self {
        if qty <= 0 {
            StockHealth::OutOfStock
        } else if qty * 2 < reorder_level {
            StockHealth::Critical
        } else if qty < reorder_level {
            StockHealth::Low
        } else {
            StockHealth::Healthy
        }
    }

    /// Worst-first ordering for the restock list
    pub fn severity(&self) -> u8 {
        match self {
            StockHealth::OutOfStock => 3,
            StockHealth::Critical => 2,
            StockHealth::Low => 1,
            StockHealth::Healthy => 0,
        }
    }
}

impl std::fmt::Display for StockHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockHealth::Healthy => write!(f, "healthy"),
            StockHealth::Low => write!(f, "low"),
            StockHealth::Critical => write!(f, "critical"),
            StockHealth::OutOfStock => write!(f, "out_of_stock"),
        }
    }
}

/// A product in the warehouse
#[derive(Debug, Clone, Serialize)]
pub struct ProductStock {
    pub sku: Sku,
    pub name: String,
    pub category: String,
    pub unit_price_kobo: i64,
    pub warehouse_qty: i64,
    pub reorder_level: i64,
    pub created_at: DateTime<Utc>,
}

impl ProductStock {
    pub fn health(&self) -> StockHealth {
        StockHealth::from_qty(self.warehouse_qty, self.reorder_level)
    }

    /// Units to order to bring the warehouse back to a comfortable level.
    /// Zero when the stock is healthy.
    pub fn restock_suggestion(&self) -> i64 {
        if self.health() == StockHealth::Healthy {
            0
        } else {
            (self.reorder_level * RESTOCK_MULTIPLIER - self.warehouse_qty).max(0)
        }
    }
}

/// Data needed to register a product
#[derive(Debug, Clone)]
pub struct NewProductStock {
    pub sku: Sku,
    pub name: String,
    pub category: String,
    pub unit_price_kobo: i64,
    pub warehouse_qty: i64,
    pub reorder_level: i64,
}

/// Consignment stock held in the field by one DA
#[derive(Debug, Clone, Serialize)]
pub struct ConsignmentHolding {
    pub da_id: AgentId,
    pub sku: Sku,
    pub qty: i64,
}
