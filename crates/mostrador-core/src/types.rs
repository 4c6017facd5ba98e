//! # Domain Types
//!
//! Core domain types used throughout Mostrador.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │  SaleLineItem   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (business)  │   │  id (surrogate) │   │  product_id     │       │
//! │  │  name           │   │  sale_number    │   │  name snapshot  │       │
//! │  │  category       │   │  total_items    │   │  quantity       │       │
//! │  │  quantity       │   │  timestamps     │   │  prices (cents) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A Sale has:
//! - `id`: integer surrogate key - immutable, used for database relations
//! - `sale_number`: human-readable code (`VENT-000001`) - what people quote

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::{SALE_NUMBER_PREFIX, SALE_NUMBER_WIDTH};

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// The sale transaction treats `quantity` as a counter it decrements and
/// must never drive negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Human-readable business identifier (e.g. `REP-000001`).
    pub id: String,

    /// Display name shown on sale line items.
    pub name: String,

    /// Category name, denormalized into line items at sale time.
    pub category: String,

    /// Current quantity-on-hand.
    pub quantity: i64,

    /// Acquisition cost in cents (for inventory valuation).
    pub unit_cost_cents: Option<i64>,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether `quantity` units can be sold from current stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }

    /// Returns the unit cost as Money, if recorded.
    #[inline]
    pub fn unit_cost(&self) -> Option<Money> {
        self.unit_cost_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale transaction header.
///
/// Created exactly once, atomically, together with all its line items and
/// the corresponding stock decrements; never updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    /// Surrogate key assigned by the store.
    pub id: i64,

    /// Unique, monotonically increasing code (`VENT-000001`).
    pub sale_number: String,

    /// Sum of all line-item quantities.
    pub total_items: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale Line Item
// =============================================================================

/// One product's contribution to a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLineItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Product category at time of sale (frozen).
    pub category: String,
    /// Quantity sold (always positive).
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Line total (unit_price × quantity), stored redundantly for reporting.
    pub total_price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleLineItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

/// A sale header together with its line items, as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleWithItems {
    pub sale: Sale,
    pub items: Vec<SaleLineItem>,
}

// =============================================================================
// Sale Creation Input
// =============================================================================

/// One requested line of a new sale, after caller-side validation.
///
/// `unit_price` defaults to zero when the caller omits it; the store
/// re-validates stock as its own invariant regardless of what the caller
/// checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSaleItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

/// Sums the requested quantities of a sale (the header's `total_items`).
pub fn total_items(items: &[NewSaleItem]) -> i64 {
    items.iter().map(|item| item.quantity).sum()
}

// =============================================================================
// Sale Listing
// =============================================================================

/// Filters for the paginated sale listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleFilter {
    /// Substring match on the sale number.
    pub search: Option<String>,
    /// Inclusive lower bound on creation time.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time.
    pub end_date: Option<DateTime<Utc>>,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl Default for SaleFilter {
    fn default() -> Self {
        SaleFilter {
            search: None,
            start_date: None,
            end_date: None,
            page: 1,
            limit: 10,
        }
    }
}

/// One row of the sale listing, with aggregates over its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleSummary {
    pub id: i64,
    pub sale_number: String,
    pub total_items: i64,
    /// Number of line items on the sale.
    pub items_count: i64,
    /// Sum of line totals in cents.
    pub total_amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// One page of the sale listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalePage {
    pub sales: Vec<SaleSummary>,
    pub total: i64,
    pub page: u32,
    pub total_pages: u32,
}

// =============================================================================
// Sale Number Codec
// =============================================================================

/// Formats a sequence value as a sale code.
///
/// ## Example
/// ```rust
/// use mostrador_core::types::format_sale_number;
///
/// assert_eq!(format_sale_number(1), "VENT-000001");
/// assert_eq!(format_sale_number(123456), "VENT-123456");
/// ```
///
/// Values wider than the pad keep all their digits; codes never truncate.
pub fn format_sale_number(seq: i64) -> String {
    format!(
        "{}{:0width$}",
        SALE_NUMBER_PREFIX,
        seq,
        width = SALE_NUMBER_WIDTH
    )
}

/// Parses the numeric suffix out of a sale code.
///
/// Returns `None` for codes that don't carry the expected prefix or whose
/// suffix isn't a number. The store skips such codes when deriving the next
/// sequence value rather than failing the whole sale.
pub fn parse_sale_number(code: &str) -> Option<i64> {
    code.strip_prefix(SALE_NUMBER_PREFIX)?.parse().ok()
}

// =============================================================================
// Unit Tests
// =============================================================================
