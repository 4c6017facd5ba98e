//! # Wire Types
//!
//! Request/response shapes for the REST API, and the conversions between
//! wire decimals and internal integer cents.
//!
//! ## Money at the Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Client JSON          Wire type           Internal                      │
//! │  ───────────          ─────────           ────────                      │
//! │  "unit_price": 25.0 → Decimal(25.00)   →  Money(2500 cents)             │
//! │  "total_price": ...  ← Decimal(75.00)  ←  Money(7500 cents)             │
//! │                                                                         │
//! │  Decimal is exact, so 25.00 is 2500 cents, never 2499.999...            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use mostrador_core::{Money, NewSaleItem, SaleFilter, SaleLineItem, SalePage, SaleWithItems};

// =============================================================================
// Money Conversions
// =============================================================================

/// Converts a wire price to internal cents.
///
/// Prices are rounded to 2 decimal places on the way in, so `19.999`
/// becomes 2000 cents. Negative prices are rejected.
pub fn decimal_to_money(price: Decimal) -> Result<Money, ApiError> {
    if price.is_sign_negative() {
        return Err(ApiError::validation("unit_price must not be negative"));
    }

    let cents = (price * Decimal::from(100)).round();
    let cents = cents
        .to_i64()
        .ok_or_else(|| ApiError::validation("unit_price is out of range"))?;

    Ok(Money::from_cents(cents))
}

/// Converts internal cents to a wire decimal with exactly 2 decimal places.
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

// =============================================================================
// Sale Creation
// =============================================================================

/// Body of `POST /api/sales`.
#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub items: Vec<CreateSaleItemRequest>,
}

/// One requested line item.
#[derive(Debug, Deserialize)]
pub struct CreateSaleItemRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Omitted price means a zero-priced line.
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

impl CreateSaleRequest {
    /// Converts the request into domain items, rejecting bad prices.
    pub fn into_items(self) -> Result<Vec<NewSaleItem>, ApiError> {
        self.items
            .into_iter()
            .map(CreateSaleItemRequest::into_new_sale_item)
            .collect()
    }
}

impl CreateSaleItemRequest {
    fn into_new_sale_item(self) -> Result<NewSaleItem, ApiError> {
        let unit_price = match self.unit_price {
            Some(price) => decimal_to_money(price)?,
            None => Money::zero(),
        };

        Ok(NewSaleItem {
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price,
        })
    }
}

// =============================================================================
// Sale Responses
// =============================================================================

/// A sale with its line items, as returned by `POST /api/sales` and
/// `GET /api/sales/:id`.
#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub id: i64,
    pub sale_number: String,
    pub total_items: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<SaleItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct SaleItemResponse {
    pub id: i64,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<SaleWithItems> for SaleResponse {
    fn from(sale: SaleWithItems) -> Self {
        SaleResponse {
            id: sale.sale.id,
            sale_number: sale.sale.sale_number,
            total_items: sale.sale.total_items,
            created_at: sale.sale.created_at,
            updated_at: sale.sale.updated_at,
            items: sale.items.into_iter().map(SaleItemResponse::from).collect(),
        }
    }
}

impl From<SaleLineItem> for SaleItemResponse {
    fn from(item: SaleLineItem) -> Self {
        SaleItemResponse {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            category: item.category,
            quantity: item.quantity,
            unit_price: cents_to_decimal(item.unit_price_cents),
            total_price: cents_to_decimal(item.total_price_cents),
            created_at: item.created_at,
        }
    }
}

// =============================================================================
// Sale Listing
// =============================================================================

/// Query parameters of `GET /api/sales`.
#[derive(Debug, Default, Deserialize)]
pub struct ListSalesQuery {
    pub search: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<ListSalesQuery> for SaleFilter {
    fn from(query: ListSalesQuery) -> Self {
        let defaults = SaleFilter::default();
        SaleFilter {
            search: query.search,
            start_date: query.start_date,
            end_date: query.end_date,
            page: query.page.unwrap_or(defaults.page),
            limit: query.limit.unwrap_or(defaults.limit),
        }
    }
}

/// One page of the sale listing.
#[derive(Debug, Serialize)]
pub struct SalesPageResponse {
    pub sales: Vec<SaleSummaryResponse>,
    pub total: i64,
    pub page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Serialize)]
pub struct SaleSummaryResponse {
    pub id: i64,
    pub sale_number: String,
    pub total_items: i64,
    pub items_count: i64,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<SalePage> for SalesPageResponse {
    fn from(page: SalePage) -> Self {
        SalesPageResponse {
            sales: page
                .sales
                .into_iter()
                .map(|summary| SaleSummaryResponse {
                    id: summary.id,
                    sale_number: summary.sale_number,
                    total_items: summary.total_items,
                    items_count: summary.items_count,
                    total_amount: cents_to_decimal(summary.total_amount_cents),
                    created_at: summary.created_at,
                })
                .collect(),
            total: page.total,
            page: page.page,
            total_pages: page.total_pages,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
