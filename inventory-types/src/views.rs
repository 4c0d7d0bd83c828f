//! Dual-currency read models.
//!
//! Views pair USD amounts with their local-currency equivalents. Which rate
//! a view uses depends on what it shows: catalog prices and pending orders
//! follow the current rate, while sales and finalized orders use the rate
//! frozen on the record.

use exchange_rates::{Money, Rate, USD, VES, to_local};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CurrentRate, LineItem, Order, Product, ProductId, Sale};

/// A line item priced in both currencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: i32,
    #[schema(value_type = i64)]
    pub unit_price_usd: Money<USD>,
    #[schema(value_type = i64)]
    pub unit_price_local: Money<VES>,
    #[schema(value_type = i64)]
    pub subtotal_usd: Money<USD>,
    #[schema(value_type = i64)]
    pub subtotal_local: Money<VES>,
}

impl PricedLine {
    pub fn at(line: &LineItem, rate: Rate) -> Self {
        let subtotal_usd = line.subtotal_usd();
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price_usd: line.unit_price_usd,
            unit_price_local: to_local(line.unit_price_usd, rate),
            subtotal_usd,
            subtotal_local: to_local(subtotal_usd, rate),
        }
    }
}

fn price_lines(lines: &[LineItem], rate: Rate) -> Vec<PricedLine> {
    lines.iter().map(|line| PricedLine::at(line, rate)).collect()
}

/// A product with its local price at the current rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// Live conversion of `price_usd`
    #[schema(value_type = i64)]
    pub price_local: Money<VES>,
    #[schema(value_type = f64)]
    pub rate: Rate,
    pub low_stock: bool,
}

impl ProductView {
    pub fn new(product: Product, rate: Rate) -> Self {
        Self {
            price_local: product.price_local(rate),
            low_stock: product.is_low_stock(),
            product,
            rate,
        }
    }
}

/// A sale with every local figure at its own frozen rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SaleView {
    #[serde(flatten)]
    pub sale: Sale,
    pub priced_lines: Vec<PricedLine>,
    #[schema(value_type = i64)]
    pub subtotal_usd: Money<USD>,
    #[schema(value_type = i64)]
    pub total_usd: Money<USD>,
    #[schema(value_type = i64)]
    pub total_local: Money<VES>,
}

impl From<Sale> for SaleView {
    fn from(sale: Sale) -> Self {
        Self {
            priced_lines: price_lines(&sale.lines, sale.rate),
            subtotal_usd: sale.subtotal_usd(),
            total_usd: sale.total_usd(),
            total_local: sale.total_local(),
            sale,
        }
    }
}

/// A purchase order priced at its frozen rate, or at the current rate while
/// it is still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub priced_lines: Vec<PricedLine>,
    #[schema(value_type = i64)]
    pub total_usd: Money<USD>,
    #[schema(value_type = i64)]
    pub total_local: Money<VES>,
    /// Rate the local figures were computed at
    #[schema(value_type = f64)]
    pub applied_rate: Rate,
    pub rate_frozen: bool,
}

impl OrderView {
    pub fn new(order: Order, current: Rate) -> Self {
        let applied_rate = order.effective_rate(current);
        Self {
            priced_lines: price_lines(&order.lines, applied_rate),
            total_usd: order.total_usd(),
            total_local: order.total_local(current),
            applied_rate,
            rate_frozen: order.rate.is_some(),
            order,
        }
    }
}

/// A priced cart that has not been recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SaleQuote {
    pub lines: Vec<PricedLine>,
    #[schema(value_type = i64)]
    pub total_usd: Money<USD>,
    #[schema(value_type = i64)]
    pub total_local: Money<VES>,
    pub rate: CurrentRate,
}

impl SaleQuote {
    pub fn new(lines: &[LineItem], rate: CurrentRate) -> Self {
        let total_usd = crate::domain::line::lines_total_usd(lines);
        Self {
            lines: price_lines(lines, rate.rate),
            total_usd,
            total_local: to_local(total_usd, rate.rate),
            rate,
        }
    }
}

/// Aggregate figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventorySummary {
    pub active_products: usize,
    pub low_stock_products: usize,
    pub out_of_stock_products: usize,
    pub total_units: i64,
    #[schema(value_type = i64)]
    pub stock_value_usd: Money<USD>,
    /// Stock value at the current rate
    #[schema(value_type = i64)]
    pub stock_value_local: Money<VES>,
    pub completed_sales: usize,
    #[schema(value_type = i64)]
    pub sales_total_usd: Money<USD>,
    /// Sum of each sale's frozen local total
    #[schema(value_type = i64)]
    pub sales_total_local: Money<VES>,
    pub pending_orders: usize,
    pub rate: CurrentRate,
}
