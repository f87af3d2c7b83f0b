use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub product_id: i64,
    // Snapshot of the product at booking time.
    pub product_name: String,
    pub height_ft: f64,
    pub width_ft: f64,
    pub quantity: i64,
    pub sqft_price_at_booking: f64,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

/// An invoice row ready to be inserted. The total is already computed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub product_id: i64,
    pub product_name: String,
    pub height_ft: f64,
    pub width_ft: f64,
    pub quantity: i64,
    pub sqft_price_at_booking: f64,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}
