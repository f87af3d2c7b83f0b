use serde::Serialize;

/// The single global labor rate row.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct LaborCost {
    pub id: i64,
    pub rate_per_sqft: f64,
}
