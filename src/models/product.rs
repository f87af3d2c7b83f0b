use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_per_sqft: f64,
    pub category_id: i64,
}

/// Fields accepted when an admin adds a product.
#[derive(Deserialize, Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price_per_sqft: f64,
    pub category_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_price(self.price_per_sqft)
    }
}

/// Partial edit of a product. Absent fields keep their current value.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price_per_sqft: Option<f64>,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl ProductChanges {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price_per_sqft {
            validate_price(price)?;
        }
        Ok(())
    }

    /// Apply the changes on top of an existing product.
    pub fn apply(self, mut product: Product) -> Product {
        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(price) = self.price_per_sqft {
            product.price_per_sqft = price;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        if self.description.is_some() {
            product.description = self.description;
        }
        if self.image_url.is_some() {
            product.image_url = self.image_url;
        }
        product
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("product name must not be empty"));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(Error::validation("price_per_sqft must be a positive number"));
    }
    Ok(())
}
