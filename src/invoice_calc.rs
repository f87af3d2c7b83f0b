//! Invoice pricing and recording.
//!
//! An invoice is priced once, from the product's current price per square
//! foot, and stored together with a copy of that price and the product name.
//! Later edits to the product never reach invoices that already exist.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Invoice, NewInvoice, Product};

/// Read-only product lookup used when pricing.
#[allow(async_fn_in_trait)]
pub trait ProductCatalog {
    async fn get_product(&self, id: i64) -> Result<Option<Product>>;
}

/// Append-only invoice storage.
#[allow(async_fn_in_trait)]
pub trait InvoiceStore {
    /// Insert a row and return its newly assigned id.
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<i64>;

    async fn get_invoice(&self, id: i64) -> Result<Option<Invoice>>;

    /// All invoices, newest first.
    async fn list_invoices(&self) -> Result<Vec<Invoice>>;
}

/// Rectangular dimensions in feet plus a piece count.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub height: f64,
    pub width: f64,
    pub quantity: i64,
}

impl Dimensions {
    /// Zero is rejected along with negatives and non-finite values.
    pub fn validate(&self) -> Result<()> {
        if !self.height.is_finite() || self.height <= 0.0 {
            return Err(Error::validation("height must be a positive number of feet"));
        }
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(Error::validation("width must be a positive number of feet"));
        }
        if self.quantity <= 0 {
            return Err(Error::validation("quantity must be a positive integer"));
        }
        Ok(())
    }

    pub fn area_sqft(&self) -> f64 {
        self.height * self.width
    }

    /// `area * rate * quantity`. Fails when the product overflows to infinity.
    pub fn price_at(&self, rate_per_sqft: f64) -> Result<f64> {
        let price = self.area_sqft() * rate_per_sqft * self.quantity as f64;
        if !price.is_finite() {
            return Err(Error::validation("dimensions are too large to price"));
        }
        Ok(price)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct InvoiceRequest {
    pub product_id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    #[serde(flatten)]
    pub dimensions: Dimensions,
}

impl InvoiceRequest {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("customer_name", &self.customer_name),
            ("customer_phone", &self.customer_phone),
            ("customer_address", &self.customer_address),
        ] {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("{field} must not be empty")));
            }
        }
        self.dimensions.validate()
    }
}

/// Build the row for `request`, snapshotting the product as it is now.
pub fn price_invoice(request: &InvoiceRequest, product: &Product) -> Result<NewInvoice> {
    let dims = request.dimensions;
    Ok(NewInvoice {
        customer_name: request.customer_name.trim().to_string(),
        customer_phone: request.customer_phone.trim().to_string(),
        customer_address: request.customer_address.trim().to_string(),
        product_id: product.id,
        product_name: product.name.clone(),
        height_ft: dims.height,
        width_ft: dims.width,
        quantity: dims.quantity,
        sqft_price_at_booking: product.price_per_sqft,
        total_amount: dims.price_at(product.price_per_sqft)?,
        created_at: Utc::now(),
    })
}

/// Validate, price and persist one invoice, returning its id.
///
/// Nothing is written unless every step succeeds.
pub async fn create_invoice<C, S>(catalog: &C, store: &S, request: &InvoiceRequest) -> Result<i64>
where
    C: ProductCatalog,
    S: InvoiceStore,
{
    let product = catalog
        .get_product(request.product_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("product {}", request.product_id)))?;

    request.validate()?;

    let invoice = price_invoice(request, &product)?;
    let id = store.insert_invoice(&invoice).await?;

    tracing::info!(
        invoice_id = id,
        product_id = product.id,
        total = invoice.total_amount,
        "invoice created"
    );

    Ok(id)
}

/// Public estimate for a product: material plus labor.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Quote {
    pub product_id: i64,
    pub area_sqft: f64,
    pub quantity: i64,
    pub price_per_sqft: f64,
    pub labor_rate_per_sqft: f64,
    pub material_cost: f64,
    pub labor_cost: f64,
    pub total: f64,
}

pub fn quote(product: &Product, labor_rate_per_sqft: f64, dims: Dimensions) -> Result<Quote> {
    dims.validate()?;

    let material_cost = dims.price_at(product.price_per_sqft)?;
    let labor_cost = dims.price_at(labor_rate_per_sqft)?;
    let total = material_cost + labor_cost;
    if !total.is_finite() {
        return Err(Error::validation("dimensions are too large to price"));
    }

    Ok(Quote {
        product_id: product.id,
        area_sqft: dims.area_sqft(),
        quantity: dims.quantity,
        price_per_sqft: product.price_per_sqft,
        labor_rate_per_sqft,
        material_cost,
        labor_cost,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        products: HashMap<i64, Product>,
        invoices: Mutex<Vec<Invoice>>,
        fail_inserts: bool,
    }

    impl ProductCatalog for MemoryStore {
        async fn get_product(&self, id: i64) -> Result<Option<Product>> {
            Ok(self.products.get(&id).cloned())
        }
    }

    impl InvoiceStore for MemoryStore {
        async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<i64> {
            if self.fail_inserts {
                return Err(Error::Storage(sqlx::Error::PoolClosed));
            }
            let mut invoices = self.invoices.lock().unwrap();
            let id = invoices.len() as i64 + 1;
            invoices.push(Invoice {
                id,
                customer_name: invoice.customer_name.clone(),
                customer_phone: invoice.customer_phone.clone(),
                customer_address: invoice.customer_address.clone(),
                product_id: invoice.product_id,
                product_name: invoice.product_name.clone(),
                height_ft: invoice.height_ft,
                width_ft: invoice.width_ft,
                quantity: invoice.quantity,
                sqft_price_at_booking: invoice.sqft_price_at_booking,
                total_amount: invoice.total_amount,
                created_at: invoice.created_at,
            });
            Ok(id)
        }

        async fn get_invoice(&self, id: i64) -> Result<Option<Invoice>> {
            let invoices = self.invoices.lock().unwrap();
            Ok(invoices.iter().find(|i| i.id == id).cloned())
        }

        async fn list_invoices(&self) -> Result<Vec<Invoice>> {
            let mut invoices = self.invoices.lock().unwrap().clone();
            invoices.reverse();
            Ok(invoices)
        }
    }

    fn product(id: i64, price: f64) -> Product {
        Product {
            id,
            name: "Aluminium partition".to_string(),
            description: None,
            image_url: None,
            price_per_sqft: price,
            category_id: 1,
        }
    }

    fn store_with(product: Product) -> MemoryStore {
        let mut store = MemoryStore::default();
        store.products.insert(product.id, product);
        store
    }

    fn request(product_id: i64, height: f64, width: f64, quantity: i64) -> InvoiceRequest {
        InvoiceRequest {
            product_id,
            customer_name: "Ayesha Khan".to_string(),
            customer_phone: "0300-1234567".to_string(),
            customer_address: "12 Mall Road".to_string(),
            dimensions: Dimensions {
                height,
                width,
                quantity,
            },
        }
    }

    #[tokio::test]
    async fn total_is_area_times_price_times_quantity() {
        let store = store_with(product(1, 50.0));

        let id = create_invoice(&store, &store, &request(1, 10.0, 5.0, 2))
            .await
            .unwrap();

        let invoice = store.get_invoice(id).await.unwrap().unwrap();
        assert_eq!(invoice.total_amount, 5000.0);
        assert_eq!(invoice.sqft_price_at_booking, 50.0);
        assert_eq!(invoice.product_name, "Aluminium partition");
    }

    #[tokio::test]
    async fn fractional_dimensions_price_within_tolerance() {
        let store = store_with(product(3, 37.25));

        let id = create_invoice(&store, &store, &request(3, 6.5, 3.75, 4))
            .await
            .unwrap();

        let invoice = store.get_invoice(id).await.unwrap().unwrap();
        let expected = 6.5 * 3.75 * 37.25 * 4.0;
        assert!((invoice.total_amount - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_product_writes_nothing() {
        let store = store_with(product(1, 50.0));

        let err = create_invoice(&store, &store, &request(9999, 10.0, 5.0, 2))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert!(store.list_invoices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_dimensions_and_quantity_are_rejected() {
        let store = store_with(product(1, 50.0));

        for req in [
            request(1, 0.0, 5.0, 2),
            request(1, 10.0, 0.0, 2),
            request(1, 10.0, 5.0, 0),
            request(1, -1.0, 5.0, 2),
            request(1, f64::INFINITY, 5.0, 2),
            request(1, f64::NAN, 5.0, 2),
        ] {
            let err = create_invoice(&store, &store, &req).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{req:?}");
        }
        assert!(store.list_invoices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn overflowing_total_is_rejected_without_a_write() {
        let store = store_with(product(1, 50.0));

        let err = create_invoice(&store, &store, &request(1, 1e200, 1e200, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(store.list_invoices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_product_wins_over_bad_dimensions() {
        let store = store_with(product(1, 50.0));

        let err = create_invoice(&store, &store, &request(9999, 0.0, 5.0, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert!(store.list_invoices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_customer_fields_are_rejected() {
        let store = store_with(product(1, 50.0));
        let mut req = request(1, 10.0, 5.0, 2);
        req.customer_phone = "  ".to_string();

        let err = create_invoice(&store, &store, &req).await.unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("customer_phone")));
    }

    #[tokio::test]
    async fn storage_failure_surfaces_as_storage_error() {
        let mut store = store_with(product(1, 50.0));
        store.fail_inserts = true;

        let err = create_invoice(&store, &store, &request(1, 10.0, 5.0, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn pricing_does_not_touch_the_product() {
        let before = product(1, 50.0);
        let store = store_with(before.clone());

        create_invoice(&store, &store, &request(1, 2.0, 2.0, 1))
            .await
            .unwrap();

        assert_eq!(store.get_product(1).await.unwrap(), Some(before));
    }

    #[test]
    fn quote_splits_material_and_labor() {
        let dims = Dimensions {
            height: 4.0,
            width: 3.0,
            quantity: 2,
        };
        let q = quote(&product(1, 100.0), 50.0, dims).unwrap();

        assert_eq!(q.area_sqft, 12.0);
        assert_eq!(q.material_cost, 2400.0);
        assert_eq!(q.labor_cost, 1200.0);
        assert_eq!(q.total, 3600.0);
    }

    #[test]
    fn quote_rejects_overflowing_area() {
        let dims = Dimensions {
            height: 1e200,
            width: 1e200,
            quantity: 1,
        };
        let err = quote(&product(1, 100.0), 50.0, dims).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn quote_rejects_zero_quantity() {
        let dims = Dimensions {
            height: 4.0,
            width: 3.0,
            quantity: 0,
        };
        assert!(quote(&product(1, 100.0), 50.0, dims).is_err());
    }
}
