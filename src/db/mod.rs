use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::invoice_calc::{InvoiceStore, ProductCatalog};
use crate::models::{
    Admin, AdminSession, Category, Invoice, LaborCost, NewInvoice, NewProduct, Product,
    ProductChanges,
};

/// Database connection pool
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        Self::connect(config.database_url(), config.max_connections).await
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.foreign_keys(true);

        // Every connection to `:memory:` opens a fresh database, so pin a single one.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    /// Fresh migrated in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let db = Self::connect("sqlite::memory:", 1).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(self.get_pool()).await?;
        Ok(())
    }

    // Category operations
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name ASC, id ASC")
                .fetch_all(self.get_pool())
                .await?;

        Ok(categories)
    }

    pub async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?;

        Ok(category)
    }

    pub async fn create_category(&self, name: &str) -> Result<Category> {
        let name = category_name(name)?;
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES (?) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(self.get_pool())
        .await?;

        Ok(category)
    }

    pub async fn rename_category(&self, id: i64, name: &str) -> Result<Category> {
        let name = category_name(name)?;
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = ? WHERE id = ? RETURNING id, name",
        )
        .bind(name)
        .bind(id)
        .fetch_optional(self.get_pool())
        .await?
        .ok_or_else(|| Error::not_found(format!("category {id}")))
    }

    // Product operations
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, image_url, price_per_sqft, category_id
            FROM products
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.get_pool())
        .await?;

        Ok(products)
    }

    /// Products of one category. Callers check the category exists.
    pub async fn list_products_in_category(&self, category_id: i64) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, image_url, price_per_sqft, category_id
            FROM products
            WHERE category_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(category_id)
        .fetch_all(self.get_pool())
        .await?;

        Ok(products)
    }

    pub async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, image_url, price_per_sqft, category_id
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.get_pool())
        .await?;

        Ok(product)
    }

    pub async fn create_product(&self, product: &NewProduct) -> Result<Product> {
        product.validate()?;
        if self.get_category(product.category_id).await?.is_none() {
            return Err(Error::not_found(format!("category {}", product.category_id)));
        }

        let created = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, image_url, price_per_sqft, category_id)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, description, image_url, price_per_sqft, category_id
            "#,
        )
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.price_per_sqft)
        .bind(product.category_id)
        .fetch_one(self.get_pool())
        .await?;

        Ok(created)
    }

    pub async fn update_product(&self, id: i64, changes: ProductChanges) -> Result<Product> {
        changes.validate()?;

        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, image_url, price_per_sqft, category_id
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found(format!("product {id}")))?;

        if let Some(category_id) = changes.category_id {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?")
                .bind(category_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(Error::not_found(format!("category {category_id}")));
            }
        }

        let updated = changes.apply(current);
        sqlx::query(
            r#"
            UPDATE products
            SET name = ?, description = ?, image_url = ?, price_per_sqft = ?, category_id = ?
            WHERE id = ?
            "#,
        )
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(&updated.image_url)
        .bind(updated.price_per_sqft)
        .bind(updated.category_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    // Labor cost operations
    pub async fn labor_cost(&self) -> Result<Option<LaborCost>> {
        let labor = sqlx::query_as::<_, LaborCost>(
            "SELECT id, rate_per_sqft FROM labor_cost ORDER BY id ASC LIMIT 1",
        )
        .fetch_optional(self.get_pool())
        .await?;

        Ok(labor)
    }

    /// Current labor rate, `0.0` when none has been configured.
    pub async fn labor_rate(&self) -> Result<f64> {
        Ok(self.labor_cost().await?.map_or(0.0, |l| l.rate_per_sqft))
    }

    pub async fn set_labor_rate(&self, rate: f64) -> Result<LaborCost> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(Error::validation("labor rate must be a non-negative number"));
        }

        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM labor_cost ORDER BY id ASC LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?;

        let labor = match existing {
            Some(id) => {
                sqlx::query_as::<_, LaborCost>(
                    "UPDATE labor_cost SET rate_per_sqft = ? WHERE id = ? RETURNING id, rate_per_sqft",
                )
                .bind(rate)
                .bind(id)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, LaborCost>(
                    "INSERT INTO labor_cost (rate_per_sqft) VALUES (?) RETURNING id, rate_per_sqft",
                )
                .bind(rate)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;

        Ok(labor)
    }

    // Invoice operations
    pub async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO invoices (
                customer_name, customer_phone, customer_address,
                product_id, product_name, height_ft, width_ft, quantity,
                sqft_price_at_booking, total_amount, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&invoice.customer_name)
        .bind(&invoice.customer_phone)
        .bind(&invoice.customer_address)
        .bind(invoice.product_id)
        .bind(&invoice.product_name)
        .bind(invoice.height_ft)
        .bind(invoice.width_ft)
        .bind(invoice.quantity)
        .bind(invoice.sqft_price_at_booking)
        .bind(invoice.total_amount)
        .bind(invoice.created_at)
        .fetch_one(self.get_pool())
        .await?;

        Ok(id)
    }

    pub async fn get_invoice(&self, id: i64) -> Result<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = ?")
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?;

        Ok(invoice)
    }

    /// All invoices, newest first.
    pub async fn list_invoices(&self) -> Result<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.get_pool())
        .await?;

        Ok(invoices)
    }

    pub async fn count_invoices(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices")
            .fetch_one(self.get_pool())
            .await?;

        Ok(count)
    }

    // Admin operations
    pub async fn find_admin_by_username(&self, username: &str) -> Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT id, username, password_hash FROM admins WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.get_pool())
        .await?;

        Ok(admin)
    }

    pub async fn get_admin(&self, id: i64) -> Result<Option<Admin>> {
        let admin =
            sqlx::query_as::<_, Admin>("SELECT id, username, password_hash FROM admins WHERE id = ?")
                .bind(id)
                .fetch_optional(self.get_pool())
                .await?;

        Ok(admin)
    }

    /// Insert an admin and, when no labor rate exists yet, the default one.
    pub async fn create_admin(
        &self,
        username: &str,
        password_hash: &str,
        default_labor_rate: f64,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO admins (username, password_hash) VALUES (?, ?) RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let labor_rows = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM labor_cost")
            .fetch_one(&mut *tx)
            .await?;
        if labor_rows == 0 {
            sqlx::query("INSERT INTO labor_cost (rate_per_sqft) VALUES (?)")
                .bind(default_labor_rate)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(id)
    }

    // Session operations
    pub async fn create_session(&self, session: &AdminSession) -> Result<()> {
        sqlx::query(
            "INSERT INTO admin_sessions (token, admin_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&session.token)
        .bind(session.admin_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(self.get_pool())
        .await?;

        Ok(())
    }

    pub async fn get_session(&self, token: &str) -> Result<Option<AdminSession>> {
        let session = sqlx::query_as::<_, AdminSession>(
            "SELECT token, admin_id, created_at, expires_at FROM admin_sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(self.get_pool())
        .await?;

        Ok(session)
    }

    pub async fn delete_session(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE token = ?")
            .bind(token)
            .execute(self.get_pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(self.get_pool())
            .await?;

        Ok(result.rows_affected())
    }
}

impl ProductCatalog for Database {
    async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        Database::get_product(self, id).await
    }
}

impl InvoiceStore for Database {
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<i64> {
        Database::insert_invoice(self, invoice).await
    }

    async fn get_invoice(&self, id: i64) -> Result<Option<Invoice>> {
        Database::get_invoice(self, id).await
    }

    async fn list_invoices(&self) -> Result<Vec<Invoice>> {
        Database::list_invoices(self).await
    }
}

fn category_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("category name must not be empty"));
    }
    Ok(name)
}

/// Initialize the database connection pool and bring the schema up to date
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;
    db.migrate().await?;
    tracing::info!(url = %config.database_url(), "database ready");

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (Database, Category) {
        let db = Database::in_memory().await.unwrap();
        let category = db.create_category("Windows").await.unwrap();
        (db, category)
    }

    fn new_product(category_id: i64, price: f64) -> NewProduct {
        NewProduct {
            name: "Casement window".to_string(),
            price_per_sqft: price,
            category_id,
            description: Some("Powder coated".to_string()),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn category_name_is_trimmed_and_required() {
        let db = Database::in_memory().await.unwrap();
        let created = db.create_category("  Doors ").await.unwrap();
        assert_eq!(created.name, "Doors");

        let err = db.create_category("   ").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(db.list_categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rename_missing_category_is_not_found() {
        let db = Database::in_memory().await.unwrap();
        let err = db.rename_category(42, "Railings").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn products_are_listed_per_category() {
        let (db, windows) = seeded().await;
        let doors = db.create_category("Doors").await.unwrap();

        db.create_product(&new_product(windows.id, 300.0)).await.unwrap();
        db.create_product(&new_product(doors.id, 550.0)).await.unwrap();

        let in_windows = db.list_products_in_category(windows.id).await.unwrap();
        assert_eq!(in_windows.len(), 1);
        assert_eq!(in_windows[0].price_per_sqft, 300.0);
        assert_eq!(db.list_products().await.unwrap().len(), 2);

        assert!(db.list_products_in_category(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn product_requires_existing_category() {
        let db = Database::in_memory().await.unwrap();
        let err = db.create_product(&new_product(7, 100.0)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn update_product_persists_changes() {
        let (db, category) = seeded().await;
        let product = db.create_product(&new_product(category.id, 300.0)).await.unwrap();

        let changes = ProductChanges {
            price_per_sqft: Some(320.0),
            ..Default::default()
        };
        db.update_product(product.id, changes).await.unwrap();

        let stored = db.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.price_per_sqft, 320.0);
        assert_eq!(stored.description.as_deref(), Some("Powder coated"));
    }

    #[tokio::test]
    async fn labor_rate_defaults_to_zero_then_upserts() {
        let db = Database::in_memory().await.unwrap();
        assert_eq!(db.labor_rate().await.unwrap(), 0.0);

        let first = db.set_labor_rate(40.0).await.unwrap();
        let second = db.set_labor_rate(55.5).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(db.labor_rate().await.unwrap(), 55.5);

        assert!(db.set_labor_rate(-1.0).await.is_err());
    }

    #[tokio::test]
    async fn create_admin_seeds_labor_rate_once() {
        let db = Database::in_memory().await.unwrap();
        db.set_labor_rate(12.0).await.unwrap();

        db.create_admin("admin", "hash", 50.0).await.unwrap();
        assert_eq!(db.labor_rate().await.unwrap(), 12.0);

        let admin = db.find_admin_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.password_hash, "hash");
    }

    #[tokio::test]
    async fn expired_sessions_are_purged() {
        let db = Database::in_memory().await.unwrap();
        let admin_id = db.create_admin("admin", "hash", 50.0).await.unwrap();
        let now = Utc::now();

        for (token, ttl) in [("old", -5), ("fresh", 5)] {
            db.create_session(&AdminSession {
                token: token.to_string(),
                admin_id,
                created_at: now,
                expires_at: now + chrono::Duration::minutes(ttl),
            })
            .await
            .unwrap();
        }

        assert_eq!(db.delete_expired_sessions(now).await.unwrap(), 1);
        assert!(db.get_session("old").await.unwrap().is_none());
        assert!(db.get_session("fresh").await.unwrap().is_some());

        // Nothing left to purge on a second pass.
        assert_eq!(db.delete_expired_sessions(now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn session_expiring_exactly_now_is_purged() {
        let db = Database::in_memory().await.unwrap();
        let admin_id = db.create_admin("admin", "hash", 50.0).await.unwrap();
        let now = Utc::now();

        db.create_session(&AdminSession {
            token: "edge".to_string(),
            admin_id,
            created_at: now - chrono::Duration::minutes(5),
            expires_at: now,
        })
        .await
        .unwrap();

        assert_eq!(db.delete_expired_sessions(now).await.unwrap(), 1);
        assert!(db.get_session("edge").await.unwrap().is_none());
    }
}
