mod admin;
mod category;
mod product;
mod labor_cost;
mod invoice;

pub use admin::{Admin, AdminSession};
pub use category::Category;
pub use product::{NewProduct, Product, ProductChanges};
pub use labor_cost::LaborCost;
pub use invoice::{Invoice, NewInvoice};
