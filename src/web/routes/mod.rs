pub mod admin;
pub mod invoices;
pub mod public;
