//! Storefront and invoicing service for an aluminium-products business.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod invoice_calc;
pub mod logging;
pub mod models;
pub mod web;

pub use error::{Error, Result};
