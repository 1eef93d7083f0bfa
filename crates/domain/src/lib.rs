//! Domain layer for the storefront.
//!
//! This crate provides:
//! - Catalog products with embedded variants, and their repository
//! - Orders with their status lifecycle, code generator and repository
//! - Checkout requests, cart resolution against stock, and order pricing
//! - Voucher validation

pub mod catalog;
pub mod checkout;
pub mod error;
pub mod order;
pub mod pricing;
pub mod stock;
pub mod value_objects;
pub mod voucher;

pub use catalog::{CatalogRepository, PRODUCTS, Product, ProductStatus, Variant};
pub use checkout::{CartLine, CheckoutRequest};
pub use error::DomainError;
pub use order::{
    GuestInfo, LineItem, NewOrder, ORDERS, Order, OrderCodeGenerator, OrderFilter,
    OrderRepository, OrderService, OrderStatus, ShippingAddress, UpdateOrderStatus,
};
pub use pricing::{DiscountInput, Totals, calculate_totals};
pub use stock::{StockResolution, resolve_lines, unique_refs};
pub use value_objects::{AccountId, Money};
pub use voucher::{VOUCHERS, Voucher, VoucherRejection, VoucherRepository};
