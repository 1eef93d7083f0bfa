//! Orders: documents, status lifecycle, code generation and storage.

pub mod code;
mod model;
mod repository;
mod service;
mod status;

pub use code::{OrderCodeGenerator, RandomSuffix, SuffixSource};
pub use model::{
    AppliedDiscount, GuestInfo, LineItem, NewOrder, Order, ShippingAddress, StatusChange,
};
pub use repository::{ORDERS, OrderFilter, OrderRepository};
pub use service::{OrderService, UpdateOrderStatus};
pub use status::OrderStatus;
