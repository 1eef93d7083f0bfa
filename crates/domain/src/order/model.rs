//! Order documents.

use chrono::{DateTime, Utc};
use common::DocumentId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::pricing::{DiscountInput, Totals};
use crate::value_objects::{AccountId, Money};

use super::OrderStatus;

/// Where the order ships to. Every field is required at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
}

/// Contact details for checkout without an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuestInfo {
    pub name: String,
    pub email: String,
}

/// A line of an order, frozen when the order is placed.
///
/// Name and price are copies taken from the catalog at that moment; later
/// catalog edits do not affect them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Internal id of the product.
    pub product_ref: DocumentId,

    /// External id of the product.
    pub product_id: String,

    pub variant_id: String,

    /// `"<product> - <variant>"`.
    pub name: String,

    /// Unit price at order time.
    pub price: Money,

    pub quantity: u32,
}

impl LineItem {
    /// Returns `price * quantity`.
    pub fn line_total(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// Discount as recorded on the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    pub code: Option<String>,
    pub percent: u32,

    /// The amount actually taken off.
    pub amount: Money,
}

/// One entry of the status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: DocumentId,

    /// Human-readable order code, unique across all orders.
    pub code: String,

    #[serde(default)]
    pub account_id: Option<AccountId>,

    /// Email of the account holder, when the order was placed from an account.
    #[serde(default)]
    pub account_email: Option<String>,

    #[serde(default)]
    pub guest_info: Option<GuestInfo>,

    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,

    pub subtotal: Money,
    pub shipping_price: Money,
    pub tax: Money,
    pub discount: AppliedDiscount,
    pub total_price: Money,

    pub status: OrderStatus,
    pub status_history: Vec<StatusChange>,
    pub paid: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to build a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub code: String,
    pub account_id: Option<AccountId>,
    pub account_email: Option<String>,
    pub guest_info: Option<GuestInfo>,
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub discount: DiscountInput,
    pub totals: Totals,
}

impl Order {
    /// Creates a pending order, recording the initial status in the history.
    pub fn place(new: NewOrder, now: DateTime<Utc>) -> Self {
        Self {
            id: DocumentId::new(),
            code: new.code,
            account_id: new.account_id,
            account_email: new.account_email,
            guest_info: new.guest_info,
            items: new.items,
            shipping_address: new.shipping_address,
            payment_method: new.payment_method,
            subtotal: new.totals.subtotal,
            shipping_price: new.totals.shipping_price,
            tax: new.totals.tax,
            discount: AppliedDiscount {
                code: new.discount.code,
                percent: new.discount.percent,
                amount: new.totals.discount_amount,
            },
            total_price: new.totals.total_price,
            status: OrderStatus::Pending,
            status_history: vec![StatusChange {
                status: OrderStatus::Pending,
                at: now,
                note: None,
            }],
            paid: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the address confirmation mail goes to: the guest email if the
    /// order was placed as a guest, otherwise the account email.
    pub fn contact_email(&self) -> Option<&str> {
        self.guest_info
            .as_ref()
            .map(|g| g.email.as_str())
            .or(self.account_email.as_deref())
            .filter(|email| !email.trim().is_empty())
    }

    /// Returns the name to greet in notifications.
    pub fn contact_name(&self) -> &str {
        match &self.guest_info {
            Some(guest) if !guest.name.trim().is_empty() => &guest.name,
            _ => &self.shipping_address.recipient_name,
        }
    }

    /// Moves the order to a new status and appends it to the history.
    pub fn transition(
        &mut self,
        next: OrderStatus,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        self.status_history.push(StatusChange {
            status: next,
            at: now,
            note,
        });
        if next == OrderStatus::Delivered {
            self.paid = true;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Sets the paid flag. A delivered order stays paid.
    pub fn set_paid(&mut self, paid: bool, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !paid && self.status == OrderStatus::Delivered {
            return Err(DomainError::invalid(
                "paid",
                "A delivered order cannot be marked as unpaid",
            ));
        }
        if self.paid != paid {
            self.paid = paid;
            self.updated_at = now;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::calculate_totals;

    fn line(price: i64, quantity: u32) -> LineItem {
        LineItem {
            product_ref: DocumentId::new(),
            product_id: "P1".to_string(),
            variant_id: "V1".to_string(),
            name: "Tee - Small".to_string(),
            price: Money::from_minor(price),
            quantity,
        }
    }

    fn new_order(guest: Option<GuestInfo>) -> NewOrder {
        let items = vec![line(500_000, 2)];
        let discount = DiscountInput::default();
        let totals = calculate_totals(&items, &discount, Money::from_minor(30_000), Money::zero());
        NewOrder {
            code: "OD-20240101-ABCD".to_string(),
            account_id: None,
            account_email: Some("account@example.com".to_string()),
            guest_info: guest,
            items,
            shipping_address: ShippingAddress {
                recipient_name: "Lan".to_string(),
                phone: "0900000000".to_string(),
                street: "1 Main St".to_string(),
                city: "Hanoi".to_string(),
            },
            payment_method: "COD".to_string(),
            discount,
            totals,
        }
    }

    #[test]
    fn place_starts_pending_with_history() {
        let now = Utc::now();
        let order = Order::place(new_order(None), now);

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.status_history.len(), 1);
        assert_eq!(order.status_history[0].at, now);
        assert!(!order.paid);
        assert_eq!(order.subtotal.minor(), 1_000_000);
        assert_eq!(order.total_price.minor(), 1_030_000);
        assert_eq!(order.items[0].quantity, 2);
    }

    #[test]
    fn contact_email_prefers_guest() {
        let guest = GuestInfo {
            name: "Guest".to_string(),
            email: "guest@example.com".to_string(),
        };
        let order = Order::place(new_order(Some(guest)), Utc::now());
        assert_eq!(order.contact_email(), Some("guest@example.com"));
        assert_eq!(order.contact_name(), "Guest");

        let order = Order::place(new_order(None), Utc::now());
        assert_eq!(order.contact_email(), Some("account@example.com"));
        assert_eq!(order.contact_name(), "Lan");
    }

    #[test]
    fn transition_appends_history() {
        let mut order = Order::place(new_order(None), Utc::now());

        order
            .transition(OrderStatus::Confirmed, Some("called customer".into()), Utc::now())
            .unwrap();
        order.transition(OrderStatus::Shipping, None, Utc::now()).unwrap();
        order.transition(OrderStatus::Delivered, None, Utc::now()).unwrap();

        let statuses: Vec<_> = order.status_history.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Shipping,
                OrderStatus::Delivered
            ]
        );
        assert!(order.paid);
    }

    #[test]
    fn invalid_transition_is_rejected_without_side_effects() {
        let mut order = Order::place(new_order(None), Utc::now());

        let err = order
            .transition(OrderStatus::Delivered, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStatusTransition { .. }));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.status_history.len(), 1);
    }

    #[test]
    fn serializes_camel_case() {
        let order = Order::place(new_order(None), Utc::now());
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["totalPrice"], 1_030_000);
        assert_eq!(json["shippingAddress"]["recipientName"], "Lan");
        assert_eq!(json["statusHistory"][0]["status"], "Pending");
    }
}
