//! Checkout requests as submitted by the storefront.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::order::{GuestInfo, ShippingAddress};
use crate::pricing::DiscountInput;
use crate::value_objects::{AccountId, Money};

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Internal or external product id.
    pub product_id: String,

    pub variant_id: String,

    /// Requested units. Missing or non-positive values count as one.
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, variant_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: variant_id.into(),
            quantity: Some(quantity),
        }
    }

    /// Returns `max(1, quantity)`, capped at `u32::MAX`.
    pub fn normalized_quantity(&self) -> u32 {
        let quantity = self.quantity.unwrap_or(1).max(1);
        u32::try_from(quantity).unwrap_or(u32::MAX)
    }
}

/// An order-creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutRequest {
    pub account_id: Option<AccountId>,

    /// Contact address of the account holder. Ignored for guest checkout.
    pub email: Option<String>,

    pub guest_info: Option<GuestInfo>,
    pub items: Vec<CartLine>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub shipping_price: Money,
    pub tax: Money,
    pub discount: DiscountInput,
}

impl CheckoutRequest {
    /// Checks required fields in a fixed order and reports the first one
    /// missing.
    pub fn validate(&self) -> Result<(), DomainError> {
        let address = &self.shipping_address;
        let required: [(&'static str, &str); 5] = [
            ("paymentMethod", self.payment_method.as_str()),
            ("shippingAddress.recipientName", address.recipient_name.as_str()),
            ("shippingAddress.phone", address.phone.as_str()),
            ("shippingAddress.street", address.street.as_str()),
            ("shippingAddress.city", address.city.as_str()),
        ];
        if let Some((field, _)) = required
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
        {
            return Err(DomainError::missing_field(field));
        }

        if self.items.is_empty() {
            return Err(DomainError::invalid(
                "items",
                "Order must contain at least one item",
            ));
        }

        for (field, amount) in [
            ("shippingPrice", self.shipping_price),
            ("tax", self.tax),
            ("discount.amount", self.discount.amount),
        ] {
            if amount.is_negative() {
                return Err(DomainError::invalid(
                    field,
                    format!("{field} must not be negative"),
                ));
            }
        }
        if self.discount.percent > 100 {
            return Err(DomainError::invalid(
                "discount.percent",
                "discount.percent must be between 0 and 100",
            ));
        }

        Ok(())
    }

    /// Returns the account email for account checkouts.
    pub fn account_email(&self) -> Option<String> {
        if self.guest_info.is_some() {
            return None;
        }
        self.email
            .as_ref()
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
    }
}
