//! Order totals.

use serde::{Deserialize, Serialize};

use crate::order::LineItem;
use crate::value_objects::Money;

/// Discount requested at checkout.
///
/// Either field may be set. When both are, the larger resulting amount is
/// taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscountInput {
    pub code: Option<String>,
    pub percent: u32,
    pub amount: Money,
}

/// Computed order totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Money,
    pub shipping_price: Money,
    pub tax: Money,
    pub discount_amount: Money,
    pub total_price: Money,
}

/// Computes the totals of an order.
///
/// ```text
/// subtotal        = sum(price * quantity)
/// discount_amount = max(discount.amount, floor(subtotal * percent / 100))
/// total_price     = max(0, subtotal + shipping + tax - discount_amount)
/// ```
pub fn calculate_totals(
    items: &[LineItem],
    discount: &DiscountInput,
    shipping_price: Money,
    tax: Money,
) -> Totals {
    let subtotal: Money = items.iter().map(LineItem::line_total).sum();

    let from_percent = if discount.percent > 0 {
        subtotal.percent(discount.percent)
    } else {
        Money::zero()
    };
    let discount_amount = discount.amount.max(from_percent);

    let total_price = (subtotal + shipping_price + tax - discount_amount).non_negative();

    Totals {
        subtotal,
        shipping_price,
        tax,
        discount_amount,
        total_price,
    }
}
