//! Order confirmation messages.
//!
//! Sending is best effort: the workflow logs and counts failures but never
//! lets them fail an order that is already committed.

use std::sync::{Arc, RwLock};

use askama::Template;
use async_trait::async_trait;
use domain::Order;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An outgoing email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Errors raised while building or delivering a message.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The transport refused or lost the message.
    #[error("notification failed: {0}")]
    Delivery(String),

    /// The message body failed to render.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// Trait for delivering messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn send(&self, message: Message) -> Result<(), NotifyError> {
        (**self).send(message).await
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: Message) -> Result<(), NotifyError> {
        tracing::info!(to = %message.to, subject = %message.subject, "order confirmation");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<Message>,
    fail_on_send: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail every send.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the messages sent so far.
    pub fn sent(&self) -> Vec<Message> {
        self.state.read().unwrap().sent.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, message: Message) -> Result<(), NotifyError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_send {
            return Err(NotifyError::Delivery(
                "SMTP connection refused".to_string(),
            ));
        }
        state.sent.push(message);
        Ok(())
    }
}

/// HTML body of the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    name: &'a str,
    order: &'a Order,
}

/// Builds the confirmation for a placed order, or `None` if the order has no
/// contact email.
///
/// # Errors
///
/// Returns [`NotifyError::Template`] if the body fails to render.
pub fn confirmation_message(order: &Order, from: &str) -> Result<Option<Message>, NotifyError> {
    let Some(to) = order.contact_email() else {
        return Ok(None);
    };

    let html = OrderConfirmationHtml {
        name: order.contact_name(),
        order,
    }
    .render()?;

    Ok(Some(Message {
        from: from.to_string(),
        to: to.to_string(),
        subject: format!("Order confirmation {}", order.code),
        html,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use domain::{
        DiscountInput, GuestInfo, LineItem, Money, NewOrder, ShippingAddress, calculate_totals,
    };

    use super::*;

    fn order(guest: Option<GuestInfo>, account_email: Option<&str>) -> Order {
        let items = vec![LineItem {
            product_ref: Default::default(),
            product_id: "P1".to_string(),
            variant_id: "V1".to_string(),
            name: "Tee <Small>".to_string(),
            price: Money::from_minor(500_000),
            quantity: 2,
        }];
        let discount = DiscountInput::default();
        let totals = calculate_totals(&items, &discount, Money::from_minor(30_000), Money::zero());
        Order::place(
            NewOrder {
                code: "OD-20240315-7KQ2".to_string(),
                account_id: None,
                account_email: account_email.map(str::to_string),
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
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_confirmation_for_guest() {
        let guest = GuestInfo {
            name: "Guest".to_string(),
            email: "guest@example.com".to_string(),
        };
        let message = confirmation_message(&order(Some(guest), None), "shop@example.com")
            .unwrap()
            .unwrap();

        assert_eq!(message.to, "guest@example.com");
        assert_eq!(message.from, "shop@example.com");
        assert_eq!(message.subject, "Order confirmation OD-20240315-7KQ2");
        assert!(message.html.contains("1030000"));
        assert!(message.html.contains("Tee &lt;Small&gt;"));
        assert!(message.html.contains("Hi Guest"));
    }

    #[test]
    fn test_confirmation_for_account() {
        let message =
            confirmation_message(&order(None, Some("buyer@example.com")), "shop@example.com")
                .unwrap()
                .unwrap();
        assert_eq!(message.to, "buyer@example.com");
        assert!(message.html.contains("Hi Lan"));
    }

    #[test]
    fn test_customer_text_is_escaped() {
        let guest = GuestInfo {
            name: "<script>alert(\"hi\")</script>".to_string(),
            email: "guest@example.com".to_string(),
        };
        let message = confirmation_message(&order(Some(guest), None), "shop@example.com")
            .unwrap()
            .unwrap();

        assert!(!message.html.contains("<script>"));
        assert!(message.html.contains("&lt;script&gt;"));
        assert!(message.html.contains("OD-20240315-7KQ2"));
    }

    #[test]
    fn test_no_email_no_message() {
        assert!(
            confirmation_message(&order(None, None), "shop@example.com")
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_in_memory_notifier() {
        let notifier = InMemoryNotifier::new();
        let message = confirmation_message(&order(None, Some("a@b.c")), "shop@example.com")
            .unwrap()
            .unwrap();

        notifier.send(message.clone()).await.unwrap();
        assert_eq!(notifier.sent(), vec![message.clone()]);

        notifier.set_fail_on_send(true);
        assert!(notifier.send(message).await.is_err());
        assert_eq!(notifier.sent().len(), 1);
    }
}
