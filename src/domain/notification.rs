//! Transactional emails.

use super::{
    entity::{Order, Producer, User},
    service::Email,
};

pub const BRAND: &str = "Ammas Food";

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn page(heading: &str, paragraphs: &[String]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    format!("<html><body><h2>{heading}</h2>{body}</body></html>")
}

pub fn order_confirmation(customer: &User, order: &Order) -> Email {
    let number = escape(&order.state.order_number);
    Email {
        to: customer.state.email.clone(),
        subject: format!("Order Confirmed - {}", order.state.order_number),
        html: page(
            "Order Confirmed!",
            &[
                format!("Hello {},", escape(&customer.state.name)),
                format!("Your order <strong>{number}</strong> has been confirmed."),
                format!("Total Amount: £{:.2}", order.state.total_amount),
                format!("Status: {}", order.state.status),
                format!("Thank you for choosing {BRAND}!"),
            ],
        ),
    }
}

pub fn order_status_update(customer: &User, order: &Order) -> Email {
    Email {
        to: customer.state.email.clone(),
        subject: format!("Order Update - {}", order.state.order_number),
        html: page(
            "Order Status Update",
            &[
                format!("Hello {},", escape(&customer.state.name)),
                format!(
                    "Your order <strong>{}</strong> status has been updated to: <strong>{}</strong>",
                    escape(&order.state.order_number),
                    order.state.status
                ),
                format!("Thank you for choosing {BRAND}!"),
            ],
        ),
    }
}

pub fn order_rejection(customer: &User, order: &Order, reason: &str) -> Email {
    Email {
        to: customer.state.email.clone(),
        subject: format!("Order Cancelled - {}", order.state.order_number),
        html: page(
            "Order Cancelled",
            &[
                format!("Hello {},", escape(&customer.state.name)),
                format!(
                    "We're sorry to inform you that your order <strong>{}</strong> has been cancelled.",
                    escape(&order.state.order_number)
                ),
                format!("<strong>Reason:</strong> {}", escape(reason)),
                "Your payment has been refunded automatically. It may take 3-5 business days to reflect in your account.".into(),
                "We apologize for any inconvenience.".into(),
            ],
        ),
    }
}

pub fn new_order_for_producer(owner: &User, order: &Order, item_count: usize) -> Email {
    let number = escape(&order.state.order_number);
    Email {
        to: owner.state.email.clone(),
        subject: format!("New Order Received - {}", order.state.order_number),
        html: page(
            "New Order Received!",
            &[
                format!("Hello {},", escape(&owner.state.name)),
                format!("You have received a new order <strong>{number}</strong>."),
                format!(
                    "<ul><li>Order Number: {number}</li><li>Total Amount: £{:.2}</li><li>Items: {item_count}</li></ul>",
                    order.state.total_amount
                ),
                "Please log in to your dashboard to accept or reject this order.".into(),
                format!("Thank you for being part of {BRAND}!"),
            ],
        ),
    }
}

pub fn producer_approved(owner: &User, producer: &Producer) -> Email {
    Email {
        to: owner.state.email.clone(),
        subject: "Producer Account Approved".into(),
        html: page(
            &format!("Welcome to {BRAND}!"),
            &[
                format!("Hello {},", escape(&owner.state.name)),
                format!(
                    "Your producer account for <strong>{}</strong> has been approved.",
                    escape(&producer.state.kitchen_name)
                ),
                "You can now start adding dishes and accepting orders.".into(),
                format!("Thank you for joining {BRAND}!"),
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::{
        datatype::status::Role,
        entity::{producer::ProducerState, user::UserState, EntityData},
    };

    #[test]
    fn escapes_user_content() {
        assert_eq!(escape("<b>Tom & \"Jerry\"</b>"), "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;");
    }

    #[test]
    fn approval_email() {
        let hash = "$argon2id$v=19$m=4096,t=3,p=1$c2FsdHNhbHRzYWx0$Zm9vYmFyYmF6cXV4Zm9vYmFyYmF6cXV4Zm9vYmFyYg"
            .parse()
            .unwrap();
        let owner = User::restore(
            EntityData::fixture(1),
            UserState::new("Meena".into(), "meena@test.com".into(), hash, Role::Producer),
        );
        let producer = Producer::restore(
            EntityData::fixture(2),
            ProducerState::pending(1, "Meena's <Kitchen>".into(), None),
        );

        let email = producer_approved(&owner, &producer);

        assert_eq!(email.to, "meena@test.com");
        assert_eq!(email.subject, "Producer Account Approved");
        assert!(email.html.contains("Meena&#39;s &lt;Kitchen&gt;"));
        assert!(email.html.contains("Welcome to Ammas Food!"));
    }
}
