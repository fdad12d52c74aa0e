use shop_engine::db_types::{FullOrder, Order, OrderStatusType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// The confirmation sent to a customer once their payment has gone through.
pub fn order_confirmation_email(store_name: &str, from: &str, order: &FullOrder) -> EmailMessage {
    let o = &order.order;
    let rows = order
        .items
        .iter()
        .map(|item| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&item.product_name),
                item.quantity,
                item.price_at_purchase,
                item.line_total()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let html_body = format!(
        r#"<html>
<body>
<h2>Thank you for your order, {customer}!</h2>
<p>We have received your payment for order <strong>#{id}</strong>.</p>
<p>Your order will be delivered to <strong>{recipient}</strong> at {address}.</p>
<table>
<tr><th>Item</th><th>Quantity</th><th>Price</th><th>Total</th></tr>
{rows}
</table>
<p><strong>Order total: {total}</strong></p>
<p>{store}</p>
</body>
</html>"#,
        customer = escape_html(first_name(&o.customer_name)),
        id = o.id,
        recipient = escape_html(&o.recipient_name),
        address = escape_html(&o.recipient_address),
        total = o.total_price,
        store = escape_html(store_name),
    );
    EmailMessage {
        from: from.to_string(),
        to: o.customer_email.clone(),
        subject: format!("Your {store_name} Order #{} is Confirmed!", o.id),
        html_body,
    }
}

/// Lets the customer know that their order has been shipped or delivered. Other statuses produce no email.
pub fn status_update_email(store_name: &str, from: &str, order: &Order) -> Option<EmailMessage> {
    let (headline, subject) = match order.status {
        OrderStatusType::Shipped => ("is on its way", format!("Your {store_name} Order #{} has Shipped", order.id)),
        OrderStatusType::Completed => {
            ("has been delivered", format!("Your {store_name} Order #{} is Complete", order.id))
        },
        _ => return None,
    };
    let html_body = format!(
        r#"<html>
<body>
<h2>Hello {customer},</h2>
<p>Your order <strong>#{id}</strong> {headline}.</p>
<p>Recipient: {recipient}, {address}</p>
<p>{store}</p>
</body>
</html>"#,
        customer = escape_html(first_name(&order.customer_name)),
        id = order.id,
        recipient = escape_html(&order.recipient_name),
        address = escape_html(&order.recipient_address),
        store = escape_html(store_name),
    );
    Some(EmailMessage { from: from.to_string(), to: order.customer_email.clone(), subject, html_body })
}

fn first_name(full_name: &str) -> &str {
    full_name.split_whitespace().next().unwrap_or(full_name)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
