//! Text rendering for replies and notifications.

use std::fmt::Write;

use crate::cart::{Cart, CartItem};
use crate::catalog::MenuItem;
use crate::order::{Order, OrderStatus, TransitionPolicy};
use crate::value_objects::Money;
use crate::notify::{ActionButton, Notification};

/// One bullet per line: `• name`, then `amount xN = $subtotal`.
pub fn line_items(items: &[CartItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "• {}\n  {} x{} = {}",
                item.menu_item.name,
                item.selected_quantity.amount,
                item.quantity,
                item.subtotal()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line items followed by the given total.
pub fn order_summary(items: &[CartItem], total: Money) -> String {
    format!(
        "🛒 Order Summary 🛒\n{}\n\n💰 Total: {}",
        line_items(items),
        total
    )
}

/// The cart with one remove button per line and the checkout controls.
pub fn cart(cart: &Cart) -> Notification {
    let mut notification = Notification::text(order_summary(cart.items(), cart.total()));
    for (index, item) in cart.items().iter().enumerate() {
        notification = notification.with_row(vec![ActionButton::new(
            format!("❌ Remove {} ({})", item.menu_item.name, item.selected_quantity.amount),
            format!("remove_{index}"),
        )]);
    }
    notification
        .with_row(vec![ActionButton::new("🗑 Clear Cart", "clear_cart")])
        .with_row(vec![ActionButton::new("✅ Confirm Order", "confirm_order")])
}

/// A catalog entry with its numbered quantity options.
pub fn menu_item(item: &MenuItem) -> String {
    let mut text = format!("🔥 {} 🔥\n", item.name);
    if let Some(description) = &item.description {
        let _ = writeln!(text, "📝 {description}");
    }
    text.push_str("📊 Quantities Available:\n");
    for (i, q) in item.quantities.iter().enumerate() {
        let _ = writeln!(text, "{}. {} ({})", i + 1, q.amount, q.price);
    }
    text.push('\n');
    text.push_str(if item.is_available {
        "✅ Available"
    } else {
        "❌ Sold Out"
    });
    if item.video.is_some() {
        text.push_str("\n🎥 Video preview available");
    }
    text
}

/// Menu item text with one button per quantity option.
pub fn quantity_picker(item: &MenuItem) -> Notification {
    let row = item
        .quantities
        .iter()
        .enumerate()
        .map(|(i, q)| {
            ActionButton::new(
                format!("{}. {} ({})", i + 1, q.amount, q.price),
                format!("quantity_{}_{}", item.id, i),
            )
        })
        .collect();
    Notification::text(menu_item(item)).with_row(row)
}

/// Acknowledgment sent to the customer after confirmation.
pub fn order_acknowledgment(order: &Order) -> Notification {
    Notification::text(format!(
        "✅ Order confirmed!\n\nOrder ID: {}\n\n{}",
        order.id(),
        order_summary(order.items(), order.total_amount())
    ))
}

/// New-order alert for the administrator, with a button per next status.
pub fn admin_alert(order: &Order, policy: TransitionPolicy) -> Notification {
    let text = format!(
        "🔥 New Order! 🛸\n\nFrom: @{}\nName: {}\n\n{}\n\nOrder ID: {}",
        order.customer_username(),
        order.customer_name(),
        order_summary(order.items(), order.total_amount()),
        order.id()
    );
    Notification {
        text,
        buttons: status_buttons(order, policy),
    }
}

/// Buttons for the statuses the administrator may move the order to, two per row.
pub fn status_buttons(order: &Order, policy: TransitionPolicy) -> Vec<Vec<ActionButton>> {
    let buttons: Vec<ActionButton> = policy
        .next_statuses(order.status())
        .into_iter()
        .filter_map(|status| {
            status
                .callback_verb()
                .map(|verb| ActionButton::new(status.action_label(), format!("{verb}_{}", order.id())))
        })
        .collect();
    buttons.chunks(2).map(<[ActionButton]>::to_vec).collect()
}

/// Status change notice sent to the customer.
pub fn status_notice(order: &Order, status: OrderStatus) -> Notification {
    Notification::text(format!(
        "{emoji} {} {emoji}\n\nOrder ID: {}",
        status.customer_phrase(),
        order.id(),
        emoji = status.emoji()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Quantity;
    use chrono::Utc;
    use common::{ChatId, MenuItemId};

    fn menu(name: &str, amount: &str, price: u64) -> MenuItem {
        MenuItem {
            id: MenuItemId::from(name.to_lowercase()),
            name: name.to_string(),
            description: Some("Fresh".to_string()),
            image: None,
            video: None,
            quantities: vec![Quantity::new("Option 1", amount, Money::from_units(price))],
            is_available: true,
            updated_at: Utc::now(),
        }
    }

    fn line(name: &str, amount: &str, price: u64, quantity: u32) -> CartItem {
        let item = menu(name, amount, price);
        CartItem {
            selected_quantity: item.quantities[0].clone(),
            menu_item: item,
            quantity,
        }
    }

    #[test]
    fn line_items_show_subtotals() {
        let text = line_items(&[line("Haze", "1/8", 25, 1), line("Kush", "1/4", 45, 2)]);
        assert_eq!(text, "• Haze\n  1/8 x1 = $25\n• Kush\n  1/4 x2 = $90");
    }

    #[test]
    fn summary_includes_total() {
        let text = order_summary(
            &[line("Haze", "1/8", 25, 1), line("Kush", "1/4", 45, 2)],
            Money::from_units(115),
        );
        assert!(text.ends_with("💰 Total: $115"));
    }

    #[test]
    fn menu_item_lists_numbered_options() {
        let text = menu_item(&menu("Haze", "2g", 15));
        assert!(text.contains("📝 Fresh"));
        assert!(text.contains("1. 2g ($15)"));
        assert!(text.ends_with("✅ Available"));
    }

    #[test]
    fn quantity_picker_encodes_item_and_index() {
        let n = quantity_picker(&menu("Haze", "2g", 15));
        assert_eq!(n.buttons[0][0].data, "quantity_haze_0");
    }

    #[test]
    fn admin_alert_offers_next_statuses() {
        let order = Order::place(ChatId::new(1), "Jane", "jane", vec![line("Haze", "1/8", 25, 1)]);

        let strict = admin_alert(&order, TransitionPolicy::Strict);
        assert!(strict.text.contains("From: @jane"));
        assert_eq!(strict.buttons.len(), 1);
        assert_eq!(strict.buttons[0][0].data, format!("accept_{}", order.id()));
        assert_eq!(strict.buttons[0][1].data, format!("reject_{}", order.id()));

        let permissive = admin_alert(&order, TransitionPolicy::Permissive);
        assert_eq!(permissive.buttons.len(), 2);
    }

    #[test]
    fn status_notice_uses_fixed_phrase() {
        let order = Order::place(ChatId::new(1), "Jane", "jane", vec![line("Haze", "1/8", 25, 1)]);
        let n = status_notice(&order, OrderStatus::Delivered);
        assert!(n.text.contains("Your order has been delivered"));
        assert!(n.text.contains(order.id().as_str()));
    }

    #[test]
    fn order_messages_show_the_recorded_total() {
        let order = Order::place(ChatId::new(1), "Jane", "jane", vec![line("Haze", "1/8", 25, 1)]);
        let mut json = serde_json::to_value(&order).unwrap();
        json["totalAmount"] = serde_json::json!(30);
        let order: Order = serde_json::from_value(json).unwrap();

        assert!(order_acknowledgment(&order).text.contains("💰 Total: $30"));
        assert!(
            admin_alert(&order, TransitionPolicy::Strict)
                .text
                .contains("💰 Total: $30")
        );
    }
}
