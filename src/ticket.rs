use std::fmt::Write;

use crate::models::order::{Order, PaymentMethod};

const WIDTH: usize = 32;

fn money(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("RD$ {amount:.0}")
    } else {
        format!("RD$ {amount:.2}")
    }
}

fn centered(out: &mut String, text: &str) {
    let _ = writeln!(out, "{:^width$}", text, width = WIDTH);
}

fn rule(out: &mut String) {
    let _ = writeln!(out, "{}", "-".repeat(WIDTH));
}

/// Kitchen/courier ticket for a thermal printer.
pub fn render_ticket(order: &Order) -> String {
    let mut out = String::new();

    centered(&mut out, "EL NEGUEV");
    centered(&mut out, "Sabor Criollo Dominicano");
    centered(&mut out, &order.created_at.format("%d/%m/%Y %H:%M").to_string());
    rule(&mut out);

    let _ = writeln!(out, "Orden #{}", order.id.simple().to_string().to_uppercase());
    let _ = writeln!(out, "Cliente: {}", order.customer_name);
    let _ = writeln!(out, "Tel: {}", order.phone);
    let _ = writeln!(out, "Dir: {}", order.address);
    if let Some(notes) = &order.notes {
        let _ = writeln!(out, "Nota: {notes}");
    }
    rule(&mut out);

    let _ = writeln!(out, "DETALLE:");
    for item in &order.items {
        let label = format!("{}x {}", item.quantity, item.name);
        let amount = money(item.subtotal());
        let pad = WIDTH.saturating_sub(label.chars().count() + amount.len()).max(1);
        let _ = writeln!(out, "{label}{}{amount}", " ".repeat(pad));
    }
    rule(&mut out);

    let _ = writeln!(out, "{:>width$}", format!("TOTAL: {}", money(order.total)), width = WIDTH);
    let payment = match order.payment_method {
        PaymentMethod::CashOnDelivery => "EFECTIVO (COBRAR)",
        PaymentMethod::Prepaid => "PAGADO",
    };
    let _ = writeln!(out, "{:>width$}", format!("Pago: {payment}"), width = WIDTH);
    rule(&mut out);

    centered(&mut out, "¡Gracias por preferir El Neguev!");
    centered(&mut out, "Buen Provecho");
    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::render_ticket;
    use crate::engine::lifecycle;
    use crate::models::dish::default_menu;
    use crate::models::order::{CustomerInfo, OrderItem, PaymentMethod};

    #[test]
    fn ticket_lists_items_total_and_payment() {
        let order = lifecycle::place_order(
            CustomerInfo {
                name: "Ana".to_string(),
                address: "Calle 1".to_string(),
                phone: "809".to_string(),
                notes: Some("Sin cebolla".to_string()),
            },
            &default_menu()[0],
            PaymentMethod::CashOnDelivery,
            Utc::now(),
        );
        let order = lifecycle::edit_items(
            &order,
            vec![
                order.items[0].clone(),
                OrderItem {
                    dish_id: "3".to_string(),
                    name: "Jugo de Chinola Natural".to_string(),
                    quantity: 2,
                    price: 120.0,
                },
            ],
        )
        .unwrap();

        let ticket = render_ticket(&order);

        assert!(ticket.contains("1x La Bandera Dominicana"));
        assert!(ticket.contains("2x Jugo de Chinola Natural"));
        assert!(ticket.contains("RD$ 240"));
        assert!(ticket.contains("TOTAL: RD$ 590"));
        assert!(ticket.contains("EFECTIVO (COBRAR)"));
        assert!(ticket.contains("Nota: Sin cebolla"));
    }
}
