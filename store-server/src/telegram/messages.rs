//! Customer-facing message templates (French, amounts in MAD)

use shared::models::{Order, OrderItem};

// Short callback-answer texts (shown as toast/alert in the chat client)
pub const ACK_CONFIRMED: &str = "✅ Commande confirmée";
pub const ACK_CANCELLED: &str = "❌ Commande annulée";
pub const ALERT_EXPIRED_OR_HANDLED: &str =
    "Cette demande a expiré ou a déjà été traitée.";
pub const ALERT_FAILURE: &str = "Une erreur est survenue. Veuillez réessayer.";

pub fn format_mad(amount: f64) -> String {
    format!("{amount:.2} MAD")
}

pub fn confirm_callback_data(order_id: i64) -> String {
    format!("confirm_order_{order_id}")
}

pub fn cancel_callback_data(order_id: i64) -> String {
    format!("cancel_order_{order_id}")
}

/// Prompt sent to the customer right after checkout, carrying the
/// confirm / cancel inline buttons.
pub fn confirmation_prompt(order_number: &str, total_amount: f64) -> String {
    format!(
        "🛍️ *Confirmation de commande*\n\n\
         📋 *Numéro de commande*: `{order_number}`\n\
         💰 *Montant Total*: {total}\n\n\
         Merci de confirmer votre commande (paiement à la livraison).\n\
         Cette demande expire dans 24 heures.",
        total = format_mad(total_amount),
    )
}

/// Sent to the customer once the order is confirmed.
pub fn order_confirmed(order_number: &str, total_amount: f64) -> String {
    format!(
        "✅ *Commande confirmée*\n\n\
         📋 *Numéro de commande*: `{order_number}`\n\
         💰 *Montant Total*: {total}\n\n\
         Votre commande est en préparation. Paiement à la livraison.",
        total = format_mad(total_amount),
    )
}

/// Sent to the customer once the order is cancelled.
pub fn order_cancelled(order_number: &str) -> String {
    format!(
        "❌ *Commande annulée*\n\n\
         📋 *Numéro de commande*: `{order_number}`\n\n\
         Votre commande a bien été annulée. À bientôt !",
    )
}

/// Admin summary after a customer confirmation.
pub fn admin_order_confirmed(order_number: &str, total_amount: f64) -> String {
    format!(
        "✅ *Commande confirmée par le client*\n\n\
         📋 *Numéro de commande*: `{order_number}`\n\
         💰 *Montant Total*: {total}",
        total = format_mad(total_amount),
    )
}

/// New-order notification with the full item list (sent to the admin
/// channel for guest checkouts, or as context wherever needed).
pub fn new_order(order: &Order, items: &[OrderItem]) -> String {
    let items_list = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            format!(
                "{}. {}\n   Quantité: {} × {}",
                index + 1,
                item.name,
                item.quantity,
                format_mad(item.price),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "🛍️ *Nouvelle Commande*\n\n\
         📋 *Numéro de commande*: `{number}`\n\n\
         👤 *Informations Client*\n\
         Nom: {name}\n\
         Téléphone: {phone}\n\
         Adresse: {address}, {city}\n\n\
         📦 *Produits commandés*\n\
         {items_list}\n\n\
         💰 *Montant Total*: {total}\n\n\
         ✅ Commande enregistrée avec succès",
        number = order.order_number,
        name = order.customer_name,
        phone = order.customer_phone,
        address = order.customer_address,
        city = order.customer_city,
        total = format_mad(order.total_amount),
    )
}
