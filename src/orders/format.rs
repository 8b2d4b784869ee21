//! Renders order data into WhatsApp-ready message text.
//!
//! Formatting is pure and total: any combination of missing optional fields
//! produces a valid message, never an error and never a blank `*Label:*`
//! line.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use super::model::{OrderRecord, OrderSummary};
use super::status::status_emoji;

/// Dates render in the business's local timezone (Asia/Colombo, UTC+05:30).
const COLOMBO_UTC_OFFSET_SECS: i64 = 5 * 3600 + 30 * 60;

const DATE_STYLE: &str = "%b %-d, %Y";

/// Build the full order-details reply.
pub fn format_order_details(order: &OrderRecord) -> String {
    let status = present(&order.order_status).unwrap_or("Unknown");

    let mut out = String::from("📦 *Order Details*\n\n");
    out.push_str(&format!("*Order Number:* {}\n", order.order_number));
    out.push_str(&format!(
        "*Status:* {} {}\n",
        status_emoji(status),
        capitalize_first(status)
    ));

    let customer_name = [
        present(&order.customer_first_name),
        present(&order.customer_last_name),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");
    if !customer_name.is_empty() {
        out.push_str(&format!("*Customer:* {customer_name}\n"));
    }
    if let Some(email) = present(&order.customer_email) {
        out.push_str(&format!("*Email:* {email}\n"));
    }
    if let Some(phone) = present(&order.phone_number) {
        out.push_str(&format!("*Phone:* {phone}\n"));
    }
    if let Some(address) = present(&order.customer_address) {
        out.push_str(&format!("*Address:* {address}\n"));
    }

    if let Some(created) = present(&order.created_at) {
        out.push_str(&format!("*Order Date:* {}\n", format_date(created)));
    }

    if let Some(product_type) = present(&order.product_type) {
        out.push_str(&format!("*Product Type:* {}\n", title_case(product_type)));
    }
    if let Some(material) = present(&order.product_material) {
        out.push_str(&format!("*Material:* {material}\n"));
    }
    if let Some(area) = order.full_area {
        out.push_str(&format!("*Area:* {} sq ft\n", format_quantity(area)));
    }
    if let Some(delivery) = present(&order.delivery_method) {
        out.push_str(&format!("*Delivery:* {}\n", title_case(delivery)));
    }

    // The pricing header only appears when at least one pricing line does.
    let mut pricing = String::new();
    if let Some(price) = order.price {
        pricing.push_str(&format!("*Original Price:* {}\n", format_money(price)));
    }
    if let Some(discount) = order.discount.filter(|d| *d > 0.0) {
        pricing.push_str(&format!("*Discount:* {}\n", format_money(discount)));
    }
    if let Some(final_amount) = order.final_amount {
        pricing.push_str(&format!("*Final Amount:* {}\n", format_money(final_amount)));
    }
    if !pricing.is_empty() {
        out.push_str("\n💰 *Pricing:*\n");
        out.push_str(&pricing);
    }

    if let Some(payment_type) = present(&order.payment_type) {
        out.push_str("\n💳 *Payment:*\n");
        out.push_str(&format!(
            "*Payment Type:* {}\n",
            capitalize_first(payment_type)
        ));
        if payment_type == "installment" {
            for part in order.installments() {
                let status = part
                    .status
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or("pending");
                let icon = if status == "paid" { "✅" } else { "⏳" };
                out.push_str(&format!(
                    "*{}:* {} {} ({})\n",
                    part.label,
                    icon,
                    format_money(part.amount),
                    status
                ));
                if status == "paid" {
                    if let Some(paid) = part.paid_date.map(str::trim).filter(|s| !s.is_empty()) {
                        out.push_str(&format!("*Paid Date:* {}\n", format_date(paid)));
                    }
                }
            }
        }
    }

    if let Some(description) = present(&order.product_description) {
        out.push_str(&format!("\n📝 *Description:* {description}\n"));
    }

    out.push_str("\n📱 *Questions?* Reply to this chat or contact: 077 122 9598\n🌐 *Website:* https://nuwandibambooblinds.lk/");
    out
}

/// Build the search-results reply. At most five orders are listed.
pub fn format_search_results(term: &str, orders: &[OrderSummary]) -> String {
    let mut out = format!("🔍 *Search Results for \"{term}\":*\n\n");
    for (index, order) in orders.iter().take(5).enumerate() {
        let status = order
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown");
        out.push_str(&format!("{}. *{}*\n", index + 1, order.order_number));
        out.push_str(&format!("   Status: {} {}\n", status_emoji(status), status));
        let date = order
            .created_at
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(format_date)
            .unwrap_or_else(|| "N/A".to_string());
        out.push_str(&format!("   Date: {date}\n"));
        if let Some(amount) = order.total_amount {
            out.push_str(&format!("   Amount: {}\n", format_money(amount)));
        }
        out.push('\n');
    }
    if orders.len() > 5 {
        out.push_str(&format!("... and {} more orders\n\n", orders.len() - 5));
    }
    out.push_str("💡 *Tip:* Send any order number to get full details!\n");
    out.push_str("📞 For more orders, contact: 077 122 9598");
    out
}

/// Render a date string in `Mon D, YYYY` form.
///
/// Timestamps with an explicit offset are converted to Colombo time; naive
/// database timestamps are already business-local and format as-is. Anything
/// unparsable falls back to the raw string.
pub fn format_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        let local = dt.naive_utc() + Duration::seconds(COLOMBO_UTC_OFFSET_SECS);
        return local.format(DATE_STYLE).to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return dt.format(DATE_STYLE).to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return dt.format(DATE_STYLE).to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format(DATE_STYLE).to_string();
    }
    raw.to_string()
}

/// "Rs. " amount with thousands separators. Whole amounts drop the decimals.
fn format_money(amount: f64) -> String {
    let negative = amount < 0.0;
    let abs = amount.abs();
    let (int_part, frac_part) = if (abs - abs.trunc()).abs() < 1e-9 {
        (format!("{abs:.0}"), String::new())
    } else {
        let fixed = format!("{abs:.2}");
        match fixed.split_once('.') {
            Some((int, frac)) => (int.to_string(), format!(".{frac}")),
            None => (fixed, String::new()),
        }
    };
    let sign = if negative { "-" } else { "" };
    format!("Rs. {sign}{}{frac_part}", group_thousands(&int_part))
}

/// Plain quantity without separators, dropping a `.0` tail on whole values.
fn format_quantity(value: f64) -> String {
    if (value - value.trunc()).abs() < 1e-9 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Underscores to spaces, first letter of each word uppercased.
fn title_case(value: &str) -> String {
    value
        .replace('_', " ")
        .split_whitespace()
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Trimmed, non-empty view of an optional field.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
