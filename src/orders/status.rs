//! Order status classification.

/// Return a short emoji/icon for a given order status.
/// Matching is case-insensitive; spaces and underscores are equivalent.
/// Unknown statuses fall back to the clipboard icon.
pub fn status_emoji(status: &str) -> &'static str {
    let key = status.trim().to_lowercase().replace(' ', "_");
    match key.as_str() {
        "pending" => "⏳",
        "processing" => "🔄",
        "confirmed" => "✅",
        "shipped" | "dispatched" => "🚚",
        "out_for_delivery" => "🏃‍♂️",
        "delivered" => "📦",
        "completed" => "🎉",
        "cancelled" => "❌",
        "refunded" => "💰",
        "in_production" | "manufacturing" => "🔨",
        "ready_for_delivery" => "📋",
        _ => "📋",
    }
}
