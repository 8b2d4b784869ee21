//! Canned reply texts. Everything user-facing that is not built from live
//! order data lives here, WhatsApp formatting included.

pub const SUPPORT: &str = "📞 *Contact & Support Information*\n\n\
🏢 *Nuwandi Bamboo Blinds*\n\n\
📱 *Phone:* 077 122 9598\n\
📧 *Email:* nuwandhibambooblinds@gmail.com\n\
🌐 *Website:* https://nuwandibambooblinds.lk/\n\n\
🕐 *Business Hours:*\n\
Monday - Saturday: 9:00 AM - 6:00 PM\n\
Sunday: Closed\n\n\
💬 *How to reach us:*\n\
• Call us during business hours\n\
• Send us an email anytime\n\
• Visit our website for more information\n\
• Continue chatting here for order tracking\n\n\
🎋 *What we do:*\n\
• Custom bamboo blinds\n\
• Window treatments\n\
• Interior design solutions\n\
• Professional installation services\n\n\
Need immediate help? Call us at 077 122 9598! 📞";

pub const HELP: &str = "*🤖 Bot Commands Help:*\n\n\
1️⃣ *Track specific order*:\n\
   • Send: \"track ORD123\"\n\
   • Or just: \"ORD123\"\n\n\
2️⃣ *Search your orders*:\n\
   • Send: \"search John Doe\"\n\
   • Works with name, phone, or email\n\n\
3️⃣ *Get support*:\n\
   • Send: \"support\" or \"contact\"\n\n\
4️⃣ *Get help*:\n\
   • Send: \"help\" or \"menu\"\n\n\
5️⃣ *Start over*:\n\
   • Send: \"hi\" or \"hello\"\n\n\
💡 *Tips:*\n\
• Order numbers are usually alphanumeric (e.g., ORD123, INV456)\n\
• All commands are case-insensitive\n\n\
🏢 *Business Hours:* Monday - Saturday, 9:00 AM - 6:00 PM\n\
📞 *Support:* 077 122 9598\n\
🌐 *Website:* https://nuwandibambooblinds.lk/";

pub const FALLBACK: &str = "🤖 *I didn't understand that command.*\n\n\
💡 *Try these:*\n\
• Send your order number (e.g., \"ORD123\")\n\
• Type \"help\" for all commands\n\
• Type \"support\" for contact info\n\
• Type \"hi\" to start over\n\n\
📞 Need human help? Contact: 077 122 9598";

pub const SERVICE_UNAVAILABLE: &str = "❌ *Service Temporarily Unavailable*\n\n\
Sorry, we're experiencing technical difficulties.\n\n\
🔄 Please try again in a few moments.\n\
📞 If the issue persists, contact: 077 122 9598";

pub const SEARCH_UNAVAILABLE: &str = "❌ *Search Error*\n\n\
Sorry, there was an error searching for orders.\n\n\
🔄 Please try again in a few moments.\n\
📞 If the issue persists, contact: 077 122 9598";

pub const APOLOGY: &str =
    "Sorry, there was an error processing your message. Please try again.";

/// Greeting for new or returning chats. Uses the WhatsApp profile name when
/// the webhook carries one.
pub fn welcome(name: Option<&str>) -> String {
    format!(
        "Hello {}! 👋\n\n\
         Welcome to *Nuwandi Bamboo Blinds* order tracking service! 🎋\n\n\
         Here's what you can do:\n\
         📦 *Track Order*: Send your order number or type \"track [order_number]\"\n\
         📞 *Support*: Type \"support\" for contact information\n\
         ❓ *Help*: Type \"help\" for more options\n\n\
         Just send your order number to get started! 🚀\n\n\
         Example: Send \"ORD123\" or \"track ORD123\"",
        name.unwrap_or("there")
    )
}

pub fn order_not_found(order_number: &str) -> String {
    format!(
        "❌ *Order Not Found*\n\n\
         Order \"{order_number}\" could not be found in our system.\n\n\
         💡 *Please check:*\n\
         • Order number spelling\n\
         • Order number format\n\
         • Contact us if you need assistance\n\n\
         📞 Support: 077 122 9598"
    )
}

pub fn no_orders_found(term: &str) -> String {
    format!(
        "❌ *No Orders Found*\n\n\
         No orders found for \"{term}\".\n\n\
         💡 *Try searching with:*\n\
         • Full name (e.g., \"John Doe\")\n\
         • Phone number (e.g., \"0771234567\")\n\
         • Email address\n\n\
         📞 Need help? Contact: 077 122 9598"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_uses_the_profile_name_when_present() {
        let text = welcome(Some("Nimal"));
        assert!(text.starts_with("Hello Nimal! 👋"));
    }

    #[test]
    fn welcome_falls_back_to_a_generic_greeting() {
        let text = welcome(None);
        assert!(text.starts_with("Hello there! 👋"));
    }

    #[test]
    fn not_found_quotes_the_requested_number() {
        let text = order_not_found("XYZ999");
        assert!(text.contains("Order \"XYZ999\" could not be found"));
    }
}
