//! Maps an inbound message body to a bot action.
//!
//! Rules are checked top to bottom and the first match wins: exact greetings
//! and keywords, then the `track`/`search` command forms, then the bare
//! order-number shorthand, then the fallback. Matching is case-insensitive,
//! but order numbers and search terms keep their original casing.

/// What a message asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Welcome,
    Help,
    Support,
    Track(String),
    Search(String),
    Default,
}

pub fn route(body: &str) -> Action {
    let text = body.trim();
    match text.to_lowercase().as_str() {
        "hi" | "hello" | "start" => return Action::Welcome,
        "help" | "menu" => return Action::Help,
        "support" | "contact" | "contact us" => return Action::Support,
        _ => {}
    }
    if let Some(rest) = strip_prefix_ci(text, "track ") {
        return Action::Track(rest.trim().to_string());
    }
    if let Some(rest) = strip_prefix_ci(text, "search ") {
        let term = rest.trim();
        if !term.is_empty() {
            return Action::Search(term.to_string());
        }
    }
    if looks_like_order_number(text) {
        return Action::Track(text.to_string());
    }
    Action::Default
}

/// At least three ASCII letters or digits and nothing else.
fn looks_like_order_number(text: &str) -> bool {
    text.len() >= 3 && text.chars().all(|c| c.is_ascii_alphanumeric())
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}
