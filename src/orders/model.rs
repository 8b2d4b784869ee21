//! Data shapes returned by the order tracking API.
//!
//! Every field other than the order number is optional: records come from a
//! mix of legacy and current back-office tooling, so missing or oddly-typed
//! fields are normal and must never fail a lookup.

use serde::{Deserialize, Deserializer};

/// A single order as returned by `GET /api/order/{order_number}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderRecord {
    pub order_number: String,
    #[serde(default)]
    pub order_status: Option<String>,
    #[serde(default)]
    pub customer_first_name: Option<String>,
    #[serde(default)]
    pub customer_last_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub product_material: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub full_area: Option<f64>,
    #[serde(default)]
    pub delivery_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub discount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub final_amount: Option<f64>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub first_installment: Option<f64>,
    #[serde(default)]
    pub first_installment_status: Option<String>,
    #[serde(default)]
    pub first_installment_paid_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub second_installment: Option<f64>,
    #[serde(default)]
    pub second_installment_status: Option<String>,
    #[serde(default)]
    pub second_installment_paid_date: Option<String>,
    #[serde(default)]
    pub product_description: Option<String>,
}

/// Borrowed view over one installment's amount/status/paid-date triple.
pub struct Installment<'a> {
    pub label: &'static str,
    pub amount: f64,
    pub status: Option<&'a str>,
    pub paid_date: Option<&'a str>,
}

impl OrderRecord {
    /// The installments that carry an amount, in payment order.
    pub fn installments(&self) -> Vec<Installment<'_>> {
        let mut out = Vec::new();
        if let Some(amount) = self.first_installment {
            out.push(Installment {
                label: "1st Installment",
                amount,
                status: self.first_installment_status.as_deref(),
                paid_date: self.first_installment_paid_date.as_deref(),
            });
        }
        if let Some(amount) = self.second_installment {
            out.push(Installment {
                label: "2nd Installment",
                amount,
                status: self.second_installment_status.as_deref(),
                paid_date: self.second_installment_paid_date.as_deref(),
            });
        }
        out
    }
}

/// One row of a search result from `GET /api/orders/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderSummary {
    pub order_number: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_amount: Option<f64>,
}

/// Result of a single order lookup.
#[derive(Debug)]
pub enum LookupOutcome {
    Found(OrderRecord),
    NotFound,
    TransientError,
}

/// Result of an order search.
#[derive(Debug)]
pub enum SearchOutcome {
    Found(Vec<OrderSummary>),
    NoMatches,
    TransientError,
}

/// Accept a JSON number or a numeric string; anything that does not parse to
/// a finite number is treated as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|n| n.is_finite()))
}
