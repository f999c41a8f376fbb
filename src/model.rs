use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CompanyDetails {
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ClientDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProjectInfo {
    pub name: String,
    pub category: String,
    pub kind: String,
}

/// One row of the development cost table. All fields are kept as the raw
/// text the user typed; numeric coercion happens in the pricing engine so
/// the document can render cells with their source precision.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DevelopmentItem {
    pub label: String,
    /// Fixed cost. Takes precedence over hours x rate whenever it parses > 0.
    pub cost: String,
    pub hours: String,
    pub rate: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UserTier {
    pub count: String,
    pub price: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AdditionalCost {
    pub label: String,
    pub cost: String,
}

/// A cost row tagged with its section, so callers add rows through one
/// typed entry point instead of section-name lookups.
#[derive(Debug, Clone)]
pub enum LineItem {
    Development(DevelopmentItem),
    UserTier(UserTier),
    Additional(AdditionalCost),
}

/// Immutable snapshot of the whole quotation form. The wizard (or any other
/// form owner) mutates its own copy and hands a reference to the pricing and
/// layout engines; the engines never write back.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuotationForm {
    pub quotation_number: String,
    pub quotation_date: String,

    pub company: CompanyDetails,
    pub client: ClientDetails,
    pub project: ProjectInfo,

    pub development: Vec<DevelopmentItem>,
    pub users: Vec<UserTier>,
    pub additional_costs: Vec<AdditionalCost>,

    pub tax_percent: String,
    pub payment_terms: String,
}

impl QuotationForm {
    pub fn push_row(&mut self, row: LineItem) {
        match row {
            LineItem::Development(item) => self.development.push(item),
            LineItem::UserTier(tier) => self.users.push(tier),
            LineItem::Additional(cost) => self.additional_costs.push(cost),
        }
    }

    /// Assigns the quotation number if it has not been assigned yet.
    /// Re-running on the same form never changes an existing number, so
    /// repeated previews and exports keep the same identity.
    pub fn ensure_quotation_number(&mut self) -> &str {
        if self.quotation_number.is_empty() {
            self.quotation_number = new_quotation_number();
        }
        &self.quotation_number
    }
}

/// `QTN-{YYYY}{MM}{DD}-{4-digit serial}`, e.g. QTN-20260830-4821.
pub fn new_quotation_number() -> String {
    let serial: u32 = rand::rng().random_range(1000..10000);
    format!("QTN-{}-{}", Local::now().format("%Y%m%d"), serial)
}

/// A stored quotation as returned by the remote store. Fields default when
/// absent so older records still decode; the line-item collections are
/// handled separately because some backends return them as JSON strings
/// (see `store::parse_items`).
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuotation {
    pub id: i64,
    #[serde(default)]
    pub quotation_number: String,
    #[serde(default)]
    pub quotation_date: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_category: String,
    #[serde(default)]
    pub development: serde_json::Value,
    #[serde(default)]
    pub users: serde_json::Value,
    #[serde(default)]
    pub additional_costs: serde_json::Value,
    #[serde(default)]
    pub tax_percent: f64,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub payment_terms: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotation_number_shape() {
        let number = new_quotation_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "QTN");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn quotation_number_assigned_once() {
        let mut form = QuotationForm::default();
        let first = form.ensure_quotation_number().to_string();
        let second = form.ensure_quotation_number().to_string();
        assert_eq!(first, second);

        // A pre-existing number is never regenerated.
        let mut form = QuotationForm {
            quotation_number: "QTN-20250101-1234".into(),
            ..Default::default()
        };
        form.ensure_quotation_number();
        assert_eq!(form.quotation_number, "QTN-20250101-1234");
    }

    #[test]
    fn push_row_targets_its_section() {
        let mut form = QuotationForm::default();
        form.push_row(LineItem::Development(DevelopmentItem {
            label: "API".into(),
            cost: "500".into(),
            ..Default::default()
        }));
        form.push_row(LineItem::UserTier(UserTier {
            count: "3".into(),
            price: "100".into(),
        }));
        form.push_row(LineItem::Additional(AdditionalCost {
            label: "Hosting".into(),
            cost: "200".into(),
        }));
        assert_eq!(form.development.len(), 1);
        assert_eq!(form.users.len(), 1);
        assert_eq!(form.additional_costs.len(), 1);
    }
}
