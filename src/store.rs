//! Client for the remote quotation store.
//!
//! The store is an external HTTP backend; this module only knows how to
//! hand it a totals + identity + line-items payload and read records back.
//! Routes follow the backend's `/api/quotations` namespace.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::{QuotationForm, SavedQuotation};
use crate::pricing::QuotationTotals;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store rejected the request: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Flat save payload, mirroring what the backend persists: identity, the
/// raw form fields, the line-item collections, and the computed totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SavePayload<'a> {
    quotation_number: &'a str,
    quotation_date: &'a str,

    company_name: &'a str,
    company_address: &'a str,
    company_email: &'a str,
    company_phone: &'a str,

    client_name: &'a str,
    client_email: &'a str,
    client_phone: &'a str,
    project_name: &'a str,

    project_category: &'a str,
    project_type: &'a str,

    development: &'a [crate::model::DevelopmentItem],
    users: &'a [crate::model::UserTier],
    additional_costs: &'a [crate::model::AdditionalCost],

    tax_percent: f64,
    subtotal: f64,
    tax_amount: f64,
    total_amount: f64,
    payment_terms: &'a str,

    status: &'a str,
}

pub struct QuotationStore {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl QuotationStore {
    pub fn new(base_url: &str) -> Self {
        QuotationStore {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::new(),
        }
    }

    fn check<T: DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T, StoreError> {
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        Ok(response.json()?)
    }

    /// POST the quotation to the store. New records are saved as PENDING.
    pub fn save(&self, form: &QuotationForm, totals: &QuotationTotals) -> Result<(), StoreError> {
        let payload = SavePayload {
            quotation_number: &form.quotation_number,
            quotation_date: &form.quotation_date,
            company_name: &form.company.name,
            company_address: &form.company.address,
            company_email: &form.company.email,
            company_phone: &form.company.phone,
            client_name: &form.client.name,
            client_email: &form.client.email,
            client_phone: &form.client.phone,
            project_name: &form.project.name,
            project_category: &form.project.category,
            project_type: &form.project.kind,
            development: &form.development,
            users: &form.users,
            additional_costs: &form.additional_costs,
            tax_percent: totals.tax_rate,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            total_amount: totals.grand_total,
            payment_terms: &form.payment_terms,
            status: "PENDING",
        };

        let response = self
            .http
            .post(format!("{}/api/quotations/save", self.base_url))
            .json(&payload)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<SavedQuotation>, StoreError> {
        let response = self
            .http
            .get(format!("{}/api/quotations/all", self.base_url))
            .send()?;
        Self::check(response)
    }

    pub fn fetch(&self, id: i64) -> Result<SavedQuotation, StoreError> {
        let response = self
            .http
            .get(format!("{}/api/quotations/{id}", self.base_url))
            .send()?;
        Self::check(response)
    }

    pub fn delete(&self, id: i64) -> Result<(), StoreError> {
        let response = self
            .http
            .delete(format!("{}/api/quotations/{id}", self.base_url))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        Ok(())
    }
}

/// Stored line-item collections come back either as JSON arrays or as
/// strings containing JSON, depending on how the backend column is typed.
/// Anything else decodes to an empty list rather than failing the view.
pub fn parse_items<T: DeserializeOwned>(value: &Value) -> Vec<T> {
    match value {
        Value::Array(_) => serde_json::from_value(value.clone()).unwrap_or_default(),
        Value::String(raw) => serde_json::from_str(raw).unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DevelopmentItem;
    use serde_json::json;

    #[test]
    fn parse_items_accepts_array() {
        let value = json!([{"label": "API", "cost": "500", "hours": "", "rate": ""}]);
        let items: Vec<DevelopmentItem> = parse_items(&value);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "API");
    }

    #[test]
    fn parse_items_accepts_json_string() {
        let value = json!("[{\"label\":\"API\",\"cost\":\"500\",\"hours\":\"\",\"rate\":\"\"}]");
        let items: Vec<DevelopmentItem> = parse_items(&value);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].cost, "500");
    }

    #[test]
    fn parse_items_tolerates_garbage() {
        let items: Vec<DevelopmentItem> = parse_items(&json!(null));
        assert!(items.is_empty());
        let items: Vec<DevelopmentItem> = parse_items(&json!("not json"));
        assert!(items.is_empty());
        let items: Vec<DevelopmentItem> = parse_items(&json!(42));
        assert!(items.is_empty());
    }

    #[test]
    fn save_payload_serializes_camel_case() {
        let form = QuotationForm {
            quotation_number: "QTN-20260830-9999".into(),
            ..Default::default()
        };
        let totals = crate::pricing::compute_totals(&form);
        let payload = SavePayload {
            quotation_number: &form.quotation_number,
            quotation_date: &form.quotation_date,
            company_name: &form.company.name,
            company_address: &form.company.address,
            company_email: &form.company.email,
            company_phone: &form.company.phone,
            client_name: &form.client.name,
            client_email: &form.client.email,
            client_phone: &form.client.phone,
            project_name: &form.project.name,
            project_category: &form.project.category,
            project_type: &form.project.kind,
            development: &form.development,
            users: &form.users,
            additional_costs: &form.additional_costs,
            tax_percent: totals.tax_rate,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            total_amount: totals.grand_total,
            payment_terms: &form.payment_terms,
            status: "PENDING",
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["quotationNumber"], "QTN-20260830-9999");
        assert_eq!(value["status"], "PENDING");
        assert!(value.get("totalAmount").is_some());
    }
}
