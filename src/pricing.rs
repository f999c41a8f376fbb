use serde::Serialize;

use crate::model::{AdditionalCost, DevelopmentItem, LineItem, QuotationForm, UserTier};

/// Coerce a raw form field to a number. Empty or malformed input becomes 0;
/// negative values pass through untouched. The permissiveness is deliberate:
/// the form never rejects input, so totals must stay computable on every
/// keystroke without raising errors.
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}

impl DevelopmentItem {
    /// Fixed cost wins whenever it parses to a positive number; otherwise
    /// the row falls back to hourly billing. Never both.
    pub fn effective_cost(&self) -> f64 {
        let fixed = parse_amount(&self.cost);
        if fixed > 0.0 {
            fixed
        } else {
            parse_amount(&self.hours) * parse_amount(&self.rate)
        }
    }
}

impl UserTier {
    pub fn effective_cost(&self) -> f64 {
        parse_amount(&self.count) * parse_amount(&self.price)
    }
}

impl AdditionalCost {
    pub fn effective_cost(&self) -> f64 {
        parse_amount(&self.cost)
    }
}

impl LineItem {
    pub fn effective_cost(&self) -> f64 {
        match self {
            LineItem::Development(item) => item.effective_cost(),
            LineItem::UserTier(tier) => tier.effective_cost(),
            LineItem::Additional(cost) => cost.effective_cost(),
        }
    }
}

/// Aggregate totals for one snapshot of the form. Derived data only: never
/// stored, recomputed from scratch on every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuotationTotals {
    pub development: f64,
    pub users: f64,
    pub additional: f64,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub grand_total: f64,
}

impl QuotationTotals {
    pub fn tax_label(&self) -> &'static str {
        if self.tax_rate > 0.0 {
            "(Including Tax)"
        } else {
            "(Excluding Tax)"
        }
    }
}

/// The pricing engine. Pure and deterministic: identical snapshots produce
/// bit-identical totals, so it is safe to run on every form change.
pub fn compute_totals(form: &QuotationForm) -> QuotationTotals {
    let development: f64 = form.development.iter().map(|r| r.effective_cost()).sum();
    let users: f64 = form.users.iter().map(|r| r.effective_cost()).sum();
    let additional: f64 = form.additional_costs.iter().map(|r| r.effective_cost()).sum();

    let subtotal = development + users + additional;
    let tax_rate = parse_amount(&form.tax_percent);
    let tax_amount = subtotal * tax_rate / 100.0;

    QuotationTotals {
        development,
        users,
        additional,
        subtotal,
        tax_rate,
        tax_amount,
        grand_total: subtotal + tax_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev(cost: &str, hours: &str, rate: &str) -> DevelopmentItem {
        DevelopmentItem {
            label: "task".into(),
            cost: cost.into(),
            hours: hours.into(),
            rate: rate.into(),
        }
    }

    #[test]
    fn fixed_cost_wins_over_hourly() {
        assert_eq!(dev("50", "10", "5").effective_cost(), 50.0);
    }

    #[test]
    fn hourly_fallback_when_fixed_is_zero() {
        assert_eq!(dev("0", "10", "5").effective_cost(), 50.0);
        assert_eq!(dev("", "10", "5").effective_cost(), 50.0);
    }

    #[test]
    fn malformed_input_coerces_to_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("  12.5 "), 12.5);
        // Negatives are not rejected; they pass through and can reduce totals.
        assert_eq!(parse_amount("-3"), -3.0);
        assert_eq!(dev("-3", "10", "5").effective_cost(), 50.0);
    }

    #[test]
    fn aggregate_totals_with_tax() {
        let form = QuotationForm {
            development: vec![dev("500", "", "")],
            users: vec![UserTier {
                count: "3".into(),
                price: "100".into(),
            }],
            additional_costs: vec![AdditionalCost {
                label: "Hosting".into(),
                cost: "200".into(),
            }],
            tax_percent: "18".into(),
            ..Default::default()
        };

        let totals = compute_totals(&form);
        assert_eq!(totals.subtotal, 1000.0);
        assert_eq!(totals.tax_amount, 180.0);
        assert_eq!(totals.grand_total, 1180.0);
        assert_eq!(totals.tax_label(), "(Including Tax)");
    }

    #[test]
    fn totals_are_idempotent() {
        let form = QuotationForm {
            development: vec![dev("", "7.5", "40"), dev("99.99", "1", "1")],
            users: vec![UserTier {
                count: "12".into(),
                price: "8.25".into(),
            }],
            tax_percent: "8.875".into(),
            ..Default::default()
        };

        let first = compute_totals(&form);
        let second = compute_totals(&form);
        assert_eq!(first, second);
    }

    #[test]
    fn zero_tax_label() {
        let form = QuotationForm {
            development: vec![dev("100", "", "")],
            ..Default::default()
        };
        let totals = compute_totals(&form);
        assert_eq!(totals.tax_amount, 0.0);
        assert_eq!(totals.grand_total, 100.0);
        assert_eq!(totals.tax_label(), "(Excluding Tax)");
    }

    #[test]
    fn empty_form_totals_to_zero() {
        let totals = compute_totals(&QuotationForm::default());
        assert_eq!(totals.subtotal, 0.0);
        assert_eq!(totals.grand_total, 0.0);
    }
}
