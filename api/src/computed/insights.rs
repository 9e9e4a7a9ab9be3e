// Intelligence insights: ledger summary in, model-written observations out

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;

use crate::repository::Transaction;

const MAX_INSIGHTS: usize = 10;
const TOP_N: usize = 10;

pub const SYSTEM_PROMPT: &str = "You are a financial analyst for a small business. \
You receive an aggregated summary of the business's bank transactions. \
Reply with ONLY a JSON array. Each element is an object with the keys \
\"title\" (short headline), \"detail\" (one or two sentences), \
\"severity\" (one of \"info\", \"warning\", \"critical\") and \"category\" \
(a short label or null). Only state figures that appear in the summary. \
If nothing is worth reporting, reply with [].";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "low")]
    Info,
    #[serde(alias = "medium")]
    Warning,
    #[serde(alias = "high")]
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub detail: String,
    pub severity: Severity,
    #[serde(default)]
    pub category: Option<String>,
}

fn label(tx: &Transaction) -> &str {
    tx.merchant_name
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(&tx.name)
}

fn top_outflows<'a, F>(transactions: &'a [Transaction], key: F) -> Vec<(&'a str, f64)>
where
    F: Fn(&'a Transaction) -> Option<&'a str>,
{
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for tx in transactions.iter().filter(|tx| tx.amount > 0.0) {
        if let Some(k) = key(tx) {
            *totals.entry(k).or_default() += tx.amount;
        }
    }
    let mut ranked: Vec<_> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(TOP_N);
    ranked
}

/// Aggregate the window into the user prompt. Raw transaction rows are not
/// sent; only totals and the largest merchants and categories.
pub fn build_prompt(transactions: &[Transaction], since: NaiveDate, until: NaiveDate) -> String {
    let outflow: f64 = transactions.iter().filter(|t| t.amount > 0.0).map(|t| t.amount).sum();
    let inflow: f64 = transactions.iter().filter(|t| t.amount < 0.0).map(|t| -t.amount).sum();
    let pending = transactions.iter().filter(|t| t.pending).count();

    let mut prompt = String::new();
    let _ = writeln!(prompt, "Period: {} to {}", since, until);
    let _ = writeln!(prompt, "Transactions: {} ({} pending)", transactions.len(), pending);
    let _ = writeln!(prompt, "Total outflow: {:.2}", outflow);
    let _ = writeln!(prompt, "Total inflow: {:.2}", inflow);
    let _ = writeln!(prompt, "Net: {:.2}", inflow - outflow);

    let _ = writeln!(prompt, "\nLargest merchants by spend:");
    for (merchant, total) in top_outflows(transactions, |t| Some(label(t))) {
        let _ = writeln!(prompt, "- {}: {:.2}", merchant, total);
    }

    let categories = top_outflows(transactions, |t| t.category.as_deref());
    if !categories.is_empty() {
        let _ = writeln!(prompt, "\nLargest categories by spend:");
        for (category, total) in categories {
            let _ = writeln!(prompt, "- {}: {:.2}", category, total);
        }
    }

    prompt
}

/// Parse the model's reply. Tolerates prose or code fences around the array.
pub fn parse_insights(text: &str) -> Result<Vec<Insight>, String> {
    let start = text.find('[').ok_or("reply contains no JSON array")?;
    let end = text.rfind(']').ok_or("reply contains no JSON array")?;
    if end < start {
        return Err("reply contains no JSON array".to_string());
    }

    let mut insights: Vec<Insight> =
        serde_json::from_str(&text[start..=end]).map_err(|e| format!("reply is not an insight array: {}", e))?;

    insights.retain(|i| !i.title.trim().is_empty());
    insights.truncate(MAX_INSIGHTS);
    Ok(insights)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(name: &str, merchant: Option<&str>, amount: f64, category: Option<&str>) -> Transaction {
        Transaction {
            id: name.to_string(),
            account_id: "acc_1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            name: name.to_string(),
            merchant_name: merchant.map(str::to_string),
            amount,
            iso_currency_code: Some("USD".to_string()),
            category: category.map(str::to_string),
            pending: false,
        }
    }

    #[test]
    fn prompt_aggregates_flows() {
        let txs = vec![
            tx("AWS", Some("Amazon Web Services"), 800.0, Some("Software")),
            tx("AWS 2", Some("Amazon Web Services"), 200.0, Some("Software")),
            tx("Stripe payout", None, -5000.0, None),
            tx("GUSTO PAYROLL", None, 3000.0, Some("Payroll")),
        ];
        let since = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let until = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
        let prompt = build_prompt(&txs, since, until);

        assert!(prompt.contains("Transactions: 4 (0 pending)"));
        assert!(prompt.contains("Total outflow: 4000.00"));
        assert!(prompt.contains("Total inflow: 5000.00"));
        assert!(prompt.contains("- GUSTO PAYROLL: 3000.00"));
        assert!(prompt.contains("- Amazon Web Services: 1000.00"));
        assert!(prompt.contains("- Software: 1000.00"));
        assert!(!prompt.contains("Stripe payout"));
    }

    #[test]
    fn parses_fenced_reply() {
        let reply = "Here you go:\n```json\n[{\"title\":\"Payroll up\",\"detail\":\"Payroll rose.\",\"severity\":\"warning\",\"category\":\"Payroll\"}]\n```";
        let insights = parse_insights(reply).unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].severity, Severity::Warning);
        assert_eq!(insights[0].category.as_deref(), Some("Payroll"));
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_insights("[]").unwrap().is_empty());
    }

    #[test]
    fn severity_aliases() {
        let reply = r#"[{"title":"t","detail":"d","severity":"high"}]"#;
        assert_eq!(parse_insights(reply).unwrap()[0].severity, Severity::Critical);
    }

    #[test]
    fn rejects_non_array_replies() {
        assert!(parse_insights("I could not find anything notable.").is_err());
        assert!(parse_insights("] nope [").is_err());
        assert!(parse_insights(r#"[{"title":"t"}]"#).is_err());
    }
}
