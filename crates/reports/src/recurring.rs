// Recurring-transaction detection
//
// Groups transactions by normalized merchant, then classifies each group by
// the mean spacing between charges. Irregular spacing and varying amounts
// lower the confidence score.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const INTERVAL_WEIGHT: f64 = 0.6;
const AMOUNT_WEIGHT: f64 = 0.25;
const SUPPORT_WEIGHT: f64 = 0.15;

/// Occurrences at which the support component saturates.
const FULL_SUPPORT_OCCURRENCES: usize = 6;

/// Descriptor tokens that processors prepend to merchant names.
const NOISE_TOKENS: &[&str] = &["pos", "debit", "credit", "ach", "card", "purchase", "recurring", "autopay"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    /// Positive for outflows, negative for inflows.
    pub amount: f64,
    pub name: String,
    pub merchant_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    pub fn from_mean_interval(days: f64) -> Option<Self> {
        match days {
            d if (5.0..=9.0).contains(&d) => Some(Frequency::Weekly),
            d if (12.0..=16.0).contains(&d) => Some(Frequency::Biweekly),
            d if (26.0..=35.0).contains(&d) => Some(Frequency::Monthly),
            d if (85.0..=97.0).contains(&d) => Some(Frequency::Quarterly),
            d if (350.0..=380.0).contains(&d) => Some(Frequency::Annual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringSeries {
    pub merchant: String,
    pub frequency: Frequency,
    pub occurrences: usize,
    pub average_amount: f64,
    pub last_date: NaiveDate,
    pub next_expected_date: NaiveDate,
    pub mean_interval_days: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub min_occurrences: usize,
    pub min_confidence: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_occurrences: 3,
            min_confidence: 0.5,
        }
    }
}

/// Grouping key for a transaction, or `None` when nothing usable remains
/// after normalization.
pub fn merchant_key(tx: &TransactionRecord) -> Option<String> {
    let raw = tx
        .merchant_name
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(&tx.name);

    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphabetic() { c } else { ' ' })
        .collect();

    let key = cleaned
        .split_whitespace()
        .filter(|t| !NOISE_TOKENS.contains(t))
        .collect::<Vec<_>>()
        .join(" ");

    (!key.is_empty()).then_some(key)
}

pub fn detect_recurring(transactions: &[TransactionRecord], config: &DetectorConfig) -> Vec<RecurringSeries> {
    let mut groups: BTreeMap<String, Vec<&TransactionRecord>> = BTreeMap::new();
    for tx in transactions {
        if let Some(key) = merchant_key(tx) {
            groups.entry(key).or_default().push(tx);
        }
    }

    let min_occurrences = config.min_occurrences.max(2);
    let mut series: Vec<RecurringSeries> = groups
        .into_values()
        .filter_map(|mut group| {
            group.sort_by_key(|tx| tx.date);
            // Same-day charges (split tenders, retries) count once.
            group.dedup_by_key(|tx| tx.date);
            if group.len() < min_occurrences {
                return None;
            }
            analyze_group(&group)
        })
        .filter(|s| s.confidence >= config.min_confidence)
        .collect();

    series.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.merchant.cmp(&b.merchant))
    });
    series
}

fn analyze_group(group: &[&TransactionRecord]) -> Option<RecurringSeries> {
    let intervals: Vec<f64> = group
        .windows(2)
        .map(|w| (w[1].date - w[0].date).num_days() as f64)
        .collect();

    let (mean_interval, interval_sd) = mean_and_sd(&intervals)?;
    let frequency = Frequency::from_mean_interval(mean_interval)?;

    let amounts: Vec<f64> = group.iter().map(|tx| tx.amount.abs()).collect();
    let (mean_amount, amount_sd) = mean_and_sd(&amounts)?;

    let interval_score = regularity(mean_interval, interval_sd);
    let amount_score = regularity(mean_amount, amount_sd);
    let support_score = ((group.len() - 2) as f64 / (FULL_SUPPORT_OCCURRENCES - 2) as f64).min(1.0);

    let confidence =
        INTERVAL_WEIGHT * interval_score + AMOUNT_WEIGHT * amount_score + SUPPORT_WEIGHT * support_score;

    let last = group.last()?;
    let merchant = last
        .merchant_name
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| last.name.clone());

    Some(RecurringSeries {
        merchant,
        frequency,
        occurrences: group.len(),
        average_amount: round_to(mean_amount, 2),
        last_date: last.date,
        next_expected_date: last.date + Duration::days(mean_interval.round() as i64),
        mean_interval_days: round_to(mean_interval, 1),
        confidence: round_to(confidence, 3),
    })
}

fn mean_and_sd(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

/// 1 for perfectly even values, falling to 0 as the coefficient of
/// variation reaches 1.
fn regularity(mean: f64, sd: f64) -> f64 {
    if mean <= f64::EPSILON {
        return 0.0;
    }
    (1.0 - sd / mean).clamp(0.0, 1.0)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
