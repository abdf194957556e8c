//! Medicine inventory record.
//!
//! # Invariants
//! - Deletion is a soft delete: `is_active = false`.
//! - Low stock means `stock_quantity <= min_stock_level` on an active row.

use crate::model::lenient;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

const DEFAULT_MIN_STOCK_LEVEL: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub generic_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub price: f64,
    /// Accepts the snake_case spelling some backend builds emit.
    #[serde(default, alias = "cost_price", deserialize_with = "lenient::optional_f64")]
    pub cost_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    pub stock_quantity: u32,
    #[serde(
        default = "default_min_stock_level",
        deserialize_with = "min_stock_level_or_default"
    )]
    pub min_stock_level: u32,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default = "default_active", deserialize_with = "lenient::bool_or_true")]
    pub is_active: bool,
}

impl Medicine {
    pub fn new(name: impl Into<String>, price: f64, stock_quantity: u32) -> Self {
        Self {
            id: None,
            name: name.into(),
            generic_name: None,
            category: None,
            manufacturer: None,
            price,
            cost_price: None,
            stock_quantity,
            min_stock_level: DEFAULT_MIN_STOCK_LEVEL,
            expiry_date: None,
            batch_number: None,
            is_active: true,
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.is_active && self.stock_quantity <= self.min_stock_level
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.is_active && self.stock_quantity == 0
    }

    /// Signed days from `today` to expiry; negative once expired.
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expiry_date
            .map(|expiry| expiry.signed_duration_since(today).num_days())
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < today)
    }

    pub fn is_in_category(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|value| value.eq_ignore_ascii_case(category.trim()))
    }
}

fn default_min_stock_level() -> u32 {
    DEFAULT_MIN_STOCK_LEVEL
}

/// Create/update body; blank numbers go out as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineInput {
    pub name: String,
    pub generic_name: Option<String>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub batch_number: Option<String>,
    pub price: Option<f64>,
    pub cost_price: Option<f64>,
    pub stock_quantity: Option<u32>,
    pub min_stock_level: Option<u32>,
    pub expiry_date: Option<NaiveDate>,
}

impl MedicineInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("medicine name is required".to_string());
        }
        for (field, value) in [("price", self.price), ("cost price", self.cost_price)] {
            if value.is_some_and(|amount| !(amount.is_finite() && amount >= 0.0)) {
                return Err(format!("{field} cannot be negative"));
            }
        }
        Ok(())
    }
}

impl From<&Medicine> for MedicineInput {
    fn from(medicine: &Medicine) -> Self {
        Self {
            name: medicine.name.clone(),
            generic_name: medicine.generic_name.clone(),
            category: medicine.category.clone(),
            manufacturer: medicine.manufacturer.clone(),
            batch_number: medicine.batch_number.clone(),
            price: Some(medicine.price),
            cost_price: medicine.cost_price,
            stock_quantity: Some(medicine.stock_quantity),
            min_stock_level: Some(medicine.min_stock_level),
            expiry_date: medicine.expiry_date,
        }
    }
}

/// Accepts `yyyy-mm-dd` and the `dd-mm-yyyy` form users often type.
pub fn parse_expiry_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d-%m-%Y"))
        .map_err(|_| format!("invalid expiry date `{raw}`, expected yyyy-mm-dd"))
}

fn min_stock_level_or_default<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::optional_u32(deserializer)?.unwrap_or(DEFAULT_MIN_STOCK_LEVEL))
}

fn default_active() -> bool {
    true
}
