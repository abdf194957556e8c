//! Sales (customer bills) as returned by the backend.

use crate::model::customer::Customer;
use crate::model::lenient;
use crate::model::medicine::Medicine;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Card => "CARD",
            Self::Upi => "UPI",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(Self::Cash),
            "CARD" => Ok(Self::Card),
            "UPI" => Ok(Self::Upi),
            other => Err(format!("unsupported payment method `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub medicine: Option<Medicine>,
    #[serde(default)]
    pub medicine_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub unit_price: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub subtotal: f64,
}

impl SaleItem {
    /// Medicine id from the nested record, else the flat `medicineId`.
    pub fn medicine_ref(&self) -> Option<i64> {
        self.medicine
            .as_ref()
            .and_then(|medicine| medicine.id)
            .or(self.medicine_id)
    }

    pub fn medicine_name(&self) -> Option<&str> {
        self.medicine.as_ref().map(|medicine| medicine.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(default)]
    pub id: Option<i64>,
    pub sale_date: NaiveDateTime,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub total_amount: f64,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub bill_number: Option<String>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub items: Vec<SaleItem>,
}

impl Sale {
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(|item| item.subtotal).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemRequest {
    pub medicine_id: i64,
    pub quantity: u32,
}

/// Billing page submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub payment_method: PaymentMethod,
    pub items: Vec<SaleItemRequest>,
}
