//! Purchase orders, deliveries and supplier bills kept in the fallback store.
//!
//! # Invariants
//! - Status enums serialize as upper-case strings (`PENDING`, `PAID`, ...).
//! - Unknown stored fields survive a load/save cycle through `extra`.
//! - Card details are never part of a stored payment record.

use crate::model::lenient;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Unmodelled fields preserved from stored JSON.
pub type ExtraFields = BTreeMap<String, Value>;

macro_rules! upper_case_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!(
                        concat!("unsupported ", stringify!($name), " `{}`"),
                        other
                    )),
                }
            }
        }
    };
}

upper_case_enum!(OrderStatus {
    Pending => "PENDING",
    Accepted => "ACCEPTED",
    Rejected => "REJECTED",
    Paid => "PAID",
    Shipped => "SHIPPED",
    Delivered => "DELIVERED",
});

upper_case_enum!(DeliveryStage {
    Created => "CREATED",
    Confirmed => "CONFIRMED",
    Paid => "PAID",
    Delivered => "DELIVERED",
});

upper_case_enum!(PaymentStatus {
    Pending => "PENDING",
    Paid => "PAID",
});

upper_case_enum!(DeliveryStatus {
    Pending => "PENDING",
    Shipped => "SHIPPED",
    Delivered => "DELIVERED",
});

upper_case_enum!(BillStatus {
    Pending => "PENDING",
    Paid => "PAID",
    Overdue => "OVERDUE",
    Cancelled => "CANCELLED",
});

upper_case_enum!(SupplierResponse {
    Accepted => "ACCEPTED",
    Rejected => "REJECTED",
});

impl OrderStatus {
    /// Orders still moving through the pipeline.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Delivered | Self::Rejected)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medicine_id: Option<i64>,
    /// Hub-created orders store the name as `medicineName`.
    #[serde(alias = "medicineName")]
    pub name: String,
    #[serde(deserialize_with = "lenient::u32_or_zero")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub price: f64,
}

impl OrderItem {
    pub fn new(name: impl Into<String>, quantity: u32, price: f64) -> Self {
        Self {
            medicine_id: None,
            name: name.into(),
            quantity,
            price,
        }
    }

    pub fn line_total(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub order_id: String,
    /// Form input keeps the amount as typed, so strings are accepted.
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub amount: f64,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

fn default_payment_method() -> String {
    "card".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_response: Option<SupplierResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "paymentData", skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub total: f64,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Order form input; id, status and total are filled in when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub total: Option<f64>,
}

impl OrderDraft {
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub stage: DeliveryStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_f64"
    )]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_status: Option<DeliveryStatus>,
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub stage: Option<DeliveryStage>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierBill {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub status: BillStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<BillStatus>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}
