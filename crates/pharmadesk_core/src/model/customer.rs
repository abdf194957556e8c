//! Pharmacy customer record.

use crate::model::user::is_valid_email;
use serde::{Deserialize, Serialize};

/// Name used when a sale is recorded without customer details.
pub const WALK_IN_CUSTOMER_NAME: &str = "Walk-in Customer";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Customer {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("customer name is required".to_string());
        }
        if let Some(email) = self.email.as_deref().filter(|email| !email.trim().is_empty()) {
            if !is_valid_email(email) {
                return Err(format!("invalid email address `{email}`"));
            }
        }
        Ok(())
    }

    pub fn matches_name(&self, needle: &str) -> bool {
        self.name
            .to_lowercase()
            .contains(needle.trim().to_lowercase().as_str())
    }
}
