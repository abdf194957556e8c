//! Supplier profile kept locally when the supplier endpoints are missing.

use crate::model::purchase::ExtraFields;
use crate::model::user::{deserialize_lenient_role, ProfileUpdate, Role, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_role",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl SupplierProfile {
    /// Placeholder written the first time an offline supplier opens the portal.
    pub fn placeholder() -> Self {
        Self {
            id: Some(UserId::Text("supplier-1".to_string())),
            name: Some("Supplier User".to_string()),
            email: Some("supplier@example.com".to_string()),
            role: Some(Role::Supplier),
            ..Self::default()
        }
    }

    pub fn is_supplier(&self) -> bool {
        self.role == Some(Role::Supplier)
    }

    pub fn apply(&mut self, update: &SupplierProfileUpdate) {
        self.apply_contact(&update.contact);
        if let Some(company) = &update.company {
            self.company = Some(company.clone());
        }
        if let Some(gst) = &update.gst {
            self.gst = Some(gst.clone());
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
        }
    }

    pub fn apply_contact(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = Some(name.clone());
        }
        if let Some(email) = &update.email {
            self.email = Some(email.clone());
        }
        if let Some(phone) = &update.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(address) = &update.address {
            self.address = Some(address.clone());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierProfileUpdate {
    #[serde(flatten)]
    pub contact: ProfileUpdate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
