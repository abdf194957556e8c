//! Inventory views over the medicine list returned by the backend.
//!
//! All functions are pure and keep the input order unless stated.

use crate::model::medicine::Medicine;
use chrono::NaiveDate;
use serde::Serialize;

/// Near-expiry window used by the inventory alert page.
pub const DEFAULT_NEAR_EXPIRY_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryAlert<'a> {
    pub medicine: &'a Medicine,
    pub days_left: i64,
}

pub fn active(medicines: &[Medicine]) -> Vec<&Medicine> {
    medicines.iter().filter(|medicine| medicine.is_active).collect()
}

pub fn low_stock(medicines: &[Medicine]) -> Vec<&Medicine> {
    medicines
        .iter()
        .filter(|medicine| medicine.is_low_stock())
        .collect()
}

pub fn out_of_stock(medicines: &[Medicine]) -> Vec<&Medicine> {
    medicines
        .iter()
        .filter(|medicine| medicine.is_out_of_stock())
        .collect()
}

/// Active medicines expiring within `[today, today + days]`, soonest first.
/// Medicines without an expiry date never appear.
pub fn near_expiry(medicines: &[Medicine], days: u32, today: NaiveDate) -> Vec<ExpiryAlert<'_>> {
    let mut alerts: Vec<ExpiryAlert<'_>> = medicines
        .iter()
        .filter(|medicine| medicine.is_active)
        .filter_map(|medicine| {
            let days_left = medicine.days_until_expiry(today)?;
            (0..=i64::from(days)).contains(&days_left).then_some(ExpiryAlert {
                medicine,
                days_left,
            })
        })
        .collect();
    alerts.sort_by(|a, b| {
        a.days_left
            .cmp(&b.days_left)
            .then_with(|| a.medicine.name.cmp(&b.medicine.name))
    });
    alerts
}

/// Expired medicines, most recently expired first.
pub fn expired(medicines: &[Medicine], today: NaiveDate) -> Vec<&Medicine> {
    let mut expired: Vec<&Medicine> = medicines
        .iter()
        .filter(|medicine| medicine.is_expired(today))
        .collect();
    expired.sort_by(|a, b| b.expiry_date.cmp(&a.expiry_date));
    expired
}

/// Case-insensitive substring match on brand or generic name.
pub fn search_by_name<'a>(medicines: &'a [Medicine], needle: &str) -> Vec<&'a Medicine> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return medicines.iter().collect();
    }
    medicines
        .iter()
        .filter(|medicine| {
            medicine.name.to_lowercase().contains(&needle)
                || medicine
                    .generic_name
                    .as_deref()
                    .is_some_and(|generic| generic.to_lowercase().contains(&needle))
        })
        .collect()
}

pub fn by_category<'a>(medicines: &'a [Medicine], category: &str) -> Vec<&'a Medicine> {
    medicines
        .iter()
        .filter(|medicine| medicine.is_active && medicine.is_in_category(category))
        .collect()
}

/// Distinct categories of active medicines, sorted.
pub fn categories(medicines: &[Medicine]) -> Vec<String> {
    let mut categories: Vec<String> = medicines
        .iter()
        .filter(|medicine| medicine.is_active)
        .filter_map(|medicine| medicine.category.clone())
        .collect();
    categories.sort();
    categories.dedup();
    categories
}
