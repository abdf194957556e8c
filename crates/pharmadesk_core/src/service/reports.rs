//! Sales reports computed client-side from backend sales and medicines.
//!
//! # Invariants
//! - Cost is `cost_price * quantity` per sold item; unknown cost counts as 0.
//! - Margin is `profit / revenue * 100`, and 0 when there is no revenue.
//! - Date ranges are inclusive on both ends and compare the sale's date.

use crate::model::medicine::Medicine;
use crate::model::sale::{Sale, SaleItem};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

pub const DEFAULT_TOP_MEDICINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// From the first of `today`'s month through `today`.
    pub fn month_to_date(today: NaiveDate) -> Self {
        Self {
            start: today.with_day(1).unwrap_or(today),
            end: today,
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Month,
    Year,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(format!("unsupported granularity `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProfitSummary {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineProfit {
    pub medicine_id: i64,
    pub name: String,
    pub quantity: u64,
    pub revenue: f64,
    pub cost: f64,
}

impl MedicineProfit {
    pub fn profit(&self) -> f64 {
        self.revenue - self.cost
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopMedicine {
    pub medicine_id: i64,
    pub name: Option<String>,
    pub total_quantity: u64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_medicines: usize,
    pub low_stock_count: usize,
    pub today_sales_count: usize,
    pub today_revenue: f64,
    pub total_revenue: f64,
}

/// Totals over a set of sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesStats {
    pub total_sales: usize,
    pub total_items: u64,
    pub total_revenue: f64,
    pub average_sale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub total_revenue: f64,
    pub total_items: u64,
    pub total_sales: usize,
}

/// Sales whose date falls on `day`.
pub fn sales_on(sales: &[Sale], day: NaiveDate) -> Vec<&Sale> {
    sales
        .iter()
        .filter(|sale| sale.sale_date.date() == day)
        .collect()
}

pub fn total_amount<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> f64 {
    sales.into_iter().map(|sale| sale.total_amount).sum()
}

pub fn in_range(sales: &[Sale], range: DateRange) -> Vec<&Sale> {
    sales
        .iter()
        .filter(|sale| range.contains(sale.sale_date.date()))
        .collect()
}

pub fn sales_stats(sales: &[Sale], range: DateRange) -> SalesStats {
    let selected = in_range(sales, range);
    let total_revenue = total_amount(selected.iter().copied());
    SalesStats {
        total_sales: selected.len(),
        total_items: selected.iter().map(|sale| item_count(sale)).sum(),
        total_revenue,
        average_sale: if selected.is_empty() {
            0.0
        } else {
            total_revenue / selected.len() as f64
        },
    }
}

/// One row per calendar month that has sales, oldest first.
pub fn monthly_summary(sales: &[Sale]) -> Vec<MonthlySummary> {
    let mut months: BTreeMap<(i32, u32), MonthlySummary> = BTreeMap::new();
    for sale in sales {
        let day = sale.sale_date.date();
        let row = months
            .entry((day.year(), day.month()))
            .or_insert_with(|| MonthlySummary {
                year: day.year(),
                month: day.month(),
                total_revenue: 0.0,
                total_items: 0,
                total_sales: 0,
            });
        row.total_revenue += sale.total_amount;
        row.total_items += item_count(sale);
        row.total_sales += 1;
    }
    months.into_values().collect()
}

/// Transaction list: optional date range, then a case-insensitive match on
/// bill number, customer name or payment method. Newest first.
pub fn search_sales<'a>(sales: &'a [Sale], range: Option<DateRange>, query: &str) -> Vec<&'a Sale> {
    let needle = query.trim().to_lowercase();
    let mut found: Vec<&Sale> = sales
        .iter()
        .filter(|sale| range.map_or(true, |range| range.contains(sale.sale_date.date())))
        .filter(|sale| {
            needle.is_empty()
                || sale
                    .bill_number
                    .as_deref()
                    .is_some_and(|bill| bill.to_lowercase().contains(&needle))
                || sale
                    .customer
                    .as_ref()
                    .is_some_and(|customer| customer.name.to_lowercase().contains(&needle))
                || sale.payment_method.as_str().to_lowercase().contains(&needle)
        })
        .collect();
    found.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));
    found
}

fn item_count(sale: &Sale) -> u64 {
    sale.items.iter().map(|item| u64::from(item.quantity)).sum()
}

pub fn profit_summary(sales: &[Sale], medicines: &[Medicine], range: DateRange) -> ProfitSummary {
    let lookup = CostLookup::new(medicines);
    let selected = in_range(sales, range);
    let revenue = total_amount(selected.iter().copied());
    let cost: f64 = selected.iter().map(|sale| lookup.sale_cost(sale)).sum();
    let profit = revenue - cost;
    ProfitSummary {
        revenue,
        cost,
        profit,
        margin: if revenue > 0.0 {
            profit / revenue * 100.0
        } else {
            0.0
        },
    }
}

/// Profit per period, ascending by period label.
pub fn profit_series(
    sales: &[Sale],
    medicines: &[Medicine],
    range: DateRange,
    granularity: Granularity,
) -> Vec<SeriesPoint> {
    let lookup = CostLookup::new(medicines);
    let mut groups: BTreeMap<String, f64> = BTreeMap::new();
    for sale in in_range(sales, range) {
        let day = sale.sale_date.date();
        let label = match granularity {
            Granularity::Day => day.format("%Y-%m-%d").to_string(),
            Granularity::Month => day.format("%Y-%m").to_string(),
            Granularity::Year => day.year().to_string(),
        };
        *groups.entry(label).or_insert(0.0) += sale.total_amount - lookup.sale_cost(sale);
    }
    groups
        .into_iter()
        .map(|(label, value)| SeriesPoint { label, value })
        .collect()
}

/// Per-medicine breakdown, highest profit first.
pub fn medicine_profit(
    sales: &[Sale],
    medicines: &[Medicine],
    range: DateRange,
) -> Vec<MedicineProfit> {
    let lookup = CostLookup::new(medicines);
    let mut rows: HashMap<i64, MedicineProfit> = HashMap::new();
    for sale in in_range(sales, range) {
        for item in &sale.items {
            let Some(medicine) = lookup.medicine_for(item) else {
                continue;
            };
            let Some(id) = medicine.id else {
                continue;
            };
            let quantity = u64::from(item.quantity);
            let revenue = if item.subtotal > 0.0 {
                item.subtotal
            } else {
                f64::from(item.quantity) * non_zero(item.unit_price).unwrap_or(medicine.price)
            };
            let row = rows.entry(id).or_insert_with(|| MedicineProfit {
                medicine_id: id,
                name: medicine.name.clone(),
                quantity: 0,
                revenue: 0.0,
                cost: 0.0,
            });
            row.quantity += quantity;
            row.revenue += revenue;
            row.cost += medicine.cost_price.unwrap_or(0.0) * f64::from(item.quantity);
        }
    }
    let mut rows: Vec<MedicineProfit> = rows.into_values().collect();
    rows.sort_by(|a, b| {
        b.profit()
            .total_cmp(&a.profit())
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

/// Best sellers by revenue, then quantity.
pub fn top_medicines(sales: &[Sale], limit: usize) -> Vec<TopMedicine> {
    let mut totals: HashMap<i64, TopMedicine> = HashMap::new();
    for item in sales.iter().flat_map(|sale| sale.items.iter()) {
        let Some(id) = item.medicine_ref() else {
            continue;
        };
        let entry = totals.entry(id).or_insert_with(|| TopMedicine {
            medicine_id: id,
            name: None,
            total_quantity: 0,
            total_revenue: 0.0,
        });
        if entry.name.is_none() {
            entry.name = item.medicine_name().map(str::to_string);
        }
        entry.total_quantity += u64::from(item.quantity);
        entry.total_revenue += item.subtotal;
    }
    let mut ranked: Vec<TopMedicine> = totals.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total_revenue
            .total_cmp(&a.total_revenue)
            .then_with(|| b.total_quantity.cmp(&a.total_quantity))
            .then_with(|| a.medicine_id.cmp(&b.medicine_id))
    });
    ranked.truncate(limit);
    ranked
}

pub fn dashboard_stats(medicines: &[Medicine], sales: &[Sale], today: NaiveDate) -> DashboardStats {
    let todays = sales_on(sales, today);
    DashboardStats {
        total_medicines: medicines.iter().filter(|medicine| medicine.is_active).count(),
        low_stock_count: medicines
            .iter()
            .filter(|medicine| medicine.is_low_stock())
            .count(),
        today_sales_count: todays.len(),
        today_revenue: total_amount(todays.iter().copied()),
        total_revenue: total_amount(sales),
    }
}

/// Resolves an item's medicine: nested record first, then the list by id.
struct CostLookup<'a> {
    by_id: HashMap<i64, &'a Medicine>,
}

impl<'a> CostLookup<'a> {
    fn new(medicines: &'a [Medicine]) -> Self {
        Self {
            by_id: medicines
                .iter()
                .filter_map(|medicine| medicine.id.map(|id| (id, medicine)))
                .collect(),
        }
    }

    fn medicine_for<'s>(&'s self, item: &'s SaleItem) -> Option<&'s Medicine>
    where
        'a: 's,
    {
        item.medicine.as_ref().or_else(|| {
            item.medicine_id
                .and_then(|id| self.by_id.get(&id).copied())
        })
    }

    fn sale_cost(&self, sale: &Sale) -> f64 {
        sale.items
            .iter()
            .map(|item| {
                let cost_price = self
                    .medicine_for(item)
                    .and_then(|medicine| medicine.cost_price)
                    .unwrap_or(0.0);
                cost_price * f64::from(item.quantity)
            })
            .sum()
    }
}

fn non_zero(value: f64) -> Option<f64> {
    (value != 0.0).then_some(value)
}
