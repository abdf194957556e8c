//! Inventory views, sales reports and the billing counter.

use super::parse_sale_items;
use crate::app::App;
use crate::commands::{
    CustomerCommand, CustomerContactArgs, MedicineArgs, MedicineCommand, ReportCommand,
    SaleCommand, SellArgs,
};
use anyhow::{bail, Error, Result};
use chrono::NaiveDate;
use log::info;
use pharmadesk_core::access::permission::Permission;
use pharmadesk_core::access::route::Route;
use pharmadesk_core::model::customer::Customer;
use pharmadesk_core::model::medicine::{parse_expiry_date, Medicine, MedicineInput};
use pharmadesk_core::model::sale::PaymentMethod;
use pharmadesk_core::service::billing::{Cart, CustomerInput};
use pharmadesk_core::service::catalog::CatalogService;
use pharmadesk_core::service::inventory;
use pharmadesk_core::service::reports::{self, DateRange, Granularity};
use pharmadesk_core::{Clock, SystemClock};
use serde_json::json;

pub(crate) fn medicines(app: &App<'_>, command: MedicineCommand) -> Result<()> {
    let today = SystemClock.today();
    match command {
        MedicineCommand::List { search, category } => {
            app.require_route(Route::Medicines)?;
            let all = app.medicines()?;
            let mut rows: Vec<&Medicine> = match (search.as_deref(), category.as_deref()) {
                (Some(needle), _) => inventory::search_by_name(&all, needle),
                (None, Some(category)) => inventory::by_category(&all, category),
                (None, None) => inventory::active(&all),
            };
            if let (Some(_), Some(category)) = (search.as_deref(), category.as_deref()) {
                rows.retain(|medicine| medicine.is_in_category(category));
            }
            app.emit(json!({
                "categories": inventory::categories(&all),
                "medicines": rows,
            }))
        }
        MedicineCommand::LowStock => {
            app.require_route(Route::Medicines)?;
            let all = app.medicines()?;
            app.emit_value(&inventory::low_stock(&all))
        }
        MedicineCommand::OutOfStock => {
            app.require_route(Route::OutOfStock)?;
            let all = app.medicines()?;
            app.emit_value(&inventory::out_of_stock(&all))
        }
        MedicineCommand::NearExpiry { days } => {
            app.require_route(Route::NearExpiry)?;
            let days = days.unwrap_or(app.config.near_expiry_days);
            let all = app.medicines()?;
            app.emit(json!({
                "days": days,
                "alerts": inventory::near_expiry(&all, days, today),
            }))
        }
        MedicineCommand::Expired => {
            app.require_route(Route::ExpiredHistory)?;
            let all = app.medicines()?;
            app.emit_value(&inventory::expired(&all, today))
        }
        MedicineCommand::Add(fields) => {
            app.require_route(Route::Medicines)?;
            app.require_permission(Permission::ManageMedicines)?;
            let mut input = MedicineInput::default();
            fields.apply_to(&mut input)?;
            let created = app.service_call(CatalogService::new(app.backend).add_medicine(&input))?;
            app.emit_value(&created)
        }
        MedicineCommand::Update { id, fields } => {
            app.require_route(Route::Medicines)?;
            app.require_permission(Permission::ManageMedicines)?;
            let expiry = fields.expiry.as_deref().map(parse_expiry_date).transpose();
            let expiry = expiry.map_err(Error::msg)?;
            let updated = app.service_call(CatalogService::new(app.backend).update_medicine(
                id,
                |input| {
                    fields.merge_into(input);
                    if expiry.is_some() {
                        input.expiry_date = expiry;
                    }
                },
            ))?;
            app.emit_value(&updated)
        }
        MedicineCommand::Delete { id } => {
            app.require_route(Route::Medicines)?;
            app.require_permission(Permission::DeleteMedicine)?;
            app.service_call(CatalogService::new(app.backend).delete_medicine(id))?;
            app.emit(json!({ "deleted": id }))
        }
    }
}

impl MedicineArgs {
    /// Copies the form into a fresh input; the name is required here.
    fn apply_to(&self, input: &mut MedicineInput) -> Result<()> {
        if self.name.as_deref().map_or(true, |name| name.trim().is_empty()) {
            bail!("--name is required");
        }
        self.merge_into(input);
        input.expiry_date = self
            .expiry
            .as_deref()
            .map(parse_expiry_date)
            .transpose()
            .map_err(Error::msg)?;
        Ok(())
    }

    /// Overwrites only the fields that were passed; expiry is handled by the caller.
    fn merge_into(&self, input: &mut MedicineInput) {
        if let Some(name) = &self.name {
            input.name = name.trim().to_string();
        }
        merge_text(&mut input.generic_name, &self.generic_name);
        merge_text(&mut input.category, &self.category);
        merge_text(&mut input.manufacturer, &self.manufacturer);
        merge_text(&mut input.batch_number, &self.batch);
        input.price = self.price.or(input.price);
        input.cost_price = self.cost_price.or(input.cost_price);
        input.stock_quantity = self.stock.or(input.stock_quantity);
        input.min_stock_level = self.min_stock.or(input.min_stock_level);
    }
}

impl CustomerContactArgs {
    fn merge_into(&self, customer: &mut Customer) {
        merge_text(&mut customer.phone, &self.phone);
        merge_text(&mut customer.email, &self.email);
        merge_text(&mut customer.address, &self.address);
    }
}

/// An empty value clears the field.
fn merge_text(target: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value {
        let value = value.trim();
        *target = (!value.is_empty()).then(|| value.to_string());
    }
}

pub(crate) fn customers(app: &App<'_>, command: CustomerCommand) -> Result<()> {
    match command {
        CustomerCommand::List { search } => {
            app.require_route(Route::Customers)?;
            let all = app.backend_call(app.backend.list_customers())?;
            let rows: Vec<_> = match search.as_deref() {
                Some(needle) => all
                    .iter()
                    .filter(|customer| customer.matches_name(needle))
                    .collect(),
                None => all.iter().collect(),
            };
            app.emit_value(&rows)
        }
        CustomerCommand::Add { name, contact } => {
            app.require_route(Route::Customers)?;
            app.require_permission(Permission::ManageCustomers)?;
            let mut customer = Customer {
                name: name.trim().to_string(),
                ..Customer::default()
            };
            contact.merge_into(&mut customer);
            let created =
                app.service_call(CatalogService::new(app.backend).add_customer(&customer))?;
            app.emit_value(&created)
        }
        CustomerCommand::Update { id, name, contact } => {
            app.require_route(Route::Customers)?;
            app.require_permission(Permission::ManageCustomers)?;
            let updated = app.service_call(CatalogService::new(app.backend).update_customer(
                id,
                |customer| {
                    if let Some(name) = name {
                        customer.name = name.trim().to_string();
                    }
                    contact.merge_into(customer);
                },
            ))?;
            app.emit_value(&updated)
        }
        CustomerCommand::Delete { id } => {
            app.require_route(Route::Customers)?;
            app.require_permission(Permission::ManageCustomers)?;
            app.service_call(CatalogService::new(app.backend).delete_customer(id))?;
            app.emit(json!({ "deleted": id }))
        }
    }
}

pub(crate) fn sales(app: &App<'_>, command: SaleCommand) -> Result<()> {
    match command {
        SaleCommand::List { from, to, search } => {
            app.require_route(Route::Transactions)?;
            let range = match (from, to) {
                (None, None) => None,
                (from, to) => Some(checked_range(
                    from.unwrap_or(NaiveDate::MIN),
                    to.unwrap_or(NaiveDate::MAX),
                )?),
            };
            let all = app.sales()?;
            let rows = reports::search_sales(&all, range, search.as_deref().unwrap_or_default());
            app.emit(json!({
                "count": rows.len(),
                "totalAmount": reports::total_amount(rows.iter().copied()),
                "sales": rows,
            }))
        }
        SaleCommand::Show { id } => {
            app.require_route(Route::Transactions)?;
            let sale = app.service_call(CatalogService::new(app.backend).get_sale(id))?;
            app.emit_value(&sale)
        }
        SaleCommand::Delete { id } => {
            app.require_route(Route::Transactions)?;
            app.require_permission(Permission::DeleteSale)?;
            app.service_call(CatalogService::new(app.backend).delete_sale(id))?;
            app.emit(json!({ "deleted": id }))
        }
    }
}

fn checked_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange> {
    if start > end {
        bail!("--from must not be after --to");
    }
    Ok(DateRange::new(start, end))
}

pub(crate) fn reports(app: &App<'_>, command: ReportCommand) -> Result<()> {
    let today = SystemClock.today();
    match command {
        ReportCommand::Dashboard => {
            app.require_route(Route::Dashboard)?;
            let medicines = app.medicines()?;
            let sales = app.sales()?;
            app.emit_value(&reports::dashboard_stats(&medicines, &sales, today))
        }
        ReportCommand::Summary { from, to } => {
            app.require_route(Route::Reports)?;
            app.require_permission(Permission::ViewReports)?;
            let default_range = DateRange::month_to_date(today);
            let range = checked_range(
                from.unwrap_or(default_range.start),
                to.unwrap_or(default_range.end),
            )?;
            let sales = app.sales()?;
            app.emit(json!({
                "range": range,
                "stats": reports::sales_stats(&sales, range),
                "monthly": reports::monthly_summary(&sales),
            }))
        }
        ReportCommand::Top { limit } => {
            app.require_route(Route::TopMedicines)?;
            let sales = app.sales()?;
            app.emit_value(&reports::top_medicines(&sales, limit))
        }
        ReportCommand::Profit {
            from,
            to,
            granularity,
        } => {
            app.require_route(Route::ProfitAnalysis)?;
            app.require_permission(Permission::ViewProfit)?;
            let granularity: Granularity = granularity.parse().map_err(Error::msg)?;
            let default_range = DateRange::month_to_date(today);
            let range = checked_range(
                from.unwrap_or(default_range.start),
                to.unwrap_or(default_range.end),
            )?;
            let medicines = app.medicines()?;
            let sales = app.sales()?;
            app.emit(json!({
                "range": range,
                "summary": reports::profit_summary(&sales, &medicines, range),
                "series": reports::profit_series(&sales, &medicines, range, granularity),
                "medicines": reports::medicine_profit(&sales, &medicines, range),
            }))
        }
    }
}

pub(crate) fn sell(app: &App<'_>, args: SellArgs) -> Result<()> {
    app.require_route(Route::Billing)?;
    app.require_permission(Permission::CreateSale)?;
    let payment: PaymentMethod = args.payment.parse().map_err(Error::msg)?;
    let medicines = app.medicines()?;

    let mut cart = Cart::new();
    for (id, quantity) in parse_sale_items(&args.items)? {
        let Some(medicine) = medicines.iter().find(|medicine| medicine.id == Some(id)) else {
            bail!("medicine {id} not found");
        };
        cart.add(medicine)?;
        cart.set_quantity(id, i64::from(quantity))?;
    }
    cart.validate_stock(&medicines)?;
    let total = cart.total();

    let customer = CustomerInput {
        name: args.customer_name,
        phone: args.customer_phone,
        email: args.customer_email,
    };
    let request = cart.into_request(&customer, payment)?;
    let sale = app.backend_call(app.backend.create_sale(&request))?;
    info!(
        "event=sale_create module=cli status=ok items={} payment={}",
        request.items.len(),
        payment.as_str()
    );
    app.emit(json!({
        "cartTotal": total,
        "sale": sale,
    }))
}
