//! Billing-page cart, checked against the stock the page last loaded.
//!
//! # Invariants
//! - A line's quantity never exceeds the medicine's known stock.
//! - A quantity of zero or less removes the line.
//! - Checkout requires at least one line and a 10-digit customer phone.

use crate::model::customer::WALK_IN_CUSTOMER_NAME;
use crate::model::medicine::Medicine;
use crate::model::sale::{PaymentMethod, SaleItemRequest, SaleRequest};
use crate::service::{ServiceError, ServiceResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").expect("valid phone regex"));

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone.trim())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub medicine: Medicine,
    pub quantity: u32,
    pub unit_price: f64,
}

impl CartLine {
    pub fn subtotal(&self) -> f64 {
        f64::from(self.quantity) * self.unit_price
    }
}

/// Customer details typed into the billing form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerInput {
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds one unit, or increments an existing line.
    pub fn add(&mut self, medicine: &Medicine) -> ServiceResult<()> {
        let id = medicine_id(medicine)?;
        if let Some(line) = self.line_mut(id) {
            if line.quantity >= medicine.stock_quantity {
                return Err(only_available(medicine));
            }
            line.quantity += 1;
            return Ok(());
        }
        if medicine.stock_quantity < 1 {
            return Err(ServiceError::Validation(format!(
                "{} is out of stock",
                medicine.name
            )));
        }
        self.lines.push(CartLine {
            medicine: medicine.clone(),
            quantity: 1,
            unit_price: medicine.price,
        });
        Ok(())
    }

    pub fn set_quantity(&mut self, medicine_id: i64, quantity: i64) -> ServiceResult<()> {
        if quantity <= 0 {
            self.remove(medicine_id);
            return Ok(());
        }
        let line = self.line_mut(medicine_id).ok_or_else(|| ServiceError::NotFound {
            kind: "cart line",
            id: medicine_id.to_string(),
        })?;
        if quantity > i64::from(line.medicine.stock_quantity) {
            return Err(only_available(&line.medicine));
        }
        line.quantity = u32::try_from(quantity).map_err(|_| only_available(&line.medicine))?;
        Ok(())
    }

    pub fn remove(&mut self, medicine_id: i64) {
        self.lines
            .retain(|line| line.medicine.id != Some(medicine_id));
    }

    pub fn total(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Re-checks every line against a fresh medicine list.
    pub fn validate_stock(&self, medicines: &[Medicine]) -> ServiceResult<()> {
        for line in &self.lines {
            let current = medicines
                .iter()
                .find(|medicine| medicine.id.is_some() && medicine.id == line.medicine.id)
                .ok_or_else(|| ServiceError::NotFound {
                    kind: "medicine",
                    id: line.medicine.name.clone(),
                })?;
            if current.stock_quantity < line.quantity {
                return Err(ServiceError::Validation(format!(
                    "Insufficient stock for: {}. Available: {}",
                    current.name, current.stock_quantity
                )));
            }
        }
        Ok(())
    }

    /// Builds the sale request; a blank name becomes the walk-in customer.
    pub fn into_request(
        self,
        customer: &CustomerInput,
        payment_method: PaymentMethod,
    ) -> ServiceResult<SaleRequest> {
        if self.lines.is_empty() {
            return Err(ServiceError::Validation(
                "Please add items to the cart".to_string(),
            ));
        }
        if !is_valid_phone(&customer.phone) {
            return Err(ServiceError::Validation(
                "customer phone must be 10 digits".to_string(),
            ));
        }
        let name = customer
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(WALK_IN_CUSTOMER_NAME);

        let items = self
            .lines
            .iter()
            .map(|line| {
                Ok(SaleItemRequest {
                    medicine_id: medicine_id(&line.medicine)?,
                    quantity: line.quantity,
                })
            })
            .collect::<ServiceResult<Vec<_>>>()?;

        Ok(SaleRequest {
            customer_id: None,
            customer_name: Some(name.to_string()),
            customer_phone: Some(customer.phone.trim().to_string()),
            customer_email: customer.email.clone().filter(|email| !email.trim().is_empty()),
            payment_method,
            items,
        })
    }

    fn line_mut(&mut self, medicine_id: i64) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.medicine.id == Some(medicine_id))
    }
}

fn medicine_id(medicine: &Medicine) -> ServiceResult<i64> {
    medicine.id.ok_or_else(|| {
        ServiceError::Validation(format!("{} has no id and cannot be sold", medicine.name))
    })
}

fn only_available(medicine: &Medicine) -> ServiceError {
    ServiceError::Validation(format!(
        "Only {} items available in stock",
        medicine.stock_quantity
    ))
}

#[cfg(test)]
mod tests {
    use super::{is_valid_phone, Cart, CustomerInput};
    use crate::model::medicine::Medicine;
    use crate::model::sale::PaymentMethod;

    fn stocked(id: i64, name: &str, price: f64, stock: u32) -> Medicine {
        let mut medicine = Medicine::new(name, price, stock);
        medicine.id = Some(id);
        medicine
    }

    #[test]
    fn add_increments_until_stock_runs_out() {
        let dolo = stocked(1, "Dolo 650", 3.0, 2);
        let mut cart = Cart::new();
        cart.add(&dolo).expect("first");
        cart.add(&dolo).expect("second");
        let err = cart.add(&dolo).expect_err("stock exhausted");
        assert!(err.to_string().contains("Only 2"));
        assert_eq!(cart.lines().len(), 1);
        assert!((cart.total() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_stock_medicine_cannot_be_added() {
        let mut cart = Cart::new();
        assert!(cart.add(&stocked(2, "Empty", 1.0, 0)).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn zero_quantity_removes_line() {
        let mut cart = Cart::new();
        cart.add(&stocked(3, "Zincovit", 8.0, 20)).expect("add");
        cart.set_quantity(3, 5).expect("five");
        assert!((cart.total() - 40.0).abs() < f64::EPSILON);
        assert!(cart.set_quantity(3, 21).is_err());
        cart.set_quantity(3, 0).expect("remove");
        assert!(cart.is_empty());
    }

    #[test]
    fn validate_stock_names_medicine_and_available_count() {
        let mut cart = Cart::new();
        cart.add(&stocked(4, "Cofsils", 2.0, 10)).expect("add");
        cart.set_quantity(4, 6).expect("six");
        let fresh = vec![stocked(4, "Cofsils", 2.0, 3)];
        let err = cart.validate_stock(&fresh).expect_err("stock dropped");
        assert_eq!(
            err.to_string(),
            "Insufficient stock for: Cofsils. Available: 3"
        );
    }

    #[test]
    fn request_defaults_to_walk_in_customer() {
        let mut cart = Cart::new();
        cart.add(&stocked(5, "ORS", 1.5, 9)).expect("add");
        let request = cart
            .into_request(
                &CustomerInput {
                    name: Some("  ".to_string()),
                    phone: "9876543210".to_string(),
                    email: None,
                },
                PaymentMethod::Upi,
            )
            .expect("request");
        assert_eq!(request.customer_name.as_deref(), Some("Walk-in Customer"));
        assert_eq!(request.items[0].medicine_id, 5);
        assert_eq!(request.payment_method, PaymentMethod::Upi);
    }

    #[test]
    fn empty_cart_and_bad_phone_are_rejected() {
        let customer = CustomerInput {
            phone: "12345".to_string(),
            ..CustomerInput::default()
        };
        assert!(Cart::new().into_request(&customer, PaymentMethod::Cash).is_err());
        assert!(!is_valid_phone("12345"));
        assert!(is_valid_phone("0123456789"));
    }
}
