//! Medicine, customer and sale maintenance against the backend.
//!
//! # Invariants
//! - Inputs are validated before any request is sent.
//! - Edits start from the record the backend currently holds, so fields the
//!   caller leaves alone are sent back unchanged.

use crate::backend::Backend;
use crate::model::customer::Customer;
use crate::model::medicine::{Medicine, MedicineInput};
use crate::model::sale::Sale;
use crate::service::{ServiceError, ServiceResult};
use log::info;

pub struct CatalogService<'b> {
    backend: &'b dyn Backend,
}

impl<'b> CatalogService<'b> {
    pub fn new(backend: &'b dyn Backend) -> Self {
        Self { backend }
    }

    pub fn add_medicine(&self, input: &MedicineInput) -> ServiceResult<Medicine> {
        input.validate().map_err(ServiceError::Validation)?;
        let created = self.backend.create_medicine(input)?;
        info!(
            "event=medicine_create module=service status=ok id={}",
            created.id.unwrap_or_default()
        );
        Ok(created)
    }

    pub fn update_medicine<F>(&self, id: i64, edit: F) -> ServiceResult<Medicine>
    where
        F: FnOnce(&mut MedicineInput),
    {
        let current = self
            .backend
            .list_medicines()?
            .into_iter()
            .find(|medicine| medicine.id == Some(id))
            .ok_or_else(|| not_found("medicine", id))?;
        let mut input = MedicineInput::from(&current);
        edit(&mut input);
        input.validate().map_err(ServiceError::Validation)?;
        let updated = self.backend.update_medicine(id, &input)?;
        info!("event=medicine_update module=service status=ok id={}", id);
        Ok(updated)
    }

    /// Backend side is a soft delete.
    pub fn delete_medicine(&self, id: i64) -> ServiceResult<()> {
        self.backend.delete_medicine(id)?;
        info!("event=medicine_delete module=service status=ok id={}", id);
        Ok(())
    }

    pub fn add_customer(&self, customer: &Customer) -> ServiceResult<Customer> {
        customer.validate().map_err(ServiceError::Validation)?;
        let created = self.backend.create_customer(customer)?;
        info!(
            "event=customer_create module=service status=ok id={}",
            created.id.unwrap_or_default()
        );
        Ok(created)
    }

    pub fn update_customer<F>(&self, id: i64, edit: F) -> ServiceResult<Customer>
    where
        F: FnOnce(&mut Customer),
    {
        let mut customer = self
            .backend
            .list_customers()?
            .into_iter()
            .find(|customer| customer.id == Some(id))
            .ok_or_else(|| not_found("customer", id))?;
        edit(&mut customer);
        customer.id = Some(id);
        customer.validate().map_err(ServiceError::Validation)?;
        let updated = self.backend.update_customer(id, &customer)?;
        info!("event=customer_update module=service status=ok id={}", id);
        Ok(updated)
    }

    pub fn delete_customer(&self, id: i64) -> ServiceResult<()> {
        self.backend.delete_customer(id)?;
        info!("event=customer_delete module=service status=ok id={}", id);
        Ok(())
    }

    pub fn get_sale(&self, id: i64) -> ServiceResult<Sale> {
        Ok(self.backend.get_sale(id)?)
    }

    pub fn delete_sale(&self, id: i64) -> ServiceResult<()> {
        self.backend.delete_sale(id)?;
        info!("event=sale_delete module=service status=ok id={}", id);
        Ok(())
    }
}

fn not_found(kind: &'static str, id: i64) -> ServiceError {
    ServiceError::NotFound {
        kind,
        id: id.to_string(),
    }
}
