//! Backend used when no API base URL is configured.

use super::{AuthPayload, Backend, BackendError, BackendResult, LoginOutcome};
use crate::model::customer::Customer;
use crate::model::medicine::{Medicine, MedicineInput};
use crate::model::sale::{Sale, SaleRequest};
use crate::model::supplier::{SupplierProfile, SupplierProfileUpdate};
use crate::model::user::{ProfileUpdate, RegisterRequest, SessionUser};

/// Every call reports `Unavailable`, so fallbacks always serve.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBackend;

fn offline<T>() -> BackendResult<T> {
    Err(BackendError::Unavailable("offline mode".to_string()))
}

impl Backend for OfflineBackend {
    fn login(&self, _email: &str, _password: &str) -> BackendResult<LoginOutcome> {
        offline()
    }

    fn register(&self, _request: &RegisterRequest) -> BackendResult<LoginOutcome> {
        offline()
    }

    fn verify_otp(&self, _otp_session_id: &str, _code: &str) -> BackendResult<AuthPayload> {
        offline()
    }

    fn get_profile(&self) -> BackendResult<SessionUser> {
        offline()
    }

    fn update_profile(&self, _update: &ProfileUpdate) -> BackendResult<SessionUser> {
        offline()
    }

    fn upload_avatar(&self, _bytes: &[u8], _mime: &str) -> BackendResult<String> {
        offline()
    }

    fn get_owner(&self) -> BackendResult<SessionUser> {
        offline()
    }

    fn get_supplier_profile(&self) -> BackendResult<SupplierProfile> {
        offline()
    }

    fn update_supplier_profile(
        &self,
        _update: &SupplierProfileUpdate,
    ) -> BackendResult<SupplierProfile> {
        offline()
    }

    fn upload_supplier_photo(&self, _bytes: &[u8], _mime: &str) -> BackendResult<SupplierProfile> {
        offline()
    }

    fn list_medicines(&self) -> BackendResult<Vec<Medicine>> {
        offline()
    }

    fn create_medicine(&self, _input: &MedicineInput) -> BackendResult<Medicine> {
        offline()
    }

    fn update_medicine(&self, _id: i64, _input: &MedicineInput) -> BackendResult<Medicine> {
        offline()
    }

    fn delete_medicine(&self, _id: i64) -> BackendResult<()> {
        offline()
    }

    fn list_customers(&self) -> BackendResult<Vec<Customer>> {
        offline()
    }

    fn create_customer(&self, _customer: &Customer) -> BackendResult<Customer> {
        offline()
    }

    fn update_customer(&self, _id: i64, _customer: &Customer) -> BackendResult<Customer> {
        offline()
    }

    fn delete_customer(&self, _id: i64) -> BackendResult<()> {
        offline()
    }

    fn list_sales(&self) -> BackendResult<Vec<Sale>> {
        offline()
    }

    fn get_sale(&self, _id: i64) -> BackendResult<Sale> {
        offline()
    }

    fn create_sale(&self, _request: &SaleRequest) -> BackendResult<Sale> {
        offline()
    }

    fn delete_sale(&self, _id: i64) -> BackendResult<()> {
        offline()
    }
}
