//! REST backend seam.
//!
//! # Responsibility
//! - Describe the backend calls the client makes, as a blocking trait.
//! - Classify failures so the fallback layer knows when to take over.
//!
//! # Invariants
//! - `Unauthorized` is never fallback-eligible: a 401 ends the session.
//! - Missing endpoints (404/405/501) and transport failures surface as
//!   `Unavailable`.

mod http;
mod offline;

pub use http::HttpBackend;
pub use offline::OfflineBackend;

use crate::model::customer::Customer;
use crate::model::medicine::{Medicine, MedicineInput};
use crate::model::sale::{Sale, SaleRequest};
use crate::model::supplier::{SupplierProfile, SupplierProfileUpdate};
use crate::model::user::{ProfileUpdate, RegisterRequest, SessionUser};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    Unavailable(String),
    Unauthorized,
    Rejected { status: u16, message: String },
    Decode(String),
}

impl BackendError {
    /// Whether a local fallback may answer instead.
    pub fn is_fallback_eligible(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::Unauthorized | Self::Decode(_) => false,
        }
    }

    /// Short code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "backend_unavailable",
            Self::Unauthorized => "backend_unauthorized",
            Self::Rejected { .. } => "backend_rejected",
            Self::Decode(_) => "backend_decode",
        }
    }
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "backend unavailable: {message}"),
            Self::Unauthorized => write!(f, "session expired or invalid, please log in again"),
            Self::Rejected { status, message } => {
                write!(f, "backend rejected request ({status}): {message}")
            }
            Self::Decode(message) => write!(f, "unexpected backend response: {message}"),
        }
    }
}

impl Error for BackendError {}

/// Token plus the user the backend returned alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPayload {
    pub token: String,
    pub user: Option<SessionUser>,
}

/// Result of a login or registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(AuthPayload),
    OtpRequired {
        otp_session_id: String,
        message: Option<String>,
    },
}

/// Blocking client for the pharmacy REST API.
pub trait Backend {
    fn login(&self, email: &str, password: &str) -> BackendResult<LoginOutcome>;
    fn register(&self, request: &RegisterRequest) -> BackendResult<LoginOutcome>;
    fn verify_otp(&self, otp_session_id: &str, code: &str) -> BackendResult<AuthPayload>;

    fn get_profile(&self) -> BackendResult<SessionUser>;
    fn update_profile(&self, update: &ProfileUpdate) -> BackendResult<SessionUser>;
    /// Returns the stored avatar URL.
    fn upload_avatar(&self, bytes: &[u8], mime: &str) -> BackendResult<String>;
    fn get_owner(&self) -> BackendResult<SessionUser>;

    fn get_supplier_profile(&self) -> BackendResult<SupplierProfile>;
    fn update_supplier_profile(
        &self,
        update: &SupplierProfileUpdate,
    ) -> BackendResult<SupplierProfile>;
    fn upload_supplier_photo(&self, bytes: &[u8], mime: &str) -> BackendResult<SupplierProfile>;

    fn list_medicines(&self) -> BackendResult<Vec<Medicine>>;
    fn create_medicine(&self, input: &MedicineInput) -> BackendResult<Medicine>;
    fn update_medicine(&self, id: i64, input: &MedicineInput) -> BackendResult<Medicine>;
    fn delete_medicine(&self, id: i64) -> BackendResult<()>;

    fn list_customers(&self) -> BackendResult<Vec<Customer>>;
    fn create_customer(&self, customer: &Customer) -> BackendResult<Customer>;
    fn update_customer(&self, id: i64, customer: &Customer) -> BackendResult<Customer>;
    fn delete_customer(&self, id: i64) -> BackendResult<()>;

    fn list_sales(&self) -> BackendResult<Vec<Sale>>;
    fn get_sale(&self, id: i64) -> BackendResult<Sale>;
    fn create_sale(&self, request: &SaleRequest) -> BackendResult<Sale>;
    fn delete_sale(&self, id: i64) -> BackendResult<()>;
}
