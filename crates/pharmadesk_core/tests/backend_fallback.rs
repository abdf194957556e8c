use pharmadesk_core::backend::{AuthPayload, Backend, BackendError, BackendResult, LoginOutcome};
use pharmadesk_core::model::customer::Customer;
use pharmadesk_core::model::medicine::{Medicine, MedicineInput};
use pharmadesk_core::model::sale::{PaymentMethod, Sale, SaleRequest};
use pharmadesk_core::model::supplier::{SupplierProfile, SupplierProfileUpdate};
use pharmadesk_core::model::user::{ProfileUpdate, RegisterRequest, Role, SessionUser};
use pharmadesk_core::service::catalog::CatalogService;
use pharmadesk_core::service::profile_service::ProfileService;
use pharmadesk_core::service::ServiceError;
use pharmadesk_core::session::{LoginProgress, Session, SessionError};
use pharmadesk_core::store::{
    read_json, write_json, KeyValueStore, MemoryKeyValueStore, AUTH_TOKEN_KEY, AUTH_USER_KEY,
    SUPPLIER_PROFILE_KEY,
};
use std::cell::RefCell;

/// Backend with canned answers; anything not scripted is unavailable.
#[derive(Default)]
struct ScriptedBackend {
    login: Option<BackendResult<LoginOutcome>>,
    verify: Option<BackendResult<AuthPayload>>,
    profile: Option<BackendResult<SessionUser>>,
    supplier: Option<BackendResult<SupplierProfile>>,
    medicines: Option<Vec<Medicine>>,
    customers: Option<Vec<Customer>>,
    sale: Option<Sale>,
    /// Endpoints that changed data, in call order.
    writes: RefCell<Vec<String>>,
}

impl ScriptedBackend {
    fn record(&self, call: String) {
        self.writes.borrow_mut().push(call);
    }
}

fn unavailable<T>() -> BackendResult<T> {
    Err(BackendError::Unavailable("connection refused".to_string()))
}

impl Backend for ScriptedBackend {
    fn login(&self, _email: &str, _password: &str) -> BackendResult<LoginOutcome> {
        self.login.clone().unwrap_or_else(unavailable)
    }

    fn register(&self, _request: &RegisterRequest) -> BackendResult<LoginOutcome> {
        self.login.clone().unwrap_or_else(unavailable)
    }

    fn verify_otp(&self, _otp_session_id: &str, _code: &str) -> BackendResult<AuthPayload> {
        self.verify.clone().unwrap_or_else(unavailable)
    }

    fn get_profile(&self) -> BackendResult<SessionUser> {
        self.profile.clone().unwrap_or_else(unavailable)
    }

    fn update_profile(&self, _update: &ProfileUpdate) -> BackendResult<SessionUser> {
        unavailable()
    }

    fn upload_avatar(&self, _bytes: &[u8], _mime: &str) -> BackendResult<String> {
        unavailable()
    }

    fn get_owner(&self) -> BackendResult<SessionUser> {
        unavailable()
    }

    fn get_supplier_profile(&self) -> BackendResult<SupplierProfile> {
        self.supplier.clone().unwrap_or_else(unavailable)
    }

    fn update_supplier_profile(
        &self,
        _update: &SupplierProfileUpdate,
    ) -> BackendResult<SupplierProfile> {
        unavailable()
    }

    fn upload_supplier_photo(&self, _bytes: &[u8], _mime: &str) -> BackendResult<SupplierProfile> {
        unavailable()
    }

    fn list_medicines(&self) -> BackendResult<Vec<Medicine>> {
        self.medicines.clone().map_or_else(unavailable, Ok)
    }

    fn create_medicine(&self, input: &MedicineInput) -> BackendResult<Medicine> {
        self.record(format!("create_medicine {}", input.name));
        let mut medicine = Medicine::new(
            input.name.clone(),
            input.price.unwrap_or(0.0),
            input.stock_quantity.unwrap_or(0),
        );
        medicine.id = Some(99);
        Ok(medicine)
    }

    fn update_medicine(&self, id: i64, input: &MedicineInput) -> BackendResult<Medicine> {
        self.record(format!("update_medicine {id} {}", input.name));
        let mut medicine = Medicine::new(
            input.name.clone(),
            input.price.unwrap_or(0.0),
            input.stock_quantity.unwrap_or(0),
        );
        medicine.id = Some(id);
        medicine.expiry_date = input.expiry_date;
        Ok(medicine)
    }

    fn delete_medicine(&self, id: i64) -> BackendResult<()> {
        self.record(format!("delete_medicine {id}"));
        Ok(())
    }

    fn list_customers(&self) -> BackendResult<Vec<Customer>> {
        self.customers.clone().map_or_else(unavailable, Ok)
    }

    fn create_customer(&self, customer: &Customer) -> BackendResult<Customer> {
        self.record(format!("create_customer {}", customer.name));
        Ok(Customer {
            id: Some(7),
            ..customer.clone()
        })
    }

    fn update_customer(&self, id: i64, customer: &Customer) -> BackendResult<Customer> {
        self.record(format!("update_customer {id} {}", customer.name));
        Ok(customer.clone())
    }

    fn delete_customer(&self, id: i64) -> BackendResult<()> {
        self.record(format!("delete_customer {id}"));
        Ok(())
    }

    fn list_sales(&self) -> BackendResult<Vec<Sale>> {
        unavailable()
    }

    fn get_sale(&self, id: i64) -> BackendResult<Sale> {
        match &self.sale {
            Some(sale) if sale.id == Some(id) => Ok(sale.clone()),
            Some(_) => Err(BackendError::Rejected {
                status: 400,
                message: format!("Sale not found with id: {id}"),
            }),
            None => unavailable(),
        }
    }

    fn create_sale(&self, _request: &SaleRequest) -> BackendResult<Sale> {
        unavailable()
    }

    fn delete_sale(&self, id: i64) -> BackendResult<()> {
        self.record(format!("delete_sale {id}"));
        Ok(())
    }
}

fn owner() -> SessionUser {
    let mut user = SessionUser::new("Asha Rao", "asha@pharmacy.test", Role::Owner);
    user.phone = Some("9876543210".to_string());
    user
}

#[test]
fn restore_fetches_missing_user_and_keeps_it_minimal() {
    let store = MemoryKeyValueStore::unbounded();
    store.set(AUTH_TOKEN_KEY, "jwt").unwrap();
    let backend = ScriptedBackend {
        profile: Some(Ok(owner())),
        ..ScriptedBackend::default()
    };

    let state = Session::new(&store).restore(&backend).unwrap();
    assert!(state.is_authenticated());
    assert_eq!(state.role(), Some(Role::Owner));

    let stored: SessionUser = read_json(&store, AUTH_USER_KEY).unwrap().unwrap();
    assert_eq!(stored.phone, None);
    assert_eq!(stored.name.as_deref(), Some("Asha Rao"));
}

#[test]
fn restore_logs_out_when_profile_fetch_fails() {
    let store = MemoryKeyValueStore::unbounded();
    store.set(AUTH_TOKEN_KEY, "stale").unwrap();

    let state = Session::new(&store)
        .restore(&ScriptedBackend::default())
        .unwrap();
    assert!(!state.is_authenticated());
    assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap(), None);
}

#[test]
fn restore_with_stored_user_skips_backend() {
    let store = MemoryKeyValueStore::unbounded();
    let session = Session::new(&store);
    session.set_auth(Some("jwt"), Some(&owner())).unwrap();

    let state = session.restore(&ScriptedBackend::default()).unwrap();
    assert_eq!(state.user.and_then(|user| user.name).as_deref(), Some("Asha Rao"));
}

#[test]
fn login_prefers_fresh_profile_over_payload_user() {
    let store = MemoryKeyValueStore::unbounded();
    let payload_user = SessionUser::new("Old Name", "asha@pharmacy.test", Role::Owner);
    let backend = ScriptedBackend {
        login: Some(Ok(LoginOutcome::Authenticated(AuthPayload {
            token: "jwt".to_string(),
            user: Some(payload_user),
        }))),
        profile: Some(Ok(owner())),
        ..ScriptedBackend::default()
    };

    let progress = Session::new(&store)
        .login(&backend, "asha@pharmacy.test", "secret")
        .unwrap();
    match progress {
        LoginProgress::Authenticated(user) => assert_eq!(user.name.as_deref(), Some("Asha Rao")),
        other => panic!("unexpected progress: {other:?}"),
    }
    assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("jwt"));
}

#[test]
fn login_falls_back_to_payload_user_when_profile_is_unavailable() {
    let store = MemoryKeyValueStore::unbounded();
    let backend = ScriptedBackend {
        login: Some(Ok(LoginOutcome::Authenticated(AuthPayload {
            token: "jwt".to_string(),
            user: Some(SessionUser::new("Ravi", "ravi@pharmacy.test", Role::Employee)),
        }))),
        ..ScriptedBackend::default()
    };

    let session = Session::new(&store);
    session.login(&backend, "ravi@pharmacy.test", "secret").unwrap();
    assert_eq!(
        session.current_user().unwrap().and_then(|user| user.role),
        Some(Role::Employee)
    );
}

#[test]
fn otp_login_completes_after_verification() {
    let store = MemoryKeyValueStore::unbounded();
    let backend = ScriptedBackend {
        login: Some(Ok(LoginOutcome::OtpRequired {
            otp_session_id: "otp-42".to_string(),
            message: None,
        })),
        verify: Some(Ok(AuthPayload {
            token: "jwt".to_string(),
            user: None,
        })),
        profile: Some(Ok(SessionUser::new(
            "Meds Direct",
            "orders@meds.test",
            Role::Supplier,
        ))),
        ..ScriptedBackend::default()
    };

    let session = Session::new(&store);
    let progress = session.login(&backend, "orders@meds.test", "secret").unwrap();
    let session_id = match progress {
        LoginProgress::OtpPending { session_id, .. } => session_id,
        other => panic!("unexpected progress: {other:?}"),
    };
    assert!(!session.state().unwrap().is_authenticated());

    let user = session.verify_otp(&backend, &session_id, "123456").unwrap();
    assert_eq!(user.role, Some(Role::Supplier));
    assert!(session.state().unwrap().is_authenticated());
}

#[test]
fn malformed_otp_code_is_rejected_before_verification() {
    let store = MemoryKeyValueStore::unbounded();
    let backend = ScriptedBackend {
        verify: Some(Ok(AuthPayload {
            token: "jwt".to_string(),
            user: Some(owner()),
        })),
        ..ScriptedBackend::default()
    };
    let session = Session::new(&store);
    for code in ["12345", "1234567", "12a456"] {
        let err = session.verify_otp(&backend, "otp-42", code).unwrap_err();
        assert!(matches!(err, SessionError::Invalid(_)), "{code}");
    }
    assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap(), None);
    session.verify_otp(&backend, "otp-42", " 004211 ").unwrap();
    assert!(session.state().unwrap().is_authenticated());
}

#[test]
fn empty_otp_session_means_no_token() {
    let store = MemoryKeyValueStore::unbounded();
    let backend = ScriptedBackend {
        login: Some(Ok(LoginOutcome::OtpRequired {
            otp_session_id: String::new(),
            message: None,
        })),
        ..ScriptedBackend::default()
    };
    let err = Session::new(&store)
        .login(&backend, "x@pharmacy.test", "secret")
        .unwrap_err();
    assert!(matches!(err, SessionError::NoToken));
}

#[test]
fn offline_profile_merges_supplier_details() {
    let store = MemoryKeyValueStore::unbounded();
    let session = Session::new(&store);
    session
        .set_auth(
            Some("jwt"),
            Some(&SessionUser::new("Meds Direct", "orders@meds.test", Role::Supplier)),
        )
        .unwrap();
    let mut stored_profile = SupplierProfile::placeholder();
    stored_profile.phone = Some("080-555-0101".to_string());
    write_json(&store, SUPPLIER_PROFILE_KEY, &stored_profile).unwrap();

    let backend = ScriptedBackend::default();
    let profile = ProfileService::new(&store, &backend).get_profile().unwrap();
    assert_eq!(profile.name.as_deref(), Some("Meds Direct"));
    assert_eq!(profile.phone.as_deref(), Some("080-555-0101"));
}

#[test]
fn offline_profile_without_stored_user_returns_backend_error() {
    let store = MemoryKeyValueStore::unbounded();
    let backend = ScriptedBackend::default();
    let err = ProfileService::new(&store, &backend).get_profile().unwrap_err();
    assert!(matches!(err, ServiceError::Backend(BackendError::Unavailable(_))));
}

#[test]
fn unauthorized_is_never_served_from_local_data() {
    let store = MemoryKeyValueStore::unbounded();
    Session::new(&store)
        .set_auth(Some("jwt"), Some(&owner()))
        .unwrap();
    let backend = ScriptedBackend {
        profile: Some(Err(BackendError::Unauthorized)),
        ..ScriptedBackend::default()
    };
    let err = ProfileService::new(&store, &backend).get_profile().unwrap_err();
    assert!(matches!(err, ServiceError::Backend(BackendError::Unauthorized)));
}

#[test]
fn offline_edits_update_user_and_supplier_profile() {
    let store = MemoryKeyValueStore::unbounded();
    Session::new(&store)
        .set_auth(
            Some("jwt"),
            Some(&SessionUser::new("Meds Direct", "orders@meds.test", Role::Supplier)),
        )
        .unwrap();
    let backend = ScriptedBackend::default();
    let profiles = ProfileService::new(&store, &backend);

    let placeholder = profiles.supplier_profile().unwrap();
    assert_eq!(placeholder.email.as_deref(), Some("supplier@example.com"));
    assert!(store.get(SUPPLIER_PROFILE_KEY).unwrap().is_some());

    let updated = profiles
        .update_profile(&ProfileUpdate {
            phone: Some("0801234567".to_string()),
            ..ProfileUpdate::default()
        })
        .unwrap();
    assert_eq!(updated.phone.as_deref(), Some("0801234567"));
    let supplier: SupplierProfile = read_json(&store, SUPPLIER_PROFILE_KEY).unwrap().unwrap();
    assert_eq!(supplier.phone.as_deref(), Some("0801234567"));

    let url = profiles.upload_avatar(b"png", "image/png").unwrap();
    assert_eq!(url, "data:image/png;base64,cG5n");
    let with_photo = profiles.upload_supplier_photo(b"jpg", "image/jpeg").unwrap();
    assert_eq!(with_photo.photo.as_deref(), Some("data:image/jpeg;base64,anBn"));

    let edited = profiles
        .update_supplier_profile(&SupplierProfileUpdate {
            company: Some("Meds Direct Pvt Ltd".to_string()),
            ..SupplierProfileUpdate::default()
        })
        .unwrap();
    assert_eq!(edited.company.as_deref(), Some("Meds Direct Pvt Ltd"));
    assert_eq!(edited.phone.as_deref(), Some("0801234567"));
}

fn stocked(id: i64, name: &str) -> Medicine {
    let mut medicine = Medicine::new(name, 12.5, 40);
    medicine.id = Some(id);
    medicine.category = Some("Analgesic".to_string());
    medicine
}

#[test]
fn medicine_edit_starts_from_current_record() {
    let backend = ScriptedBackend {
        medicines: Some(vec![stocked(4, "Paracetamol 500mg")]),
        ..ScriptedBackend::default()
    };
    let catalog = CatalogService::new(&backend);

    let updated = catalog
        .update_medicine(4, |input| input.stock_quantity = Some(55))
        .unwrap();
    assert_eq!(updated.name, "Paracetamol 500mg");
    assert_eq!(updated.stock_quantity, 55);
    assert_eq!(updated.price, 12.5);

    let err = catalog.update_medicine(5, |_| {}).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { kind: "medicine", .. }));

    let err = catalog
        .update_medicine(4, |input| input.name = "  ".to_string())
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(
        backend.writes.borrow().as_slice(),
        ["update_medicine 4 Paracetamol 500mg"]
    );
}

#[test]
fn invalid_inputs_never_reach_the_backend() {
    let backend = ScriptedBackend::default();
    let catalog = CatalogService::new(&backend);

    let negative = MedicineInput {
        name: "Cetirizine".to_string(),
        price: Some(-1.0),
        ..MedicineInput::default()
    };
    assert!(matches!(
        catalog.add_medicine(&negative).unwrap_err(),
        ServiceError::Validation(_)
    ));

    let bad_email = Customer {
        name: "Kiran".to_string(),
        email: Some("kiran-at-mail".to_string()),
        ..Customer::default()
    };
    assert!(matches!(
        catalog.add_customer(&bad_email).unwrap_err(),
        ServiceError::Validation(_)
    ));
    assert!(backend.writes.borrow().is_empty());

    let created = catalog
        .add_customer(&Customer {
            name: "Kiran".to_string(),
            email: Some("kiran@mail.test".to_string()),
            ..Customer::default()
        })
        .unwrap();
    assert_eq!(created.id, Some(7));
}

#[test]
fn customer_and_sale_maintenance_hit_their_endpoints() {
    let sale = Sale {
        id: Some(31),
        sale_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|date| date.and_hms_opt(10, 0, 0))
            .unwrap(),
        total_amount: 90.0,
        payment_method: PaymentMethod::Cash,
        bill_number: Some("BILL-31".to_string()),
        customer: None,
        items: Vec::new(),
    };
    let backend = ScriptedBackend {
        customers: Some(vec![Customer {
            id: Some(3),
            name: "Meera".to_string(),
            phone: Some("555".to_string()),
            ..Customer::default()
        }]),
        sale: Some(sale),
        ..ScriptedBackend::default()
    };
    let catalog = CatalogService::new(&backend);

    let updated = catalog
        .update_customer(3, |customer| customer.address = Some("MG Road".to_string()))
        .unwrap();
    assert_eq!(updated.phone.as_deref(), Some("555"));
    assert_eq!(updated.address.as_deref(), Some("MG Road"));
    catalog.delete_customer(3).unwrap();

    assert_eq!(
        catalog.get_sale(31).unwrap().bill_number.as_deref(),
        Some("BILL-31")
    );
    assert!(matches!(
        catalog.get_sale(32).unwrap_err(),
        ServiceError::Backend(BackendError::Rejected { status: 400, .. })
    ));
    catalog.delete_sale(31).unwrap();
    catalog.delete_medicine(4).unwrap();

    assert_eq!(
        backend.writes.borrow().as_slice(),
        [
            "update_customer 3 Meera",
            "delete_customer 3",
            "delete_sale 31",
            "delete_medicine 4"
        ]
    );
}
