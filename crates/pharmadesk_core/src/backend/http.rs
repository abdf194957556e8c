//! `reqwest` blocking implementation of [`Backend`].
//!
//! # Invariants
//! - The bearer token is read from the store on every request, so a login
//!   or logout takes effect without rebuilding the client.
//! - A 401 response removes `auth_token` and `auth_user` before the error
//!   is returned.

use super::{AuthPayload, Backend, BackendError, BackendResult, LoginOutcome};
use crate::model::customer::Customer;
use crate::model::medicine::{Medicine, MedicineInput};
use crate::model::sale::{Sale, SaleRequest};
use crate::model::supplier::{SupplierProfile, SupplierProfileUpdate};
use crate::model::user::{ProfileUpdate, RegisterRequest, SessionUser};
use crate::store::{safe_set, write_json, KeyValueStore, AUTH_TOKEN_KEY, AUTH_USER_KEY};
use log::{debug, warn};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

pub struct HttpBackend<'s> {
    client: Client,
    base_url: String,
    store: &'s dyn KeyValueStore,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvatarResponse {
    avatar_url: String,
}

impl<'s> HttpBackend<'s> {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        store: &'s dyn KeyValueStore,
    ) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| BackendError::Unavailable(format!("cannot build http client: {err}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.store.get(AUTH_TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => builder.bearer_auth(token),
            Ok(_) => builder,
            Err(err) => {
                warn!(
                    "event=backend_request module=backend status=degraded reason=token_read_failed error={}",
                    err
                );
                builder
            }
        }
    }

    fn send(&self, endpoint: &str, builder: RequestBuilder) -> BackendResult<Response> {
        let started_at = Instant::now();
        let response = builder.send().map_err(|err| {
            debug!(
                "event=backend_request module=backend status=error endpoint={} duration_ms={} error_code=transport",
                endpoint,
                started_at.elapsed().as_millis()
            );
            BackendError::Unavailable(err.to_string())
        })?;

        let status = response.status();
        debug!(
            "event=backend_request module=backend status={} endpoint={} http_status={} duration_ms={}",
            if status.is_success() { "ok" } else { "error" },
            endpoint,
            status.as_u16(),
            started_at.elapsed().as_millis()
        );

        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.clear_auth();
        }
        let body = response.text().unwrap_or_default();
        Err(classify_failure(endpoint, status.as_u16(), &body))
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        builder: RequestBuilder,
    ) -> BackendResult<T> {
        self.send(endpoint, builder)?
            .json::<T>()
            .map_err(|err| BackendError::Decode(format!("{endpoint}: {err}")))
    }

    fn send_empty(&self, endpoint: &str, builder: RequestBuilder) -> BackendResult<()> {
        self.send(endpoint, builder).map(|_| ())
    }

    fn clear_auth(&self) {
        for key in [AUTH_TOKEN_KEY, AUTH_USER_KEY] {
            if let Err(err) = self.store.remove(key) {
                warn!(
                    "event=auth_clear module=backend status=error key={} error={}",
                    key, err
                );
            }
        }
    }

    /// Mirrors token/user carried by auth responses into the store.
    fn remember_auth(&self, payload: &AuthPayload) {
        if let Err(err) = safe_set(self.store, AUTH_TOKEN_KEY, &payload.token) {
            warn!(
                "event=auth_persist module=backend status=error key={} error={}",
                AUTH_TOKEN_KEY, err
            );
        }
        if let Some(user) = &payload.user {
            if let Err(err) = write_json(self.store, AUTH_USER_KEY, &user.essential()) {
                warn!(
                    "event=auth_persist module=backend status=error key={} error={}",
                    AUTH_USER_KEY, err
                );
            }
        }
    }

    fn auth_call(&self, endpoint: &str, builder: RequestBuilder) -> BackendResult<LoginOutcome> {
        let body: Value = self.send_json(endpoint, builder)?;
        let outcome = parse_login_outcome(&body)?;
        if let LoginOutcome::Authenticated(payload) = &outcome {
            self.remember_auth(payload);
        }
        Ok(outcome)
    }
}

impl Backend for HttpBackend<'_> {
    fn login(&self, email: &str, password: &str) -> BackendResult<LoginOutcome> {
        let builder = self
            .request(Method::POST, "/auth/login")
            .json(&json!({ "email": email, "password": password }));
        self.auth_call("auth_login", builder)
    }

    fn register(&self, request: &RegisterRequest) -> BackendResult<LoginOutcome> {
        let builder = self.request(Method::POST, "/auth/register").json(request);
        self.auth_call("auth_register", builder)
    }

    fn verify_otp(&self, otp_session_id: &str, code: &str) -> BackendResult<AuthPayload> {
        let builder = self
            .request(Method::POST, "/auth/verify-otp")
            .json(&json!({ "otpSessionId": otp_session_id, "otp": code }));
        match self.auth_call("auth_verify_otp", builder)? {
            LoginOutcome::Authenticated(payload) => Ok(payload),
            LoginOutcome::OtpRequired { .. } => Err(BackendError::Decode(
                "auth_verify_otp: response carried no token".to_string(),
            )),
        }
    }

    fn get_profile(&self) -> BackendResult<SessionUser> {
        self.send_json("users_me", self.request(Method::GET, "/users/me"))
    }

    fn update_profile(&self, update: &ProfileUpdate) -> BackendResult<SessionUser> {
        self.send_json(
            "users_me_update",
            self.request(Method::PUT, "/users/me").json(update),
        )
    }

    fn upload_avatar(&self, bytes: &[u8], mime: &str) -> BackendResult<String> {
        let part = Part::bytes(bytes.to_vec())
            .file_name("avatar")
            .mime_str(mime)
            .map_err(|err| BackendError::Rejected {
                status: 400,
                message: format!("invalid mime type `{mime}`: {err}"),
            })?;
        let form = Form::new().part("file", part);
        let response: AvatarResponse = self.send_json(
            "users_me_avatar",
            self.request(Method::POST, "/users/me/avatar").multipart(form),
        )?;
        Ok(response.avatar_url)
    }

    fn get_owner(&self) -> BackendResult<SessionUser> {
        self.send_json("users_owner", self.request(Method::GET, "/users/owner"))
    }

    fn get_supplier_profile(&self) -> BackendResult<SupplierProfile> {
        self.send_json("suppliers_me", self.request(Method::GET, "/suppliers/me"))
    }

    fn update_supplier_profile(
        &self,
        update: &SupplierProfileUpdate,
    ) -> BackendResult<SupplierProfile> {
        self.send_json(
            "suppliers_me_update",
            self.request(Method::PUT, "/suppliers/me").json(update),
        )
    }

    fn upload_supplier_photo(&self, bytes: &[u8], mime: &str) -> BackendResult<SupplierProfile> {
        self.send_json(
            "suppliers_me_photo",
            self.request(Method::POST, "/suppliers/me/photo")
                .header(CONTENT_TYPE, mime)
                .body(bytes.to_vec()),
        )
    }

    fn list_medicines(&self) -> BackendResult<Vec<Medicine>> {
        self.send_json("medicines_list", self.request(Method::GET, "/medicines"))
    }

    fn create_medicine(&self, input: &MedicineInput) -> BackendResult<Medicine> {
        self.send_json(
            "medicines_create",
            self.request(Method::POST, "/medicines").json(input),
        )
    }

    fn update_medicine(&self, id: i64, input: &MedicineInput) -> BackendResult<Medicine> {
        self.send_json(
            "medicines_update",
            self.request(Method::PUT, &format!("/medicines/{id}")).json(input),
        )
    }

    fn delete_medicine(&self, id: i64) -> BackendResult<()> {
        self.send_empty(
            "medicines_delete",
            self.request(Method::DELETE, &format!("/medicines/{id}")),
        )
    }

    fn list_customers(&self) -> BackendResult<Vec<Customer>> {
        self.send_json("customers_list", self.request(Method::GET, "/customers"))
    }

    fn create_customer(&self, customer: &Customer) -> BackendResult<Customer> {
        self.send_json(
            "customers_create",
            self.request(Method::POST, "/customers").json(customer),
        )
    }

    fn update_customer(&self, id: i64, customer: &Customer) -> BackendResult<Customer> {
        self.send_json(
            "customers_update",
            self.request(Method::PUT, &format!("/customers/{id}")).json(customer),
        )
    }

    fn delete_customer(&self, id: i64) -> BackendResult<()> {
        self.send_empty(
            "customers_delete",
            self.request(Method::DELETE, &format!("/customers/{id}")),
        )
    }

    fn list_sales(&self) -> BackendResult<Vec<Sale>> {
        self.send_json("sales_list", self.request(Method::GET, "/sales"))
    }

    fn get_sale(&self, id: i64) -> BackendResult<Sale> {
        self.send_json("sales_get", self.request(Method::GET, &format!("/sales/{id}")))
    }

    fn create_sale(&self, request: &SaleRequest) -> BackendResult<Sale> {
        self.send_json(
            "sales_create",
            self.request(Method::POST, "/sales").json(request),
        )
    }

    fn delete_sale(&self, id: i64) -> BackendResult<()> {
        self.send_empty(
            "sales_delete",
            self.request(Method::DELETE, &format!("/sales/{id}")),
        )
    }
}

/// Maps a non-success status and body onto a [`BackendError`].
fn classify_failure(endpoint: &str, status: u16, body: &str) -> BackendError {
    match status {
        401 => BackendError::Unauthorized,
        404 | 405 | 501 => {
            BackendError::Unavailable(format!("{endpoint} is not served ({status})"))
        }
        _ => BackendError::Rejected {
            status,
            message: error_message(body).unwrap_or_else(|| format!("http status {status}")),
        },
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Auth endpoints answer either `{token, user}` or `{otpSessionId, message}`.
fn parse_login_outcome(body: &Value) -> BackendResult<LoginOutcome> {
    if let Some(token) = body.get("token").and_then(Value::as_str) {
        let user = match body.get("user") {
            Some(Value::Null) | None => None,
            Some(raw) => Some(
                serde_json::from_value::<SessionUser>(raw.clone())
                    .map_err(|err| BackendError::Decode(format!("auth user: {err}")))?,
            ),
        };
        return Ok(LoginOutcome::Authenticated(AuthPayload {
            token: token.to_string(),
            user,
        }));
    }
    if let Some(session_id) = body.get("otpSessionId").and_then(Value::as_str) {
        return Ok(LoginOutcome::OtpRequired {
            otp_session_id: session_id.to_string(),
            message: body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }
    Err(BackendError::Decode(
        "auth response carried neither token nor otp session".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::{classify_failure, parse_login_outcome, HttpBackend};
    use crate::backend::{Backend, BackendError, LoginOutcome};
    use crate::model::user::{Role, SessionUser};
    use crate::store::{
        read_json, write_json, KeyValueStore, MemoryKeyValueStore, AUTH_TOKEN_KEY, AUTH_USER_KEY,
    };
    use serde_json::json;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    /// Answers one connection per canned `(status line, body)` pair and
    /// returns the request heads it saw.
    fn serve(replies: Vec<(&'static str, String)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let base_url = format!("http://{}/api", listener.local_addr().expect("addr"));
        let handle = thread::spawn(move || {
            let mut heads = Vec::new();
            for (status, body) in replies {
                let (stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream);
                let mut head = String::new();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).expect("request line");
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().expect("content length");
                        }
                    }
                    head.push_str(&line);
                }
                let mut request_body = vec![0; content_length];
                reader.read_exact(&mut request_body).expect("request body");
                heads.push(head);

                let reply = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let mut stream = reader.into_inner();
                stream.write_all(reply.as_bytes()).expect("write reply");
                stream.flush().expect("flush");
            }
            heads
        });
        (base_url, handle)
    }

    fn backend<'s>(base_url: &str, store: &'s MemoryKeyValueStore) -> HttpBackend<'s> {
        HttpBackend::new(base_url, Duration::from_secs(5), store).expect("client")
    }

    #[test]
    fn missing_endpoints_are_unavailable() {
        assert!(matches!(
            classify_failure("suppliers_me", 404, ""),
            BackendError::Unavailable(_)
        ));
        assert_eq!(
            classify_failure("users_me", 401, ""),
            BackendError::Unauthorized
        );
    }

    #[test]
    fn rejection_uses_backend_message_when_present() {
        let err = classify_failure("auth_register", 400, r#"{"message":"Email already registered"}"#);
        assert_eq!(
            err,
            BackendError::Rejected {
                status: 400,
                message: "Email already registered".to_string()
            }
        );
        let err = classify_failure("sales_create", 500, "<html>");
        assert!(err.to_string().contains("http status 500"));
    }

    #[test]
    fn parses_token_and_otp_login_shapes() {
        let direct = parse_login_outcome(&json!({
            "token": "jwt",
            "user": {"id": 1, "name": "Asha", "email": "a@p.test", "role": "Owner"}
        }))
        .expect("token payload");
        match direct {
            LoginOutcome::Authenticated(payload) => {
                assert_eq!(payload.token, "jwt");
                assert_eq!(payload.user.and_then(|user| user.role), Some(Role::Owner));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let otp = parse_login_outcome(&json!({
            "otpSessionId": "7f1c",
            "message": "OTP sent to email"
        }))
        .expect("otp payload");
        assert_eq!(
            otp,
            LoginOutcome::OtpRequired {
                otp_session_id: "7f1c".to_string(),
                message: Some("OTP sent to email".to_string())
            }
        );

        assert!(parse_login_outcome(&json!({"message": "?"})).is_err());
    }

    #[test]
    fn unreachable_server_is_fallback_eligible() {
        let store = MemoryKeyValueStore::unbounded();
        store.set(AUTH_TOKEN_KEY, "jwt").expect("token");
        // Port 9 (discard) on loopback is expected to refuse connections.
        let backend = HttpBackend::new("http://127.0.0.1:9/api", Duration::from_millis(500), &store)
            .expect("client");
        let err = backend.get_profile().expect_err("no server");
        assert!(err.is_fallback_eligible());
        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), Some("jwt".to_string()));
    }

    #[test]
    fn unauthorized_response_clears_stored_session() {
        let store = MemoryKeyValueStore::unbounded();
        store.set(AUTH_TOKEN_KEY, "expired-jwt").expect("token");
        write_json(
            &store,
            AUTH_USER_KEY,
            &SessionUser::new("Asha", "asha@pharmacy.test", Role::Owner),
        )
        .expect("user");
        let (base_url, server) = serve(vec![(
            "401 Unauthorized",
            r#"{"message":"Token expired"}"#.to_string(),
        )]);

        let err = backend(&base_url, &store).get_profile().expect_err("401");

        assert_eq!(err, BackendError::Unauthorized);
        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), None);
        assert_eq!(store.get(AUTH_USER_KEY).expect("get"), None);
        let heads = server.join().expect("server thread");
        assert!(heads[0].starts_with("GET /api/users/me "));
        assert!(heads[0]
            .to_ascii_lowercase()
            .contains("authorization: bearer expired-jwt"));
    }

    #[test]
    fn login_response_is_remembered_in_the_store() {
        let store = MemoryKeyValueStore::unbounded();
        let body = json!({
            "token": "fresh-jwt",
            "user": {
                "id": 4,
                "name": "Ravi",
                "email": "ravi@pharmacy.test",
                "role": "Employee",
                "phone": "9000000000"
            }
        })
        .to_string();
        let (base_url, server) = serve(vec![("200 OK", body)]);

        let outcome = backend(&base_url, &store)
            .login("ravi@pharmacy.test", "secret")
            .expect("login");

        assert!(matches!(outcome, LoginOutcome::Authenticated(_)));
        assert_eq!(
            store.get(AUTH_TOKEN_KEY).expect("get").as_deref(),
            Some("fresh-jwt")
        );
        let user: SessionUser = read_json(&store, AUTH_USER_KEY)
            .expect("read")
            .expect("stored user");
        assert_eq!(user.role, Some(Role::Employee));
        assert_eq!(user.phone, None);
        let heads = server.join().expect("server thread");
        assert!(heads[0].starts_with("POST /api/auth/login "));
        assert!(!heads[0].to_ascii_lowercase().contains("authorization:"));
    }

    #[test]
    fn delete_accepts_an_empty_success_body() {
        let store = MemoryKeyValueStore::unbounded();
        store.set(AUTH_TOKEN_KEY, "jwt").expect("token");
        let (base_url, server) = serve(vec![("200 OK", String::new())]);

        backend(&base_url, &store).delete_sale(12).expect("deleted");

        let heads = server.join().expect("server thread");
        assert!(heads[0].starts_with("DELETE /api/sales/12 "));
    }
}
