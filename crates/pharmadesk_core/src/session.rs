//! Client session: token and user persisted in the local store.
//!
//! # Responsibility
//! - Restore, establish and end the authenticated session.
//! - Parse the backend's role string into [`Role`] once, here, so the
//!   access gate only ever sees typed roles.
//!
//! # Invariants
//! - `auth_user` only ever holds the essential projection written by this
//!   module (id, name, email, role), or a profile edit made offline.
//! - A failed profile fetch during restore ends the session; it never
//!   leaves a token without a user behind.
//! - Passwords, tokens and OTP codes are never logged.

use crate::backend::{AuthPayload, Backend, BackendError, LoginOutcome};
use crate::logging::redact_email;
use crate::model::user::{RegisterRequest, Role, SessionUser};
use crate::store::{
    read_json, safe_set, write_json, KeyValueStore, StoreError, AUTH_TOKEN_KEY, AUTH_USER_KEY,
};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SessionResult<T> = Result<T, SessionError>;

const OTP_CODE_LENGTH: usize = 6;

#[derive(Debug)]
pub enum SessionError {
    Store(StoreError),
    Backend(BackendError),
    /// Auth response carried neither a token nor an OTP session.
    NoToken,
    Invalid(String),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Backend(err) => write!(f, "{err}"),
            Self::NoToken => write!(f, "no token received from server"),
            Self::Invalid(message) => write!(f, "{message}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Backend(err) => Some(err),
            Self::NoToken | Self::Invalid(_) => None,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<BackendError> for SessionError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

/// Snapshot of what the store says about the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<SessionUser>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().and_then(|user| user.role)
    }
}

/// Where a login attempt ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginProgress {
    Authenticated(SessionUser),
    /// A one-time code was sent; continue with [`Session::verify_otp`].
    OtpPending {
        session_id: String,
        message: Option<String>,
    },
}

pub struct Session<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the persisted session without touching the backend.
    pub fn state(&self) -> SessionResult<SessionState> {
        let token = self
            .store
            .get(AUTH_TOKEN_KEY)?
            .filter(|token| !token.is_empty());
        let user = read_json::<SessionUser, _>(&self.store, AUTH_USER_KEY)?;
        Ok(SessionState { token, user })
    }

    /// The stored user, only while a token is present.
    pub fn current_user(&self) -> SessionResult<Option<SessionUser>> {
        let state = self.state()?;
        Ok(if state.is_authenticated() {
            state.user
        } else {
            None
        })
    }

    /// Rebuilds the session on startup.
    ///
    /// A token without a stored user triggers a profile fetch. If that
    /// fetch fails for any reason the session is cleared.
    pub fn restore(&self, backend: &dyn Backend) -> SessionResult<SessionState> {
        let state = self.state()?;
        if !state.is_authenticated() {
            info!("event=session_restore module=session status=ok authenticated=false");
            return Ok(SessionState::default());
        }
        if state.user.is_some() {
            info!(
                "event=session_restore module=session status=ok authenticated=true source=store role={}",
                role_label(state.role())
            );
            return Ok(state);
        }

        match backend.get_profile() {
            Ok(profile) => {
                let user = profile.essential();
                write_json(&self.store, AUTH_USER_KEY, &user)?;
                info!(
                    "event=session_restore module=session status=ok authenticated=true source=backend role={}",
                    role_label(user.role)
                );
                Ok(SessionState {
                    token: state.token,
                    user: Some(user),
                })
            }
            Err(err) => {
                warn!(
                    "event=session_restore module=session status=error error_code={} action=logout",
                    err.code()
                );
                self.logout()?;
                Ok(SessionState::default())
            }
        }
    }

    /// Writes present values and removes absent ones.
    pub fn set_auth(&self, token: Option<&str>, user: Option<&SessionUser>) -> SessionResult<()> {
        match token {
            Some(token) => safe_set(&self.store, AUTH_TOKEN_KEY, token)?,
            None => self.store.remove(AUTH_TOKEN_KEY)?,
        }
        match user {
            Some(user) => write_json(&self.store, AUTH_USER_KEY, &user.essential())?,
            None => self.store.remove(AUTH_USER_KEY)?,
        }
        Ok(())
    }

    pub fn logout(&self) -> SessionResult<()> {
        self.store.remove(AUTH_TOKEN_KEY)?;
        self.store.remove(AUTH_USER_KEY)?;
        info!("event=session_logout module=session status=ok");
        Ok(())
    }

    /// Reaction to a 401 from any endpoint.
    pub fn handle_unauthorized(&self) -> SessionResult<()> {
        warn!("event=session_unauthorized module=session status=ok action=clear_auth");
        self.logout()
    }

    pub fn login(
        &self,
        backend: &dyn Backend,
        email: &str,
        password: &str,
    ) -> SessionResult<LoginProgress> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(SessionError::Invalid(
                "email and password are required".to_string(),
            ));
        }
        info!(
            "event=session_login module=session status=start email={}",
            redact_email(email)
        );
        let outcome = backend.login(email.trim(), password).map_err(|err| {
            warn!(
                "event=session_login module=session status=error error_code={}",
                err.code()
            );
            SessionError::from(err)
        })?;
        self.complete(backend, outcome)
    }

    pub fn register(
        &self,
        backend: &dyn Backend,
        request: &RegisterRequest,
    ) -> SessionResult<LoginProgress> {
        request.validate().map_err(SessionError::Invalid)?;
        info!(
            "event=session_register module=session status=start role={} email={}",
            request.role.as_str(),
            redact_email(&request.email)
        );
        let outcome = backend.register(request)?;
        self.complete(backend, outcome)
    }

    pub fn verify_otp(
        &self,
        backend: &dyn Backend,
        session_id: &str,
        code: &str,
    ) -> SessionResult<SessionUser> {
        let code = code.trim();
        if session_id.trim().is_empty() || code.is_empty() {
            return Err(SessionError::Invalid(
                "otp session and code are required".to_string(),
            ));
        }
        if !is_otp_code(code) {
            return Err(SessionError::Invalid(
                "otp code must be 6 digits".to_string(),
            ));
        }
        let payload = backend.verify_otp(session_id.trim(), code)?;
        self.establish(backend, payload)
    }

    fn complete(
        &self,
        backend: &dyn Backend,
        outcome: LoginOutcome,
    ) -> SessionResult<LoginProgress> {
        match outcome {
            LoginOutcome::Authenticated(payload) => {
                let user = self.establish(backend, payload)?;
                Ok(LoginProgress::Authenticated(user))
            }
            LoginOutcome::OtpRequired {
                otp_session_id,
                message,
            } if !otp_session_id.is_empty() => {
                info!("event=session_login module=session status=ok step=otp_pending");
                Ok(LoginProgress::OtpPending {
                    session_id: otp_session_id,
                    message,
                })
            }
            LoginOutcome::OtpRequired { .. } => Err(SessionError::NoToken),
        }
    }

    /// Persists the token, then prefers the fresh profile over the user
    /// carried by the auth response.
    fn establish(&self, backend: &dyn Backend, payload: AuthPayload) -> SessionResult<SessionUser> {
        if payload.token.is_empty() {
            return Err(SessionError::NoToken);
        }
        safe_set(&self.store, AUTH_TOKEN_KEY, &payload.token)?;

        let user = match backend.get_profile() {
            Ok(profile) => profile,
            Err(BackendError::Unauthorized) => {
                self.logout()?;
                return Err(SessionError::Backend(BackendError::Unauthorized));
            }
            Err(err) => match payload.user {
                Some(user) => {
                    warn!(
                        "event=session_profile module=session status=degraded error_code={} source=auth_payload",
                        err.code()
                    );
                    user
                }
                None => {
                    self.logout()?;
                    return Err(err.into());
                }
            },
        };

        let user = user.essential();
        write_json(&self.store, AUTH_USER_KEY, &user)?;
        info!(
            "event=session_login module=session status=ok role={}",
            role_label(user.role)
        );
        Ok(user)
    }
}

fn is_otp_code(code: &str) -> bool {
    code.len() == OTP_CODE_LENGTH && code.bytes().all(|byte| byte.is_ascii_digit())
}

fn role_label(role: Option<Role>) -> &'static str {
    role.map_or("none", Role::as_str)
}
