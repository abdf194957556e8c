use anyhow::{anyhow, Context, Result};
use pharmadesk_core::access::permission::Permission;
use pharmadesk_core::access::policy::{require_permission, require_route, AccessError};
use pharmadesk_core::access::route::Route;
use pharmadesk_core::backend::{Backend, BackendError, BackendResult};
use pharmadesk_core::model::medicine::Medicine;
use pharmadesk_core::model::sale::Sale;
use pharmadesk_core::model::user::SessionUser;
use pharmadesk_core::service::{ServiceError, ServiceResult};
use pharmadesk_core::session::Session;
use pharmadesk_core::store::SqliteKeyValueStore;
use pharmadesk_core::ClientConfig;
use serde::Serialize;
use serde_json::Value;

/// Everything a command handler needs for one invocation.
pub(crate) struct App<'a> {
    pub config: &'a ClientConfig,
    pub store: &'a SqliteKeyValueStore<'a>,
    pub backend: &'a dyn Backend,
    pub json: bool,
}

impl<'a> App<'a> {
    pub fn session(&self) -> Session<&'a SqliteKeyValueStore<'a>> {
        Session::new(self.store)
    }

    pub fn user(&self) -> Result<Option<SessionUser>> {
        self.session()
            .current_user()
            .context("failed to read the session")
    }

    /// Current user, provided the gate allows `route`.
    pub fn require_route(&self, route: Route) -> Result<SessionUser> {
        let user = self.user()?;
        require_route(user.as_ref(), route)?;
        user.ok_or_else(|| AccessError::NotAuthenticated.into())
    }

    /// Current user, provided the gate allows at least one of `routes`.
    pub fn require_any_route(&self, routes: &[Route]) -> Result<SessionUser> {
        let user = self.user()?;
        let mut denied = None;
        for route in routes {
            match require_route(user.as_ref(), *route) {
                Ok(()) => return user.ok_or_else(|| AccessError::NotAuthenticated.into()),
                Err(err) => denied = Some(err),
            }
        }
        Err(denied.map_or_else(|| anyhow!("no page grants this command"), Into::into))
    }

    pub fn require_permission(&self, permission: Permission) -> Result<()> {
        let user = self.user()?;
        require_permission(user.as_ref(), permission)?;
        Ok(())
    }

    pub fn medicines(&self) -> Result<Vec<Medicine>> {
        self.backend_call(self.backend.list_medicines())
            .context("failed to load medicines")
    }

    pub fn sales(&self) -> Result<Vec<Sale>> {
        self.backend_call(self.backend.list_sales())
            .context("failed to load sales")
    }

    /// Ends the session when the backend answered 401.
    pub fn backend_call<T>(&self, result: BackendResult<T>) -> Result<T> {
        if let Err(BackendError::Unauthorized) = &result {
            self.session().handle_unauthorized()?;
        }
        Ok(result?)
    }

    /// [`Self::backend_call`] for service results.
    pub fn service_call<T>(&self, result: ServiceResult<T>) -> Result<T> {
        if let Err(ServiceError::Backend(BackendError::Unauthorized)) = &result {
            self.session().handle_unauthorized()?;
        }
        Ok(result?)
    }

    /// Prints `payload`; compact under `--json`, indented otherwise.
    pub fn emit(&self, payload: Value) -> Result<()> {
        let text = if self.json {
            serde_json::to_string(&payload)?
        } else {
            serde_json::to_string_pretty(&payload)?
        };
        println!("{text}");
        Ok(())
    }

    pub fn emit_value<T: Serialize>(&self, value: &T) -> Result<()> {
        self.emit(serde_json::to_value(value)?)
    }
}
