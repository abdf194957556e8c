//! Route and permission decisions for a session user.

use crate::access::permission::{role_has_permission, Permission};
use crate::access::route::Route;
use crate::model::user::{Role, SessionUser};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

const OWNER_ROUTES: &[Route] = &[
    Route::Dashboard,
    Route::Medicines,
    Route::Customers,
    Route::Billing,
    Route::Transactions,
    Route::NearExpiry,
    Route::Reports,
    Route::TopMedicines,
    Route::ProfitAnalysis,
    Route::OutOfStock,
    Route::ExpiredHistory,
    Route::PurchaseHub,
    Route::PurchaseCreate,
    Route::PurchaseHistory,
    Route::PurchaseDeliveries,
    Route::PurchasePayments,
    Route::Profile,
];

const EMPLOYEE_ROUTES: &[Route] = &[
    Route::Dashboard,
    Route::Medicines,
    Route::Customers,
    Route::Billing,
    Route::Transactions,
    Route::NearExpiry,
    Route::Profile,
];

const SUPPLIER_ROUTES: &[Route] = &[
    Route::SupplierPortal,
    Route::SupplierOrders,
    Route::SupplierOrderHistory,
    Route::SupplierOwner,
    Route::Profile,
];

/// Outcome of a route check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectToLogin,
    Forbidden { fallback: Route },
}

impl AccessDecision {
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    NotAuthenticated,
    RouteDenied {
        route: Route,
        role: Option<Role>,
        fallback: Route,
    },
    PermissionDenied {
        permission: Permission,
        role: Option<Role>,
    },
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "login required"),
            Self::RouteDenied {
                route,
                role,
                fallback,
            } => write!(
                f,
                "{} cannot open `{}`; go to `{}` instead",
                role_name(*role),
                route.path(),
                fallback.path()
            ),
            Self::PermissionDenied { permission, role } => write!(
                f,
                "{} is not allowed to {}",
                role_name(*role),
                permission.as_str()
            ),
        }
    }
}

impl Error for AccessError {}

/// Non-public routes reachable by `role`, in sidebar order.
pub fn routes_for(role: Role) -> &'static [Route] {
    match role {
        Role::Owner => OWNER_ROUTES,
        Role::Employee => EMPLOYEE_ROUTES,
        Role::Supplier => SUPPLIER_ROUTES,
    }
}

/// Route shown right after login.
pub fn landing_route(role: Role) -> Route {
    match role {
        Role::Owner | Role::Employee => Route::Dashboard,
        Role::Supplier => Route::SupplierPortal,
    }
}

pub fn role_description(role: Role) -> &'static str {
    match role {
        Role::Owner => "Owner: full administrative privileges",
        Role::Employee => "Employee: limited operational access",
        Role::Supplier => "Supplier: order fulfilment access",
    }
}

/// Decides whether `user` may open `route`.
pub fn decide(user: Option<&SessionUser>, route: Route) -> AccessDecision {
    if route.is_public() {
        return AccessDecision::Allow;
    }
    let Some(user) = user else {
        return AccessDecision::RedirectToLogin;
    };
    let Some(role) = user.role else {
        // Without a role only the profile page is meaningful.
        return if route == Route::Profile {
            AccessDecision::Allow
        } else {
            AccessDecision::Forbidden {
                fallback: Route::Profile,
            }
        };
    };

    if routes_for(role).contains(&route) {
        AccessDecision::Allow
    } else {
        AccessDecision::Forbidden {
            fallback: landing_route(role),
        }
    }
}

/// Error form of [`decide`].
pub fn require_route(user: Option<&SessionUser>, route: Route) -> Result<(), AccessError> {
    match decide(user, route) {
        AccessDecision::Allow => Ok(()),
        AccessDecision::RedirectToLogin => {
            debug!(
                "event=access_check module=access status=denied route={} reason=no_session",
                route.path()
            );
            Err(AccessError::NotAuthenticated)
        }
        AccessDecision::Forbidden { fallback } => {
            let role = user.and_then(|user| user.role);
            debug!(
                "event=access_check module=access status=denied route={} role={}",
                route.path(),
                role_name(role)
            );
            Err(AccessError::RouteDenied {
                route,
                role,
                fallback,
            })
        }
    }
}

/// Checks an in-page action.
///
/// `ClearLocalData` is also open to callers without a session (the login
/// page offers it when storage is full).
pub fn require_permission(
    user: Option<&SessionUser>,
    permission: Permission,
) -> Result<(), AccessError> {
    let Some(user) = user else {
        if permission == Permission::ClearLocalData {
            return Ok(());
        }
        return Err(AccessError::NotAuthenticated);
    };
    match user.role {
        Some(role) if role_has_permission(role, permission) => Ok(()),
        role => Err(AccessError::PermissionDenied { permission, role }),
    }
}

pub fn can(user: Option<&SessionUser>, permission: Permission) -> bool {
    require_permission(user, permission).is_ok()
}

/// Non-public routes `user` may open, in sidebar order.
pub fn reachable_routes(user: Option<&SessionUser>) -> Vec<Route> {
    match user.map(|user| user.role) {
        None => Vec::new(),
        Some(None) => vec![Route::Profile],
        Some(Some(role)) => routes_for(role).to_vec(),
    }
}

fn role_name(role: Option<Role>) -> &'static str {
    role.map_or("user without role", Role::as_str)
}

#[cfg(test)]
mod tests {
    use super::{decide, landing_route, reachable_routes, AccessDecision};
    use crate::access::route::Route;
    use crate::model::user::{Role, SessionUser};

    #[test]
    fn public_routes_are_open_without_session() {
        for route in Route::ALL.into_iter().filter(|route| route.is_public()) {
            assert_eq!(decide(None, route), AccessDecision::Allow);
        }
        assert_eq!(decide(None, Route::Dashboard), AccessDecision::RedirectToLogin);
    }

    #[test]
    fn denied_routes_fall_back_to_landing_page() {
        let supplier = SessionUser::new("Medi Supply", "s@supply.test", Role::Supplier);
        assert_eq!(
            decide(Some(&supplier), Route::Billing),
            AccessDecision::Forbidden {
                fallback: Route::SupplierPortal
            }
        );
        assert_eq!(landing_route(Role::Employee), Route::Dashboard);
    }

    #[test]
    fn roleless_user_only_reaches_profile() {
        let user = SessionUser {
            name: Some("Legacy".to_string()),
            ..SessionUser::default()
        };
        assert_eq!(reachable_routes(Some(&user)), vec![Route::Profile]);
        assert_eq!(
            decide(Some(&user), Route::Dashboard),
            AccessDecision::Forbidden {
                fallback: Route::Profile
            }
        );
    }
}
