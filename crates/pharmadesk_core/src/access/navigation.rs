//! Sidebar sections derived from the route tables.

use crate::access::policy::{decide, reachable_routes};
use crate::access::route::Route;
use crate::model::user::{Role, SessionUser};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    #[serde(skip)]
    pub route: Route,
    pub label: &'static str,
    pub path: &'static str,
}

impl From<Route> for NavItem {
    fn from(route: Route) -> Self {
        Self {
            route,
            label: route.label(),
            path: route.path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavSection {
    pub title: &'static str,
    pub items: Vec<NavItem>,
}

const SECTION_LAYOUT: &[(&str, &[Route])] = &[
    (
        "Operations",
        &[
            Route::Dashboard,
            Route::Medicines,
            Route::Customers,
            Route::Billing,
            Route::Transactions,
        ],
    ),
    (
        "Inventory Alerts",
        &[Route::NearExpiry, Route::OutOfStock, Route::ExpiredHistory],
    ),
    (
        "Reports",
        &[Route::Reports, Route::TopMedicines, Route::ProfitAnalysis],
    ),
    (
        "Purchasing",
        &[
            Route::PurchaseHub,
            Route::PurchaseCreate,
            Route::PurchaseHistory,
            Route::PurchaseDeliveries,
            Route::PurchasePayments,
        ],
    ),
    (
        "Supplier",
        &[
            Route::SupplierPortal,
            Route::SupplierOrders,
            Route::SupplierOrderHistory,
            Route::SupplierOwner,
        ],
    ),
    ("Account", &[Route::Profile]),
];

const GUEST_ROUTES: &[Route] = &[Route::Login, Route::Register, Route::SupplierRegister];

/// Sidebar for `user`; sections without a reachable route are omitted.
pub fn navigation_for(user: Option<&SessionUser>) -> Vec<NavSection> {
    let Some(user) = user else {
        return vec![NavSection {
            title: "Account",
            items: GUEST_ROUTES.iter().copied().map(NavItem::from).collect(),
        }];
    };

    let reachable = reachable_routes(Some(user));
    SECTION_LAYOUT
        .iter()
        .filter_map(|&(title, routes)| {
            let items: Vec<NavItem> = routes
                .iter()
                .copied()
                .filter(|route| reachable.contains(route))
                .filter(|route| decide(Some(user), *route).is_allowed())
                .map(NavItem::from)
                .collect();
            (!items.is_empty()).then_some(NavSection { title, items })
        })
        .collect()
}

/// Header badge text: role name, or `Guest` without a session.
pub fn header_badge(user: Option<&SessionUser>) -> &'static str {
    match user.and_then(|user| user.role) {
        Some(role) => role.as_str(),
        None if user.is_some() => "User",
        None => "Guest",
    }
}

/// Convenience for callers holding only a role.
pub fn navigation_for_role(role: Role) -> Vec<NavSection> {
    let user = SessionUser {
        role: Some(role),
        ..SessionUser::default()
    };
    navigation_for(Some(&user))
}

#[cfg(test)]
mod tests {
    use super::{header_badge, navigation_for, navigation_for_role};
    use crate::access::route::Route;
    use crate::model::user::Role;

    #[test]
    fn guest_sees_account_entry_points_only() {
        let sections = navigation_for(None);
        assert_eq!(sections.len(), 1);
        let routes: Vec<Route> = sections[0].items.iter().map(|item| item.route).collect();
        assert_eq!(
            routes,
            vec![Route::Login, Route::Register, Route::SupplierRegister]
        );
        assert_eq!(header_badge(None), "Guest");
    }

    #[test]
    fn employee_sidebar_omits_reports_and_purchasing() {
        let titles: Vec<&str> = navigation_for_role(Role::Employee)
            .iter()
            .map(|section| section.title)
            .collect();
        assert_eq!(titles, vec!["Operations", "Inventory Alerts", "Account"]);
    }

    #[test]
    fn supplier_sidebar_is_portal_only() {
        let titles: Vec<&str> = navigation_for_role(Role::Supplier)
            .iter()
            .map(|section| section.title)
            .collect();
        assert_eq!(titles, vec!["Supplier", "Account"]);
    }
}
