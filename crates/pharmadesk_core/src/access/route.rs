//! Client routes and their stable paths.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Route {
    Login,
    Register,
    SupplierRegister,
    VerifyOtp,
    Dashboard,
    Medicines,
    Customers,
    Billing,
    Transactions,
    Reports,
    TopMedicines,
    ProfitAnalysis,
    NearExpiry,
    OutOfStock,
    ExpiredHistory,
    PurchaseHub,
    PurchaseCreate,
    PurchaseHistory,
    PurchaseDeliveries,
    PurchasePayments,
    SupplierPortal,
    SupplierOrders,
    SupplierOrderHistory,
    SupplierOwner,
    Profile,
}

impl Route {
    pub const ALL: [Route; 25] = [
        Route::Login,
        Route::Register,
        Route::SupplierRegister,
        Route::VerifyOtp,
        Route::Dashboard,
        Route::Medicines,
        Route::Customers,
        Route::Billing,
        Route::Transactions,
        Route::Reports,
        Route::TopMedicines,
        Route::ProfitAnalysis,
        Route::NearExpiry,
        Route::OutOfStock,
        Route::ExpiredHistory,
        Route::PurchaseHub,
        Route::PurchaseCreate,
        Route::PurchaseHistory,
        Route::PurchaseDeliveries,
        Route::PurchasePayments,
        Route::SupplierPortal,
        Route::SupplierOrders,
        Route::SupplierOrderHistory,
        Route::SupplierOwner,
        Route::Profile,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::SupplierRegister => "/supplier/register",
            Self::VerifyOtp => "/verify-otp",
            Self::Dashboard => "/",
            Self::Medicines => "/medicines",
            Self::Customers => "/customers",
            Self::Billing => "/billing",
            Self::Transactions => "/transactions",
            Self::Reports => "/reports",
            Self::TopMedicines => "/reports/top-medicines",
            Self::ProfitAnalysis => "/reports/profit",
            Self::NearExpiry => "/medicines/near-expiry",
            Self::OutOfStock => "/owner/out-of-stock",
            Self::ExpiredHistory => "/owner/expired",
            Self::PurchaseHub => "/purchase",
            Self::PurchaseCreate => "/purchase/create",
            Self::PurchaseHistory => "/purchase/history",
            Self::PurchaseDeliveries => "/purchase/deliveries",
            Self::PurchasePayments => "/purchase/payments",
            Self::SupplierPortal => "/supplier",
            Self::SupplierOrders => "/supplier/orders",
            Self::SupplierOrderHistory => "/supplier/history",
            Self::SupplierOwner => "/supplier/owner",
            Self::Profile => "/profile",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Register => "Register",
            Self::SupplierRegister => "Supplier Registration",
            Self::VerifyOtp => "Verify OTP",
            Self::Dashboard => "Dashboard",
            Self::Medicines => "Medicines",
            Self::Customers => "Customers",
            Self::Billing => "Billing",
            Self::Transactions => "Transactions",
            Self::Reports => "Reports",
            Self::TopMedicines => "Top Medicines",
            Self::ProfitAnalysis => "Profit Analysis",
            Self::NearExpiry => "Near Expiry",
            Self::OutOfStock => "Out of Stock",
            Self::ExpiredHistory => "Expired History",
            Self::PurchaseHub => "Purchase Hub",
            Self::PurchaseCreate => "Create Purchase Order",
            Self::PurchaseHistory => "Purchase History",
            Self::PurchaseDeliveries => "Deliveries",
            Self::PurchasePayments => "Purchase Payments",
            Self::SupplierPortal => "Supplier Portal",
            Self::SupplierOrders => "Incoming Orders",
            Self::SupplierOrderHistory => "Order History",
            Self::SupplierOwner => "Medical Owner",
            Self::Profile => "Profile",
        }
    }

    /// Reachable without a session.
    pub fn is_public(self) -> bool {
        matches!(
            self,
            Self::Login | Self::Register | Self::SupplierRegister | Self::VerifyOtp
        )
    }

    /// Resolves a browser-style path; query string, fragment and trailing
    /// slash are ignored.
    pub fn from_path(path: &str) -> Option<Self> {
        let without_query = path.split(['?', '#']).next().unwrap_or_default().trim();
        let normalized = match without_query.trim_end_matches('/') {
            "" => "/",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|route| route.path() == normalized)
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::Route;
    use std::collections::HashSet;

    #[test]
    fn paths_are_unique() {
        let paths: HashSet<_> = Route::ALL.iter().map(|route| route.path()).collect();
        assert_eq!(paths.len(), Route::ALL.len());
    }

    #[test]
    fn from_path_normalizes_input() {
        assert_eq!(Route::from_path("/"), Some(Route::Dashboard));
        assert_eq!(Route::from_path(""), Some(Route::Dashboard));
        assert_eq!(Route::from_path("/medicines/"), Some(Route::Medicines));
        assert_eq!(
            Route::from_path("/purchase/history?page=2"),
            Some(Route::PurchaseHistory)
        );
        assert_eq!(Route::from_path("/admin"), None);
    }

    #[test]
    fn every_route_round_trips_through_its_path() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }
}
