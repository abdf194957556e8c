//! In-page actions gated by role.

use crate::model::user::Role;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    ManageMedicines,
    DeleteMedicine,
    CreateSale,
    DeleteSale,
    ManageCustomers,
    ViewReports,
    ViewProfit,
    CreatePurchaseOrder,
    PayPurchaseOrder,
    ManageBills,
    RespondToOrders,
    UpdateShipment,
    ClearLocalData,
}

const OWNER_PERMISSIONS: &[Permission] = &[
    Permission::ManageMedicines,
    Permission::DeleteMedicine,
    Permission::CreateSale,
    Permission::DeleteSale,
    Permission::ManageCustomers,
    Permission::ViewReports,
    Permission::ViewProfit,
    Permission::CreatePurchaseOrder,
    Permission::PayPurchaseOrder,
    Permission::ManageBills,
    Permission::ClearLocalData,
];

const EMPLOYEE_PERMISSIONS: &[Permission] = &[
    Permission::ManageMedicines,
    Permission::CreateSale,
    Permission::ManageCustomers,
];

const SUPPLIER_PERMISSIONS: &[Permission] =
    &[Permission::RespondToOrders, Permission::UpdateShipment];

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManageMedicines => "manage_medicines",
            Self::DeleteMedicine => "delete_medicine",
            Self::CreateSale => "create_sale",
            Self::DeleteSale => "delete_sale",
            Self::ManageCustomers => "manage_customers",
            Self::ViewReports => "view_reports",
            Self::ViewProfit => "view_profit",
            Self::CreatePurchaseOrder => "create_purchase_order",
            Self::PayPurchaseOrder => "pay_purchase_order",
            Self::ManageBills => "manage_bills",
            Self::RespondToOrders => "respond_to_orders",
            Self::UpdateShipment => "update_shipment",
            Self::ClearLocalData => "clear_local_data",
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permissions granted to `role`.
pub fn permissions_for(role: Role) -> &'static [Permission] {
    match role {
        Role::Owner => OWNER_PERMISSIONS,
        Role::Employee => EMPLOYEE_PERMISSIONS,
        Role::Supplier => SUPPLIER_PERMISSIONS,
    }
}

pub fn role_has_permission(role: Role, permission: Permission) -> bool {
    permissions_for(role).contains(&permission)
}
