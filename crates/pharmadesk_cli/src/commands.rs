use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Checks the core library linkage.
    Ping,
    /// Shows the current session user and role.
    Whoami,
    /// Lists every page with the gate's decision for the current user.
    Routes,
    /// Prints the sidebar sections for the current user.
    Nav,
    /// Asks the gate whether a page path may be opened.
    CanAccess { path: String },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PHARMADESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register(RegisterArgs),
    VerifyOtp {
        #[arg(long)]
        session: String,
        #[arg(long)]
        code: String,
    },
    Logout,
    Orders {
        #[command(subcommand)]
        command: OrderCommand,
    },
    Deliveries {
        #[command(subcommand)]
        command: DeliveryCommand,
    },
    Bills {
        #[command(subcommand)]
        command: BillCommand,
    },
    Medicines {
        #[command(subcommand)]
        command: MedicineCommand,
    },
    Customers {
        #[command(subcommand)]
        command: CustomerCommand,
    },
    /// Recorded sales (transactions page).
    Sales {
        #[command(subcommand)]
        command: SaleCommand,
    },
    Reports {
        #[command(subcommand)]
        command: ReportCommand,
    },
    /// Records a sale through the billing cart.
    Sell(SellArgs),
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    SupplierProfile {
        #[command(subcommand)]
        command: SupplierProfileCommand,
    },
    Storage {
        #[command(subcommand)]
        command: StorageCommand,
    },
}

#[derive(Args)]
pub(crate) struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "PHARMADESK_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long, value_enum)]
    pub role: RoleArg,
    #[arg(long, default_value = "")]
    pub address: String,
    /// Profile photo; registration requires one.
    #[arg(long)]
    pub photo: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum RoleArg {
    Owner,
    Employee,
    Supplier,
}

#[derive(Subcommand)]
pub(crate) enum OrderCommand {
    Create {
        /// `name:quantity:price`, repeatable.
        #[arg(long = "item", required = true)]
        items: Vec<String>,
        #[arg(long)]
        customer_name: Option<String>,
        #[arg(long)]
        customer_phone: Option<String>,
        #[arg(long)]
        customer_email: Option<String>,
        #[arg(long)]
        delivery_address: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    List {
        #[arg(long, value_enum, default_value_t = OrderFilter::All)]
        filter: OrderFilter,
    },
    Show { id: String },
    Respond {
        id: String,
        #[arg(value_enum)]
        response: ResponseArg,
    },
    Pay {
        id: String,
        #[arg(long, default_value = "card")]
        method: String,
    },
    Ship { id: String },
    Deliver { id: String },
    Track { id: String },
    /// Removes all stored orders and deliveries.
    Clear,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OrderFilter {
    All,
    Active,
    Pending,
    Delivered,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum ResponseArg {
    Accept,
    Reject,
}

#[derive(Subcommand)]
pub(crate) enum DeliveryCommand {
    Create {
        #[arg(long)]
        order: Option<String>,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
    },
    List {
        #[arg(long)]
        order: Option<String>,
    },
    Stage { id: String, stage: String },
    Payment { id: String, status: String },
    Status { id: String, status: String },
}

#[derive(Subcommand)]
pub(crate) enum BillCommand {
    Create {
        #[arg(long)]
        order: Option<String>,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    List {
        #[arg(long, default_value_t = false)]
        overdue: bool,
    },
    Status { id: String, status: String },
    ForOrder { order: String },
}

#[derive(Subcommand)]
pub(crate) enum MedicineCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    LowStock,
    OutOfStock,
    NearExpiry {
        #[arg(long)]
        days: Option<u32>,
    },
    Expired,
    Add(MedicineArgs),
    /// Changes only the fields given.
    Update {
        id: i64,
        #[command(flatten)]
        fields: MedicineArgs,
    },
    /// Soft delete; the medicine turns inactive.
    Delete { id: i64 },
}

/// Medicine form fields. `--expiry` takes `yyyy-mm-dd` or `dd-mm-yyyy`.
#[derive(Args, Default)]
pub(crate) struct MedicineArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub generic_name: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub manufacturer: Option<String>,
    #[arg(long)]
    pub batch: Option<String>,
    #[arg(long)]
    pub price: Option<f64>,
    #[arg(long)]
    pub cost_price: Option<f64>,
    #[arg(long)]
    pub stock: Option<u32>,
    #[arg(long)]
    pub min_stock: Option<u32>,
    #[arg(long)]
    pub expiry: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum CustomerCommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Add {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        contact: CustomerContactArgs,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        contact: CustomerContactArgs,
    },
    Delete { id: i64 },
}

#[derive(Args, Default)]
pub(crate) struct CustomerContactArgs {
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum SaleCommand {
    /// Newest first, filtered by date and bill, customer or payment text.
    List {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        search: Option<String>,
    },
    Show { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub(crate) enum ReportCommand {
    Dashboard,
    /// Sales totals for a date range plus the monthly breakdown.
    Summary {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    Top {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Profit {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value = "day")]
        granularity: String,
    },
}

#[derive(Args)]
pub(crate) struct SellArgs {
    /// `medicine_id:quantity`, repeatable.
    #[arg(long = "item", required = true)]
    pub items: Vec<String>,
    #[arg(long)]
    pub customer_name: Option<String>,
    #[arg(long)]
    pub customer_phone: String,
    #[arg(long)]
    pub customer_email: Option<String>,
    #[arg(long, default_value = "CASH")]
    pub payment: String,
}

#[derive(Args, Default)]
pub(crate) struct ContactArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum ProfileCommand {
    Show,
    Update(ContactArgs),
    Avatar { file: PathBuf },
    /// Owner contact, for suppliers.
    Owner,
}

#[derive(Subcommand)]
pub(crate) enum SupplierProfileCommand {
    Show,
    Update {
        #[command(flatten)]
        contact: ContactArgs,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        gst: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Photo { file: PathBuf },
}

#[derive(Subcommand)]
pub(crate) enum StorageCommand {
    /// Bytes used by the local store.
    Size,
    /// Wipes the local store, including the session.
    Clear,
}

impl Commands {
    /// Name used in log events.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Whoami => "whoami",
            Self::Routes => "routes",
            Self::Nav => "nav",
            Self::CanAccess { .. } => "can_access",
            Self::Login { .. } => "login",
            Self::Register(_) => "register",
            Self::VerifyOtp { .. } => "verify_otp",
            Self::Logout => "logout",
            Self::Orders { .. } => "orders",
            Self::Deliveries { .. } => "deliveries",
            Self::Bills { .. } => "bills",
            Self::Medicines { .. } => "medicines",
            Self::Customers { .. } => "customers",
            Self::Sales { .. } => "sales",
            Self::Reports { .. } => "reports",
            Self::Sell(_) => "sell",
            Self::Profile { .. } => "profile",
            Self::SupplierProfile { .. } => "supplier_profile",
            Self::Storage { .. } => "storage",
        }
    }
}
