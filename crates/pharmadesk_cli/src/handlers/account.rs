//! Session, gate inspection, profile and local storage commands.

use super::read_image;
use crate::app::App;
use crate::commands::{
    ContactArgs, ProfileCommand, RegisterArgs, RoleArg, StorageCommand, SupplierProfileCommand,
};
use anyhow::{bail, Context, Result};
use log::info;
use pharmadesk_core::access::navigation::{header_badge, navigation_for};
use pharmadesk_core::access::permission::Permission;
use pharmadesk_core::access::policy::{
    decide, landing_route, reachable_routes, role_description, AccessDecision,
};
use pharmadesk_core::access::route::Route;
use pharmadesk_core::model::supplier::SupplierProfileUpdate;
use pharmadesk_core::model::user::{ProfileUpdate, RegisterRequest, Role};
use pharmadesk_core::service::profile_service::{image_data_url, ProfileService};
use pharmadesk_core::store::KeyValueStore;
use pharmadesk_core::LoginProgress;
use serde_json::{json, Value};

pub(crate) fn whoami(app: &App<'_>) -> Result<()> {
    let state = app.session().state()?;
    let payload = match &state.user {
        Some(user) => {
            let role = user.role;
            json!({
                "authenticated": state.is_authenticated(),
                "name": user.display_name(),
                "email": user.email,
                "role": role.map(Role::as_str),
                "badge": header_badge(Some(user)),
                "description": role.map(role_description),
                "landing": role.map(|role| landing_route(role).path()),
            })
        }
        None => json!({ "authenticated": false }),
    };
    app.emit(payload)
}

pub(crate) fn routes(app: &App<'_>) -> Result<()> {
    let user = app.user()?;
    let rows: Vec<Value> = Route::ALL
        .into_iter()
        .map(|route| {
            json!({
                "path": route.path(),
                "label": route.label(),
                "decision": decision_text(decide(user.as_ref(), route)),
            })
        })
        .collect();
    app.emit(json!({
        "reachable": reachable_routes(user.as_ref())
            .into_iter()
            .map(Route::path)
            .collect::<Vec<_>>(),
        "routes": rows,
    }))
}

pub(crate) fn nav(app: &App<'_>) -> Result<()> {
    let user = app.user()?;
    app.emit_value(&navigation_for(user.as_ref()))
}

pub(crate) fn can_access(app: &App<'_>, path: &str) -> Result<()> {
    let Some(route) = Route::from_path(path) else {
        bail!("no page is served at `{path}`");
    };
    let user = app.user()?;
    let decision = decide(user.as_ref(), route);
    app.emit(json!({
        "path": route.path(),
        "allowed": decision.is_allowed(),
        "decision": decision_text(decision),
    }))
}

fn decision_text(decision: AccessDecision) -> String {
    match decision {
        AccessDecision::Allow => "allow".to_string(),
        AccessDecision::RedirectToLogin => format!("redirect {}", Route::Login.path()),
        AccessDecision::Forbidden { fallback } => format!("forbidden, redirect {}", fallback.path()),
    }
}

pub(crate) fn login(app: &App<'_>, email: &str, password: &str) -> Result<()> {
    let progress = app.session().login(app.backend, email, password)?;
    emit_progress(app, progress)
}

pub(crate) fn register(app: &App<'_>, args: RegisterArgs) -> Result<()> {
    let (bytes, mime) = read_image(&args.photo)?;
    let request = RegisterRequest {
        name: args.name,
        email: args.email,
        password: args.password,
        address: args.address,
        role: role_from_arg(args.role),
        avatar_url: image_data_url(&bytes, mime),
    };
    let progress = app.session().register(app.backend, &request)?;
    emit_progress(app, progress)
}

pub(crate) fn verify_otp(app: &App<'_>, session_id: &str, code: &str) -> Result<()> {
    let user = app.session().verify_otp(app.backend, session_id, code)?;
    emit_progress(app, LoginProgress::Authenticated(user))
}

fn emit_progress(app: &App<'_>, progress: LoginProgress) -> Result<()> {
    match progress {
        LoginProgress::Authenticated(user) => {
            let landing = user.role.map(|role| landing_route(role).path());
            app.emit(json!({
                "status": "authenticated",
                "name": user.display_name(),
                "role": user.role.map(Role::as_str),
                "landing": landing,
            }))
        }
        LoginProgress::OtpPending {
            session_id,
            message,
        } => app.emit(json!({
            "status": "otp_required",
            "session": session_id,
            "message": message.unwrap_or_else(|| "Enter the code sent to your email".to_string()),
        })),
    }
}

fn role_from_arg(role: RoleArg) -> Role {
    match role {
        RoleArg::Owner => Role::Owner,
        RoleArg::Employee => Role::Employee,
        RoleArg::Supplier => Role::Supplier,
    }
}

pub(crate) fn logout(app: &App<'_>) -> Result<()> {
    app.session().logout()?;
    app.emit(json!({ "status": "logged_out", "redirect": Route::Login.path() }))
}

fn contact_update(args: ContactArgs) -> ProfileUpdate {
    ProfileUpdate {
        name: args.name,
        email: args.email,
        phone: args.phone,
        address: args.address,
    }
}

pub(crate) fn profile(app: &App<'_>, command: ProfileCommand) -> Result<()> {
    let profiles = ProfileService::new(app.store, app.backend);
    match command {
        ProfileCommand::Show => {
            app.require_route(Route::Profile)?;
            app.emit_value(&profiles.get_profile()?)
        }
        ProfileCommand::Update(contact) => {
            app.require_route(Route::Profile)?;
            let update = contact_update(contact);
            if update.is_empty() {
                bail!("nothing to update; pass --name, --email, --phone or --address");
            }
            app.emit_value(&profiles.update_profile(&update)?)
        }
        ProfileCommand::Avatar { file } => {
            app.require_route(Route::Profile)?;
            let (bytes, mime) = read_image(&file)?;
            let url = profiles.upload_avatar(&bytes, mime)?;
            app.emit(json!({ "avatarUrl": url }))
        }
        ProfileCommand::Owner => {
            app.require_route(Route::SupplierOwner)?;
            app.emit_value(&profiles.owner_contact()?)
        }
    }
}

pub(crate) fn supplier_profile(app: &App<'_>, command: SupplierProfileCommand) -> Result<()> {
    app.require_route(Route::SupplierPortal)?;
    let profiles = ProfileService::new(app.store, app.backend);
    match command {
        SupplierProfileCommand::Show => app.emit_value(&profiles.supplier_profile()?),
        SupplierProfileCommand::Update {
            contact,
            company,
            gst,
            notes,
        } => {
            let update = SupplierProfileUpdate {
                contact: contact_update(contact),
                company,
                gst,
                notes,
            };
            app.emit_value(&profiles.update_supplier_profile(&update)?)
        }
        SupplierProfileCommand::Photo { file } => {
            let (bytes, mime) = read_image(&file)?;
            app.emit_value(&profiles.upload_supplier_photo(&bytes, mime)?)
        }
    }
}

pub(crate) fn storage(app: &App<'_>, command: StorageCommand) -> Result<()> {
    match command {
        StorageCommand::Size => {
            let used = app.store.size_bytes()?;
            app.emit(json!({
                "usedBytes": used,
                "quotaBytes": app.store.quota_bytes(),
                "keys": app.store.keys()?,
            }))
        }
        StorageCommand::Clear => {
            app.require_permission(Permission::ClearLocalData)?;
            app.store
                .clear()
                .context("failed to clear local storage")?;
            info!("event=storage_clear module=cli status=ok");
            app.emit(json!({ "status": "cleared" }))
        }
    }
}
