//! Profile reads and edits, backend first with a local fallback.
//!
//! # Responsibility
//! - Call the profile endpoints and, when they are unreachable or missing,
//!   serve and persist the same data from the store.
//! - Keep the supplier profile (`supplier_profile_v1`) and the session user
//!   (`auth_user`) in step for offline edits.
//!
//! # Invariants
//! - Only fallback-eligible backend errors switch to local data; a 401 or
//!   a 4xx rejection is returned unchanged.
//! - Uploaded images fall back to `data:<mime>;base64,...` URLs.

use crate::backend::{Backend, BackendError, BackendResult};
use crate::model::supplier::{SupplierProfile, SupplierProfileUpdate};
use crate::model::user::{ProfileUpdate, Role, SessionUser};
use crate::service::{ServiceError, ServiceResult};
use crate::store::{read_json, write_json, KeyValueStore, AUTH_USER_KEY, SUPPLIER_PROFILE_KEY};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::warn;

const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

pub struct ProfileService<'b, S: KeyValueStore> {
    store: S,
    backend: &'b dyn Backend,
}

impl<'b, S: KeyValueStore> ProfileService<'b, S> {
    pub fn new(store: S, backend: &'b dyn Backend) -> Self {
        Self { store, backend }
    }

    /// Current user's profile.
    ///
    /// Offline, the stored user is returned; for suppliers it is enriched
    /// with the stored supplier profile, the stored user's fields winning.
    pub fn get_profile(&self) -> ServiceResult<SessionUser> {
        self.with_fallback("get_profile", self.backend.get_profile(), |err| {
            let Some(user) = self.stored_user()? else {
                return Err(err.into());
            };
            let supplier = self.stored_supplier_profile()?;
            Ok(match supplier {
                Some(profile) if user.has_role(Role::Supplier) || profile.is_supplier() => {
                    merge_supplier(user, &profile)
                }
                _ => user,
            })
        })
    }

    pub fn update_profile(&self, update: &ProfileUpdate) -> ServiceResult<SessionUser> {
        update.validate().map_err(ServiceError::Validation)?;
        let remote = self.backend.update_profile(update).map(|user| {
            self.refresh_session_user(&user);
            user
        });
        self.with_fallback("update_profile", remote, |err| {
            let Some(mut user) = self.stored_user()? else {
                return Err(err.into());
            };
            user.apply(update);
            write_json(&self.store, AUTH_USER_KEY, &user)?;
            if let Some(mut profile) = self.stored_supplier_profile()? {
                profile.apply_contact(update);
                write_json(&self.store, SUPPLIER_PROFILE_KEY, &profile)?;
            }
            Ok(user)
        })
    }

    /// Uploads an avatar and returns its URL.
    pub fn upload_avatar(&self, bytes: &[u8], mime: &str) -> ServiceResult<String> {
        validate_image(bytes, mime)?;
        self.with_fallback(
            "upload_avatar",
            self.backend.upload_avatar(bytes, mime),
            |err| {
                let Some(mut user) = self.stored_user()? else {
                    return Err(err.into());
                };
                let url = image_data_url(bytes, mime);
                user.avatar_url = Some(url.clone());
                write_json(&self.store, AUTH_USER_KEY, &user)?;
                if let Some(mut profile) = self.stored_supplier_profile()? {
                    profile.photo = Some(url.clone());
                    write_json(&self.store, SUPPLIER_PROFILE_KEY, &profile)?;
                }
                Ok(url)
            },
        )
    }

    /// Owner contact shown on the supplier portal. No local fallback.
    pub fn owner_contact(&self) -> ServiceResult<SessionUser> {
        Ok(self.backend.get_owner()?)
    }

    /// Supplier profile; offline the stored one, else a placeholder that is
    /// written on first use.
    pub fn supplier_profile(&self) -> ServiceResult<SupplierProfile> {
        self.with_fallback(
            "supplier_profile",
            self.backend.get_supplier_profile(),
            |_| self.local_supplier_profile(),
        )
    }

    pub fn update_supplier_profile(
        &self,
        update: &SupplierProfileUpdate,
    ) -> ServiceResult<SupplierProfile> {
        update.contact.validate().map_err(ServiceError::Validation)?;
        self.with_fallback(
            "update_supplier_profile",
            self.backend.update_supplier_profile(update),
            |_| {
                let mut profile = self.local_supplier_profile()?;
                profile.apply(update);
                write_json(&self.store, SUPPLIER_PROFILE_KEY, &profile)?;
                Ok(profile)
            },
        )
    }

    pub fn upload_supplier_photo(&self, bytes: &[u8], mime: &str) -> ServiceResult<SupplierProfile> {
        validate_image(bytes, mime)?;
        self.with_fallback(
            "upload_supplier_photo",
            self.backend.upload_supplier_photo(bytes, mime),
            |_| {
                let mut profile = self.local_supplier_profile()?;
                profile.photo = Some(image_data_url(bytes, mime));
                write_json(&self.store, SUPPLIER_PROFILE_KEY, &profile)?;
                Ok(profile)
            },
        )
    }

    fn with_fallback<T, F>(
        &self,
        operation: &'static str,
        remote: BackendResult<T>,
        local: F,
    ) -> ServiceResult<T>
    where
        F: FnOnce(BackendError) -> ServiceResult<T>,
    {
        match remote {
            Ok(value) => Ok(value),
            Err(err) if err.is_fallback_eligible() => {
                warn!(
                    "event=profile_fallback module=service status=degraded op={} error_code={}",
                    operation,
                    err.code()
                );
                local(err)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn stored_user(&self) -> ServiceResult<Option<SessionUser>> {
        Ok(read_json(&self.store, AUTH_USER_KEY)?)
    }

    fn stored_supplier_profile(&self) -> ServiceResult<Option<SupplierProfile>> {
        Ok(read_json(&self.store, SUPPLIER_PROFILE_KEY)?)
    }

    fn local_supplier_profile(&self) -> ServiceResult<SupplierProfile> {
        if let Some(profile) = self.stored_supplier_profile()? {
            return Ok(profile);
        }
        let profile = SupplierProfile::placeholder();
        write_json(&self.store, SUPPLIER_PROFILE_KEY, &profile)?;
        Ok(profile)
    }

    /// Keeps the header name in step after a successful remote edit.
    fn refresh_session_user(&self, user: &SessionUser) {
        if let Err(err) = write_json(&self.store, AUTH_USER_KEY, &user.essential()) {
            warn!(
                "event=profile_update module=service status=degraded reason=session_user_write error={}",
                err
            );
        }
    }
}

fn merge_supplier(user: SessionUser, profile: &SupplierProfile) -> SessionUser {
    SessionUser {
        id: user.id.or_else(|| profile.id.clone()),
        name: user.name.or_else(|| profile.name.clone()),
        email: user.email.or_else(|| profile.email.clone()),
        role: user.role.or(profile.role),
        phone: user.phone.or_else(|| profile.phone.clone()),
        address: user.address.or_else(|| profile.address.clone()),
        avatar_url: user.avatar_url.or_else(|| profile.photo.clone()),
    }
}

fn validate_image(bytes: &[u8], mime: &str) -> ServiceResult<()> {
    if bytes.is_empty() {
        return Err(ServiceError::Validation("image file is empty".to_string()));
    }
    if !mime.starts_with("image/") {
        return Err(ServiceError::Validation(format!(
            "`{mime}` is not an image type"
        )));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ServiceError::Validation(
            "image must be 2 MB or smaller".to_string(),
        ));
    }
    Ok(())
}

/// `data:<mime>;base64,<payload>` URL for an uploaded image.
pub fn image_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
