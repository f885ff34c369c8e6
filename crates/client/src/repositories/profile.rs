//! Profile repository.

use tracing::instrument;

use craftly_core::validation::{require_length, validate_display_name};
use craftly_core::{ShippingAddress, UserId};

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{Profile, ProfileUpdate, PublicProfile};
use crate::repositories::rejected;

/// Profile reads and edits.
#[derive(Clone)]
pub struct ProfileRepository {
    client: ApiClient,
}

impl ProfileRepository {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The caller's own profile.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<Profile, ClientError> {
        self.client.get("/api/profile").await
    }

    /// Another user's public profile.
    ///
    /// # Errors
    ///
    /// `Api` 404 for an unknown user.
    #[instrument(skip(self))]
    pub async fn public(&self, user_id: UserId) -> Result<PublicProfile, ClientError> {
        self.client.get(&format!("/api/profile/{user_id}")).await
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad display name, phone or bio.
    #[instrument(skip(self, update))]
    pub async fn update(&self, update: &ProfileUpdate) -> Result<Profile, ClientError> {
        if let Some(name) = &update.display_name {
            validate_display_name(name).map_err(rejected)?;
        }
        if let Some(phone) = &update.phone {
            require_length("phone", phone, 0, 30).map_err(rejected)?;
        }
        if let Some(bio) = &update.bio {
            require_length("bio", bio, 0, 1000).map_err(rejected)?;
        }
        self.client.put("/api/profile", update).await
    }

    /// Save the default shipping address.
    ///
    /// # Errors
    ///
    /// `Validation` for an incomplete address.
    #[instrument(skip(self, address))]
    pub async fn set_address(&self, address: &ShippingAddress) -> Result<Profile, ClientError> {
        address.validate().map_err(rejected)?;
        self.client.put("/api/profile/address", address).await
    }
}
