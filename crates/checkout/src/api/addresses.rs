//! Address-book endpoints. All require a signed-in shopper.

use segishop_core::{AddressId, Country, SavedAddress};
use tracing::instrument;

use super::types::{
    AddressValidationResponse, CreateUserAddressRequest, PostalSuggestionsResponse,
    UpdateUserAddressRequest, UserAddressResponse, UserAddressesResponse,
};
use super::{ApiClient, ApiError, rejected};

/// Shipping-zone lookup for an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneCheck {
    pub is_valid: bool,
    pub message: Option<String>,
    pub zone_id: Option<i32>,
    pub zone_name: Option<String>,
}

/// Postal code completions for a partial entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalSuggestions {
    pub suggestions: Vec<String>,
    pub is_valid_format: bool,
    pub message: Option<String>,
}

impl ApiClient {
    /// List the shopper's active addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for guests, or another error if the
    /// request fails.
    #[instrument(skip(self))]
    pub async fn list_addresses(&self) -> Result<Vec<SavedAddress>, ApiError> {
        let url = self.endpoint("useraddress")?;
        let response: UserAddressesResponse = self.get(url).await?;
        if !response.success {
            return Err(rejected(response.error_message, "Failed to load addresses"));
        }

        let mut addresses: Vec<SavedAddress> = response
            .addresses
            .into_iter()
            .filter(|address| address.is_active)
            .collect();
        addresses.sort_by_key(|address| !address.is_default);
        Ok(addresses)
    }

    /// Fetch one address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the address does not exist.
    #[instrument(skip(self))]
    pub async fn get_address(&self, id: AddressId) -> Result<SavedAddress, ApiError> {
        let url = self.endpoint(&format!("useraddress/{id}"))?;
        let response: UserAddressResponse = self.get(url).await?;
        address_from(response, "Address not found")
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, request), fields(zip = %request.zip_code))]
    pub async fn create_address(
        &self,
        request: &CreateUserAddressRequest,
    ) -> Result<SavedAddress, ApiError> {
        let url = self.endpoint("useraddress")?;
        let response: UserAddressResponse = self.post(url, request).await?;
        address_from(response, "Failed to create address")
    }

    /// Update some fields of an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, request))]
    pub async fn update_address(
        &self,
        id: AddressId,
        request: &UpdateUserAddressRequest,
    ) -> Result<SavedAddress, ApiError> {
        let url = self.endpoint(&format!("useraddress/{id}"))?;
        let response: UserAddressResponse = self.put(url, request).await?;
        address_from(response, "Failed to update address")
    }

    /// Make an address the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn set_default_address(&self, id: AddressId) -> Result<SavedAddress, ApiError> {
        let request = UpdateUserAddressRequest {
            is_default: Some(true),
            ..UpdateUserAddressRequest::default()
        };
        self.update_address(id, &request).await
    }

    /// Remove an address (the backend soft-deletes it).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn delete_address(&self, id: AddressId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("useraddress/{id}"))?;
        let response: UserAddressResponse = self.delete(url).await?;
        if response.success {
            Ok(())
        } else {
            Err(rejected(
                response.message.or(response.error_message),
                "Failed to delete address",
            ))
        }
    }

    /// Look up the shipping zone for an address before saving it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, request), fields(zip = %request.zip_code))]
    pub async fn validate_address(
        &self,
        request: &CreateUserAddressRequest,
    ) -> Result<ZoneCheck, ApiError> {
        let url = self.endpoint("useraddress/validate")?;
        let response: AddressValidationResponse = self.post(url, request).await?;
        if !response.success {
            return Err(rejected(response.error_message, "Failed to validate address"));
        }
        Ok(ZoneCheck {
            is_valid: response.is_valid,
            message: response.message,
            zone_id: response.shipping_zone_id,
            zone_name: response.shipping_zone_name,
        })
    }

    /// Suggest postal codes that complete `partial`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn postal_suggestions(
        &self,
        partial: &str,
        country: &Country,
        state: Option<&str>,
    ) -> Result<PostalSuggestions, ApiError> {
        let mut url = self.endpoint("useraddress/postal-suggestions")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("partialCode", partial.trim())
                .append_pair("country", country.code());
            if let Some(state) = state.map(str::trim).filter(|s| !s.is_empty()) {
                query.append_pair("state", state);
            }
        }

        let response: PostalSuggestionsResponse = self.get(url).await?;
        Ok(PostalSuggestions {
            suggestions: response.suggestions,
            is_valid_format: response.success && response.is_valid_format,
            message: response.message,
        })
    }
}

fn address_from(response: UserAddressResponse, fallback: &str) -> Result<SavedAddress, ApiError> {
    if !response.success {
        return Err(rejected(response.message.or(response.error_message), fallback));
    }
    response.address.ok_or(ApiError::EmptyBody("address"))
}
