//! Account profile operations.

use serde::{Deserialize, Serialize};

use crate::api::{Api, ApiError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub profile_image: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
}

/// Fetch the authenticated account's profile.
pub async fn fetch(api: &Api) -> Result<Profile, ApiError> {
    api.profile().await
}

/// Update profile names, then optionally replace the profile image, then
/// re-fetch so the caller sees the backend's view of the result.
pub async fn update(
    api: &Api,
    update: &ProfileUpdate,
    image: Option<(Vec<u8>, &str, &str)>,
) -> Result<Profile, ApiError> {
    api.update_profile(update).await?;

    if let Some((bytes, file_name, content_type)) = image {
        api.update_profile_image(bytes, file_name, content_type)
            .await?;
    }

    api.profile().await
}
