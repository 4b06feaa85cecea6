//! Service catalog and promotional banners.

use serde::{Deserialize, Serialize};

use crate::api::{Api, ApiError};

/// A payable service, priced by its tariff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub service_code: String,
    pub service_name: String,
    #[serde(default)]
    pub service_icon: String,
    pub service_tariff: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    pub banner_name: String,
    #[serde(default)]
    pub banner_image: String,
    #[serde(default)]
    pub description: String,
}

pub async fn services(api: &Api) -> Result<Vec<Service>, ApiError> {
    api.services().await
}

pub async fn banners(api: &Api) -> Result<Vec<Banner>, ApiError> {
    api.banners().await
}

/// Look up a service in a fetched catalog by its code.
pub fn find_service<'a>(catalog: &'a [Service], code: &str) -> Option<&'a Service> {
    catalog.iter().find(|s| s.service_code == code)
}
