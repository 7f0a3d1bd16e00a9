use std::fmt;
use thiserror::Error;

/// Reasons a device location subscription can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationError {
    PermissionDenied,
    Unavailable,
    Timeout,
}

impl fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeolocationError::PermissionDenied => write!(f, "location permission denied"),
            GeolocationError::Unavailable => write!(f, "location unavailable"),
            GeolocationError::Timeout => write!(f, "location request timed out"),
        }
    }
}

impl std::error::Error for GeolocationError {}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Routing service error: {0}")]
    Routing(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Geolocation error: {0}")]
    Geolocation(#[from] GeolocationError),

    #[error("Inventory error: {0}")]
    Inventory(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Non-fatal message suitable for a toast or banner.
    ///
    /// Nothing in the navigation core terminates a session; every error ends
    /// up as one of these advisories.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Routing(ref e) => {
                tracing::warn!("Routing service error: {}", e);
                "Could not compute the optimal route, showing straight lines".to_string()
            }
            AppError::Http(ref e) => {
                tracing::warn!("HTTP error: {}", e);
                "Could not compute the optimal route, showing straight lines".to_string()
            }
            AppError::InvalidRequest(ref e) => e.clone(),
            AppError::Geolocation(ref e) => {
                tracing::info!("Geolocation error: {}", e);
                match e {
                    GeolocationError::PermissionDenied => {
                        "Location access was denied. Allow location access and try again"
                            .to_string()
                    }
                    GeolocationError::Unavailable => {
                        "Your location is currently unavailable. Try again".to_string()
                    }
                    GeolocationError::Timeout => {
                        "Locating you took too long. Try again".to_string()
                    }
                }
            }
            AppError::Inventory(ref e) => {
                tracing::warn!("Inventory error: {}", e);
                "Billboards could not be loaded".to_string()
            }
            AppError::Cache(ref e) => {
                tracing::debug!("Cache error: {}", e);
                "Temporary storage error".to_string()
            }
            AppError::Serialization(ref e) => {
                tracing::warn!("Serialization error: {}", e);
                "Data could not be read".to_string()
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                "Something went wrong".to_string()
            }
        }
    }

    /// Whether the user can reasonably retry the action that failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Routing(_) | AppError::Http(_) | AppError::Geolocation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
