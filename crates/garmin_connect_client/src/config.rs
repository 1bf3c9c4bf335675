use crate::GarminError;
use secrecy::SecretString;

pub const DEFAULT_BASE_URL: &str = "https://connectapi.garmin.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub email: String,
    pub password: SecretString,
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, GarminError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function. This avoids mutating global environment in tests and keeps
    /// `from_env()` small and safe.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, GarminError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let email =
            get("GARMIN_EMAIL").ok_or_else(|| GarminError::Config("GARMIN_EMAIL missing".into()))?;
        let password = get("GARMIN_PASSWORD")
            .ok_or_else(|| GarminError::Config("GARMIN_PASSWORD missing".into()))?;
        let base_url = get("GARMIN_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        Ok(Self {
            email,
            password: SecretString::new(password.into()),
            base_url,
        })
    }
}
