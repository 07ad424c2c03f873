use roomclip_core::DEFAULT_BACKEND_URL;
use thiserror::Error;
use url::Url;

pub const MAX_BACKEND_URL_LEN: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub backend_url: Url,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Please fix the following:\n\n- {}", .0.join("\n- "))]
    Invalid(Vec<String>),
}

impl ClientConfig {
    pub fn from_backend_url(raw: &str) -> Result<Self, ConfigError> {
        let mut errors: Vec<String> = Vec::new();
        let mut parsed = None;

        let backend_url = raw.trim();
        if backend_url.is_empty() {
            errors.push("Backend URL is required.".to_string());
        } else if backend_url.len() > MAX_BACKEND_URL_LEN {
            errors.push(format!(
                "Backend URL is too long ({} > {} chars).",
                backend_url.len(),
                MAX_BACKEND_URL_LEN
            ));
        } else {
            match Url::parse(backend_url) {
                Ok(url) => {
                    let scheme = url.scheme();
                    if scheme != "http" && scheme != "https" {
                        errors.push("Backend URL must start with http:// or https://.".to_string());
                    } else if url.query().is_some() || url.fragment().is_some() {
                        errors.push("Backend URL must not carry a query or fragment.".to_string());
                    } else {
                        parsed = Some(url);
                    }
                }
                Err(err) => {
                    errors.push(format!("Backend URL is invalid: {err}"));
                }
            }
        }

        match parsed {
            Some(backend_url) if errors.is_empty() => Ok(Self { backend_url }),
            _ => Err(ConfigError::Invalid(errors)),
        }
    }

    pub fn local_default() -> Result<Self, ConfigError> {
        Self::from_backend_url(DEFAULT_BACKEND_URL)
    }
}
