use std::env;

use thiserror::Error;

/// Runtime configuration, read once at startup and passed into the server
/// builder. There is no global config singleton; everything that needs a
/// value gets it from here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the external identity + database provider.
    pub identity_url: String,
    /// Anon key, used only for end-user auth calls (signup, signin).
    pub identity_anon_key: String,
    /// Service-role key, used only for server-authoritative data calls.
    pub identity_admin_key: String,
    /// Symmetric secret for signing session tokens.
    pub token_secret: String,
    /// E-mail suffix gating registration, e.g. `@example.com`.
    pub permitted_email_domain: String,
    /// Listening port.
    pub port: u16,
    /// Single allowed CORS origin; `None` means permissive.
    pub cors_origin: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup. `from_env` wires
    /// this to the process environment; tests supply a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(ConfigError::MissingVar(name)),
            }
        };

        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidVar {
                name: "PORT",
                value: raw,
            })?,
            None => 3000,
        };

        Ok(Self {
            identity_url: required("IDENTITY_URL")?.trim_end_matches('/').to_string(),
            identity_anon_key: required("IDENTITY_ANON_KEY")?,
            identity_admin_key: required("IDENTITY_ADMIN_KEY")?,
            token_secret: required("TOKEN_SECRET")?,
            permitted_email_domain: required("PERMITTED_EMAIL_DOMAIN")?,
            port,
            cors_origin: lookup("CORS_ORIGIN").filter(|v| !v.trim().is_empty()),
        })
    }
}
