//! Shared types used across channel adapters.

use serde::{Deserialize, Serialize};
use staylink_db::models::{ChannelIntegration, ChannelType};

/// Outcome of probing a channel's API with the integration's credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTest {
    /// Whether the channel accepted the credentials.
    pub success: bool,
    /// Error detail when the probe failed.
    pub error: Option<String>,
}

impl ConnectionTest {
    /// A successful probe.
    #[must_use]
    pub fn ok() -> Self {
        ConnectionTest {
            success: true,
            error: None,
        }
    }

    /// A failed probe with detail.
    pub fn failed(error: impl Into<String>) -> Self {
        ConnectionTest {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Descriptive information about a channel, for listing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelInfo {
    pub channel_type: ChannelType,
    pub display_name: &'static str,
    pub features: &'static [&'static str],
}

/// A credential field an adapter requires on the integration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialField {
    ApiKey,
    ApiSecret,
    AccessToken,
    Username,
    Password,
    PropertyId,
}

impl CredentialField {
    /// Column name of the field on the integration record.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialField::ApiKey => "api_key",
            CredentialField::ApiSecret => "api_secret",
            CredentialField::AccessToken => "access_token",
            CredentialField::Username => "channel_username",
            CredentialField::Password => "channel_password",
            CredentialField::PropertyId => "channel_property_id",
        }
    }

    /// Read this field's value off an integration record. Blank strings
    /// count as absent.
    #[must_use]
    pub fn value_of<'a>(&self, integration: &'a ChannelIntegration) -> Option<&'a str> {
        let value = match self {
            CredentialField::ApiKey => integration.api_key.as_deref(),
            CredentialField::ApiSecret => integration.api_secret.as_deref(),
            CredentialField::AccessToken => integration.access_token.as_deref(),
            CredentialField::Username => integration.channel_username.as_deref(),
            CredentialField::Password => integration.channel_password.as_deref(),
            CredentialField::PropertyId => integration.channel_property_id.as_deref(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

impl std::fmt::Display for CredentialField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
