//! Tenant credential lookup.
//!
//! Tokens are issued and refreshed by an external broker. The engine only
//! reads them, once per run. An expired token is returned as a flag, not an
//! error: the run proceeds and upstream calls fail on their own.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::error::CredentialError;

/// Platform account identifiers attached to a tenant's connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlatformAccounts {
    #[serde(default)]
    pub instagram_business_account_id: Option<String>,
    #[serde(default)]
    pub facebook_page_id: Option<String>,
    #[serde(default)]
    pub ad_account_id: Option<String>,
}

#[derive(Clone)]
pub struct TenantCredentials {
    pub access_token: String,
    pub token_expired: bool,
    pub accounts: PlatformAccounts,
}

impl std::fmt::Debug for TenantCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantCredentials")
            .field("access_token", &"[redacted]")
            .field("token_expired", &self.token_expired)
            .field("accounts", &self.accounts)
            .finish()
    }
}

/// Source of per-tenant access tokens.
pub trait CredentialSource {
    /// Looks up the token and account ids for `tenant_id` on `platform`.
    ///
    /// Implementations return [`CredentialError::Unavailable`] when the
    /// tenant has no token at all.
    fn resolve(
        &self,
        tenant_id: &str,
        platform: &str,
    ) -> impl Future<Output = Result<TenantCredentials, CredentialError>> + Send;
}

#[derive(Debug, Deserialize)]
struct BrokerResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_expired: bool,
    #[serde(default)]
    platform_metadata: PlatformAccounts,
}

/// Reads credentials from the broker's
/// `GET {base}/credentials/{tenant_id}?platform={platform}` endpoint.
#[derive(Clone)]
pub struct BrokerCredentialSource {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl BrokerCredentialSource {
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidBrokerUrl`] if `base_url` does not
    /// parse as a hierarchical URL, or [`CredentialError::Http`] if the
    /// HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        bearer_token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, CredentialError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("nestsync/0.1 (credential-lookup)")
            .build()?;

        let parsed = Url::parse(base_url).map_err(|e| CredentialError::InvalidBrokerUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(CredentialError::InvalidBrokerUrl {
                url: base_url.to_owned(),
                reason: "URL cannot carry a path".to_owned(),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
            bearer_token,
        })
    }

    fn lookup_url(&self, tenant_id: &str, platform: &str) -> Result<Url, CredentialError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CredentialError::InvalidBrokerUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot carry a path".to_owned(),
            })?
            .pop_if_empty()
            .push("credentials")
            .push(tenant_id);
        url.query_pairs_mut().append_pair("platform", platform);
        Ok(url)
    }
}

impl CredentialSource for BrokerCredentialSource {
    async fn resolve(
        &self,
        tenant_id: &str,
        platform: &str,
    ) -> Result<TenantCredentials, CredentialError> {
        let url = self.lookup_url(tenant_id, platform)?;
        let mut request = self.client.get(url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(CredentialError::Unavailable {
                tenant_id: tenant_id.to_owned(),
                reason: format!("no {platform} connection on record"),
            });
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(CredentialError::Broker {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: BrokerResponse =
            serde_json::from_str(&body).map_err(|e| CredentialError::Deserialize {
                context: format!("credentials for tenant {tenant_id}"),
                source: e,
            })?;

        let access_token = parsed
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| CredentialError::Unavailable {
                tenant_id: tenant_id.to_owned(),
                reason: "broker returned no access token".to_owned(),
            })?;

        Ok(TenantCredentials {
            access_token,
            token_expired: parsed.token_expired,
            accounts: parsed.platform_metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_url_appends_encoded_tenant_segment() {
        let source = BrokerCredentialSource::new("http://broker.local/api/", None, 5)
            .expect("valid broker url");
        let url = source
            .lookup_url("tenant a/b", "meta")
            .expect("lookup url");

        assert_eq!(
            url.as_str(),
            "http://broker.local/api/credentials/tenant%20a%2Fb?platform=meta"
        );
    }

    #[test]
    fn rejects_non_hierarchical_base() {
        let result = BrokerCredentialSource::new("mailto:ops@example.com", None, 5);
        assert!(matches!(
            result,
            Err(CredentialError::InvalidBrokerUrl { .. })
        ));
    }

    #[test]
    fn debug_redacts_access_token() {
        let creds = TenantCredentials {
            access_token: "EAAB-secret".to_owned(),
            token_expired: false,
            accounts: PlatformAccounts::default(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("EAAB-secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
