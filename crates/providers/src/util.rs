//! Shared utility functions for the HTTP adapters.

use wv_domain::config::AuthConfig;
use wv_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Build a `reqwest::Client` with the given request timeout.
pub fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(from_reqwest)
}

/// Resolve the API key from an [`AuthConfig`].
///
/// Precedence:
/// 1. `key` field (plaintext, warns)
/// 2. `service` + `account` → OS keychain via `keyring`
/// 3. `env` field (reads environment variable)
/// 4. Headless keychain fallback: env var `{SERVICE}_{ACCOUNT}` uppercased
/// 5. Error
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(ref key) = auth.key {
        tracing::warn!(
            "API key loaded from plaintext config field 'key'; \
             prefer 'env' or keychain instead"
        );
        return Ok(key.clone());
    }

    if let (Some(ref service), Some(ref account)) = (&auth.service, &auth.account) {
        match resolve_from_keychain(service, account) {
            Ok(secret) => return Ok(secret),
            Err(e) => {
                tracing::warn!(
                    service = %service,
                    account = %account,
                    error = %e,
                    "keychain lookup failed, falling through to env"
                );
            }
        }
    }

    if let Some(ref env_var) = auth.env {
        return std::env::var(env_var).map_err(|_| {
            Error::Auth(format!(
                "environment variable '{}' not set or not valid UTF-8",
                env_var
            ))
        });
    }

    if let (Some(ref service), Some(ref account)) = (&auth.service, &auth.account) {
        let fallback_var = keychain_fallback_env_name(service, account);
        if let Ok(val) = std::env::var(&fallback_var) {
            tracing::info!(
                env_var = %fallback_var,
                "API key resolved from keychain headless fallback env var"
            );
            return Ok(val);
        }
    }

    Err(Error::Auth(
        "no API key configured: set 'key', 'env', or keychain \
         'service'+'account'"
            .into(),
    ))
}

/// Like [`resolve_api_key`] but treats an empty [`AuthConfig`] as "no
/// credentials needed".
pub fn resolve_optional_key(auth: &AuthConfig) -> Result<Option<String>> {
    if auth.is_empty() {
        return Ok(None);
    }
    resolve_api_key(auth).map(Some)
}

/// Try to read a secret from the OS keychain.
pub fn resolve_from_keychain(service: &str, account: &str) -> Result<String> {
    let entry = keyring::Entry::new(service, account)
        .map_err(|e| Error::Auth(format!("keyring entry creation failed: {e}")))?;
    entry
        .get_password()
        .map_err(|e| Error::Auth(format!("keyring get_password failed: {e}")))
}

/// Store a secret in the OS keychain.
pub fn store_in_keychain(service: &str, account: &str, secret: &str) -> Result<()> {
    let entry = keyring::Entry::new(service, account)
        .map_err(|e| Error::Auth(format!("keyring entry creation failed: {e}")))?;
    entry
        .set_password(secret)
        .map_err(|e| Error::Auth(format!("keyring set_password failed: {e}")))
}

/// Build the headless fallback env var name for a keychain service/account.
///
/// Example: `("wave", "anthropic-api-key")` → `"WAVE_ANTHROPIC_API_KEY"`.
pub fn keychain_fallback_env_name(service: &str, account: &str) -> String {
    format!(
        "{}_{}",
        service.to_uppercase().replace('-', "_"),
        account.to_uppercase().replace('-', "_"),
    )
}

/// Join a base URL and a path without doubling slashes.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_env_name_basic() {
        assert_eq!(
            keychain_fallback_env_name("wave", "anthropic-api-key"),
            "WAVE_ANTHROPIC_API_KEY"
        );
    }

    #[test]
    fn plaintext_key_wins() {
        let auth = AuthConfig {
            key: Some("plaintext-wins".into()),
            env: Some("WV_TEST_SHOULD_NOT_BE_READ".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "plaintext-wins");
    }

    #[test]
    fn env_var_is_read() {
        let var_name = "WV_TEST_RESOLVE_ENV_KEY_4321";
        std::env::set_var(var_name, "env-secret");
        let auth = AuthConfig {
            env: Some(var_name.into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "env-secret");
        std::env::remove_var(var_name);
    }

    #[test]
    fn missing_env_var_names_the_variable() {
        let auth = AuthConfig {
            env: Some("WV_TEST_NONEXISTENT_VAR_8888".into()),
            ..Default::default()
        };
        let err = resolve_api_key(&auth).unwrap_err();
        assert!(err.to_string().contains("WV_TEST_NONEXISTENT_VAR_8888"));
    }

    #[test]
    fn keychain_falls_back_to_env_when_headless() {
        let fallback_var = "WVTEST_HEADLESS_PROVIDER";
        std::env::set_var(fallback_var, "fallback-secret");
        let auth = AuthConfig {
            service: Some("wvtest".into()),
            account: Some("headless-provider".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "fallback-secret");
        std::env::remove_var(fallback_var);
    }

    #[test]
    fn empty_auth_is_optional() {
        assert_eq!(resolve_optional_key(&AuthConfig::default()).unwrap(), None);
    }

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://a/", "/b"), "http://a/b");
        assert_eq!(join_url("http://a", "b/c"), "http://a/b/c");
    }
}
