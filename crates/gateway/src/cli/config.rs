use anyhow::Context;

use wv_domain::config::{Config, ConfigSeverity};

/// Parse and validate the config, printing any issues.
///
/// Returns `false` when error-level issues were found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!("\n{error_count} error(s), {warning_count} warning(s) in {config_path}");

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let output = toml::to_string_pretty(config).context("serializing config")?;
    print!("{output}");
    Ok(())
}

/// Prompt for a provider key and store it in the OS keychain under the
/// provider's `auth.service` / `auth.account`.
pub fn set_secret(config: &Config, provider_id: &str) -> anyhow::Result<()> {
    let provider = config
        .llm
        .providers
        .iter()
        .find(|p| p.id == provider_id)
        .ok_or_else(|| anyhow::anyhow!("no provider \"{provider_id}\" in config"))?;
    let (Some(service), Some(account)) = (&provider.auth.service, &provider.auth.account) else {
        anyhow::bail!(
            "provider \"{provider_id}\" has no auth.service / auth.account; \
             add them to use the keychain"
        );
    };

    let secret = rpassword::prompt_password_stderr(&format!("API key for {provider_id}: "))
        .context("reading API key")?;
    let secret = secret.trim();
    if secret.is_empty() {
        anyhow::bail!("empty key, nothing stored");
    }

    keyring::Entry::new(service, account)
        .and_then(|entry| entry.set_password(secret))
        .context("writing to the OS keychain")?;
    println!("Stored key for {provider_id} in keychain ({service}/{account}).");
    Ok(())
}
