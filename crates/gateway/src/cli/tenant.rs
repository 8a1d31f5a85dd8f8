//! `wave tenant …`: provision and inspect tenant records.

use anyhow::Context;

use wv_domain::config::Config;
use wv_domain::tenant::TenantConfig;

use crate::tenants::TenantStore;

/// Outcome of `tenant create`. `Skipped` maps to exit code 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Skipped,
}

fn open_store(config: &Config) -> anyhow::Result<TenantStore> {
    TenantStore::open(&config.storage.state_path, config.tenant_defaults.clone())
        .context("opening tenant table")
}

pub fn create(
    config: &Config,
    tenant_key: &str,
    name: &str,
    force: bool,
) -> anyhow::Result<CreateOutcome> {
    let store = open_store(config)?;
    create_in(&store, tenant_key, name, force, confirm)
}

/// Write a fresh record. An existing record is only replaced with `force`
/// or when `confirm_overwrite` agrees.
pub fn create_in(
    store: &TenantStore,
    tenant_key: &str,
    name: &str,
    force: bool,
    confirm_overwrite: impl FnOnce(&str) -> anyhow::Result<bool>,
) -> anyhow::Result<CreateOutcome> {
    if tenant_key.trim().is_empty() {
        anyhow::bail!("tenant key must not be empty");
    }
    if !force && store.exists(tenant_key) {
        let question = format!("A config for {tenant_key} already exists. Overwrite it? [y/N] ");
        if !confirm_overwrite(&question)? {
            println!("Config creation skipped. Use the `--force` option to overwrite.");
            return Ok(CreateOutcome::Skipped);
        }
    }

    store
        .put(TenantConfig::new(tenant_key, name))
        .context("writing tenant config")?;
    println!("Config created.");
    Ok(CreateOutcome::Created)
}

/// Print the record with defaults applied, secrets masked.
pub fn show(config: &Config, tenant_key: &str) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let mut cfg = store
        .get(tenant_key)
        .ok_or_else(|| anyhow::anyhow!("no tenant config for {tenant_key}"))?;
    cfg.speech.api_key = cfg.speech.api_key.as_deref().map(mask);
    println!("{}", serde_json::to_string_pretty(&cfg)?);
    Ok(())
}

pub fn set_speech_key(config: &Config, tenant_key: &str) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let key = rpassword::prompt_password_stderr("Speech API key: ").context("reading key")?;
    store_speech_key(&store, tenant_key, key.trim())?;
    println!("Speech key stored for {tenant_key}.");
    Ok(())
}

pub fn store_speech_key(store: &TenantStore, tenant_key: &str, key: &str) -> anyhow::Result<()> {
    if key.is_empty() {
        anyhow::bail!("empty key, nothing stored");
    }
    let mut cfg = store
        .get_raw(tenant_key)
        .ok_or_else(|| anyhow::anyhow!("no tenant config for {tenant_key}"))?;
    cfg.speech.api_key = Some(key.to_owned());
    store.put(cfg).context("writing tenant config")?;
    Ok(())
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    let mut rl = rustyline::DefaultEditor::new()?;
    match rl.readline(question) {
        Ok(answer) => Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")),
        Err(rustyline::error::ReadlineError::Interrupted)
        | Err(rustyline::error::ReadlineError::Eof) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn mask(secret: &str) -> String {
    let n = secret.chars().count();
    if n <= 4 {
        return "****".into();
    }
    let tail: String = secret.chars().skip(n - 4).collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wv_domain::config::TenantDefaultsConfig;

    const KEY: &str = "arn:aws:social-messaging:eu-west-1:1:phone-number-id/pn-1";

    fn store() -> TenantStore {
        TenantStore::in_memory(TenantDefaultsConfig::default())
    }

    #[test]
    fn first_create_does_not_ask() {
        let store = store();
        let outcome = create_in(&store, KEY, "Demo", false, |_| {
            panic!("should not prompt for a new tenant")
        })
        .unwrap();
        assert_eq!(outcome, CreateOutcome::Created);
        assert_eq!(store.get(KEY).unwrap().name, "Demo");
    }

    #[test]
    fn declined_overwrite_keeps_the_record() {
        let store = store();
        create_in(&store, KEY, "Old", true, |_| Ok(true)).unwrap();
        let outcome = create_in(&store, KEY, "New", false, |_| Ok(false)).unwrap();
        assert_eq!(outcome, CreateOutcome::Skipped);
        assert_eq!(store.get(KEY).unwrap().name, "Old");
    }

    #[test]
    fn force_overwrites_without_asking() {
        let store = store();
        create_in(&store, KEY, "Old", false, |_| Ok(true)).unwrap();
        create_in(&store, KEY, "New", true, |_| panic!("no prompt with --force")).unwrap();
        assert_eq!(store.get(KEY).unwrap().name, "New");
    }

    #[test]
    fn speech_key_needs_an_existing_record() {
        let store = store();
        assert!(store_speech_key(&store, KEY, "sk-123").is_err());
        create_in(&store, KEY, "Demo", false, |_| Ok(true)).unwrap();
        store_speech_key(&store, KEY, "sk-123").unwrap();
        assert_eq!(
            store.get_raw(KEY).unwrap().speech.api_key.as_deref(),
            Some("sk-123")
        );
    }

    #[test]
    fn masking_keeps_the_tail() {
        assert_eq!(mask("sk-abcdef1234"), "****1234");
        assert_eq!(mask("abc"), "****");
    }
}
