//! Tenant config table and accessor.
//!
//! Records are stored as written by `wave tenant create`; deployment
//! defaults from `[tenant_defaults]` are filled in on every read so a
//! record never needs rewriting when a default changes.

use std::path::Path;

use wv_domain::config::TenantDefaultsConfig;
use wv_domain::error::Result;
use wv_domain::tenant::TenantConfig;
use wv_sessions::JsonTable;

pub struct TenantStore {
    table: JsonTable<TenantConfig>,
    defaults: TenantDefaultsConfig,
}

impl TenantStore {
    /// Open `tenants.json` under the state path.
    pub fn open(state_path: &Path, defaults: TenantDefaultsConfig) -> Result<Self> {
        Ok(Self {
            table: JsonTable::open(&state_path.join("tenants.json"))?,
            defaults,
        })
    }

    pub fn in_memory(defaults: TenantDefaultsConfig) -> Self {
        Self {
            table: JsonTable::in_memory(),
            defaults,
        }
    }

    /// The tenant's config with defaults applied, or `None` when the key
    /// has no record.
    pub fn get(&self, tenant_key: &str) -> Option<TenantConfig> {
        let mut cfg = self.table.get(tenant_key)?;
        cfg.apply_defaults(&self.defaults);
        Some(cfg)
    }

    /// The record exactly as stored.
    pub fn get_raw(&self, tenant_key: &str) -> Option<TenantConfig> {
        self.table.get(tenant_key)
    }

    pub fn exists(&self, tenant_key: &str) -> bool {
        self.table.get(tenant_key).is_some()
    }

    /// Insert or replace a record. Last write wins.
    pub fn put(&self, cfg: TenantConfig) -> Result<()> {
        let key = cfg.tenant_key.clone();
        self.table.put(&key, cfg)?;
        tracing::info!(tenant_key = %key, "tenant config stored");
        Ok(())
    }

    pub fn defaults(&self) -> &TenantDefaultsConfig {
        &self.defaults
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn flush(&self) -> Result<()> {
        self.table.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARN: &str = "arn:aws:social-messaging:eu-west-1:1:phone-number-id/pn-1";

    fn defaults() -> TenantDefaultsConfig {
        TenantDefaultsConfig {
            knowledge_base_id: Some("KB-DEFAULT".into()),
            system_prompt: Some("Sei un clone.".into()),
            speech_api_key: None,
            voice_id: Some("voice-1".into()),
        }
    }

    #[test]
    fn reads_fill_defaults_without_rewriting() {
        let store = TenantStore::in_memory(defaults());
        let mut cfg = TenantConfig::new(ARN, "Acme Srl");
        cfg.generation.knowledge_base_id = Some("KB-OWN".into());
        store.put(cfg).unwrap();

        let got = store.get(ARN).unwrap();
        assert_eq!(got.generation.knowledge_base_id.as_deref(), Some("KB-OWN"));
        assert_eq!(got.generation.system_prompt.as_deref(), Some("Sei un clone."));
        assert_eq!(got.speech.voice_id.as_deref(), Some("voice-1"));

        let raw = store.get_raw(ARN).unwrap();
        assert!(raw.generation.system_prompt.is_none());
    }

    #[test]
    fn unknown_tenant_is_none() {
        let store = TenantStore::in_memory(defaults());
        assert!(store.get("arn:missing").is_none());
        assert!(!store.exists("arn:missing"));
    }

    #[test]
    fn records_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = TenantStore::open(dir.path(), defaults()).unwrap();
            store.put(TenantConfig::new(ARN, "Acme Srl")).unwrap();
        }
        let store = TenantStore::open(dir.path(), defaults()).unwrap();
        assert_eq!(store.get(ARN).unwrap().name, "Acme Srl");
    }
}
