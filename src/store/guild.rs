//! Per-guild party link settings, persisted as JSON.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::common::error::StoreError;
use crate::link::decision::GuildPolicy;

/// Settings for one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    pub policy: GuildPolicy,
    /// Roles whose members may post party links freely.
    #[serde(default)]
    pub immune_roles: Vec<u64>,
}

impl GuildSettings {
    pub fn new(policy: GuildPolicy) -> Self {
        Self {
            policy,
            immune_roles: Vec::new(),
        }
    }

    /// True if any of `roles` is immune.
    pub fn is_immune(&self, roles: &[u64]) -> bool {
        self.immune_roles.iter().any(|r| roles.contains(r))
    }
}

/// Guild settings keyed by guild id.
///
/// Guilds without stored settings get the configured defaults. Changes
/// are written to disk immediately.
#[derive(Debug)]
pub struct PolicyStore {
    path: Option<PathBuf>,
    defaults: GuildPolicy,
    guilds: RwLock<HashMap<u64, GuildSettings>>,
}

impl PolicyStore {
    /// Load settings from `path`. A missing file is an empty store.
    pub async fn load(path: impl AsRef<Path>, defaults: GuildPolicy) -> Result<Self, StoreError> {
        let path = path.as_ref();

        let guilds = match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No guild settings at {}, starting empty", path.display());
                HashMap::new()
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        info!("Loaded party link settings for {} guilds", guilds.len());

        Ok(Self {
            path: Some(path.to_path_buf()),
            defaults,
            guilds: RwLock::new(guilds),
        })
    }

    /// A store that is never written to disk.
    pub fn in_memory(defaults: GuildPolicy) -> Self {
        Self {
            path: None,
            defaults,
            guilds: RwLock::new(HashMap::new()),
        }
    }

    pub async fn settings(&self, guild_id: u64) -> GuildSettings {
        self.guilds
            .read()
            .await
            .get(&guild_id)
            .cloned()
            .unwrap_or_else(|| GuildSettings::new(self.defaults))
    }

    /// Change a guild's policy and return the result.
    pub async fn update_policy(
        &self,
        guild_id: u64,
        update: impl FnOnce(&mut GuildPolicy),
    ) -> Result<GuildPolicy, StoreError> {
        let mut guilds = self.guilds.write().await;
        let settings = guilds
            .entry(guild_id)
            .or_insert_with(|| GuildSettings::new(self.defaults));
        update(&mut settings.policy);
        let policy = settings.policy;

        self.persist(&guilds).await?;
        Ok(policy)
    }

    /// Add an immune role. Returns `false` if it was already immune.
    pub async fn add_immune_role(&self, guild_id: u64, role_id: u64) -> Result<bool, StoreError> {
        let mut guilds = self.guilds.write().await;
        let settings = guilds
            .entry(guild_id)
            .or_insert_with(|| GuildSettings::new(self.defaults));
        if settings.immune_roles.contains(&role_id) {
            return Ok(false);
        }
        settings.immune_roles.push(role_id);

        self.persist(&guilds).await?;
        Ok(true)
    }

    /// Remove an immune role. Returns `false` if it was never immune.
    pub async fn remove_immune_role(
        &self,
        guild_id: u64,
        role_id: u64,
    ) -> Result<bool, StoreError> {
        let mut guilds = self.guilds.write().await;
        let Some(settings) = guilds.get_mut(&guild_id) else {
            return Ok(false);
        };
        let before = settings.immune_roles.len();
        settings.immune_roles.retain(|&r| r != role_id);
        if settings.immune_roles.len() == before {
            return Ok(false);
        }

        self.persist(&guilds).await?;
        Ok(true)
    }

    async fn persist(&self, guilds: &HashMap<u64, GuildSettings>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(guilds)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;

        debug!("Saved party link settings to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_unknown_guild_gets_defaults() {
        let defaults = GuildPolicy {
            tdm_delete: true,
            ..GuildPolicy::default()
        };
        let store = PolicyStore::in_memory(defaults);

        let settings = store.settings(1).await;
        assert_eq!(settings.policy, defaults);
        assert!(settings.immune_roles.is_empty());
    }

    #[tokio::test]
    async fn test_update_policy_is_per_guild() {
        let store = PolicyStore::in_memory(GuildPolicy::default());

        let policy = assert_ok!(store.update_policy(1, |p| p.all_delete = true).await);
        assert!(policy.all_delete);
        assert!(store.settings(1).await.policy.all_delete);
        assert!(!store.settings(2).await.policy.all_delete);
    }

    #[tokio::test]
    async fn test_immune_roles() {
        let store = PolicyStore::in_memory(GuildPolicy::default());

        assert!(assert_ok!(store.add_immune_role(1, 42).await));
        assert!(!assert_ok!(store.add_immune_role(1, 42).await));

        let settings = store.settings(1).await;
        assert!(settings.is_immune(&[7, 42]));
        assert!(!settings.is_immune(&[7]));
        assert!(!store.settings(2).await.is_immune(&[42]));

        assert!(assert_ok!(store.remove_immune_role(1, 42).await));
        assert!(!assert_ok!(store.remove_immune_role(1, 42).await));
        assert!(!assert_ok!(store.remove_immune_role(9, 42).await));
        assert!(!store.settings(1).await.is_immune(&[42]));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guilds.json");
        let store = assert_ok!(PolicyStore::load(path, GuildPolicy::default()).await);
        assert_eq!(store.settings(1).await.policy, GuildPolicy::default());
    }

    #[tokio::test]
    async fn test_changes_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guilds.json");

        let store = assert_ok!(PolicyStore::load(&path, GuildPolicy::default()).await);
        assert_ok!(store.update_policy(10, |p| p.detect = false).await);
        assert_ok!(store.add_immune_role(10, 5).await);
        drop(store);

        let store = assert_ok!(PolicyStore::load(&path, GuildPolicy::default()).await);
        let settings = store.settings(10).await;
        assert!(!settings.policy.detect);
        assert_eq!(settings.immune_roles, vec![5]);
    }

    #[tokio::test]
    async fn test_partial_guild_entry_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guilds.json");
        std::fs::write(&path, br#"{"7": {"policy": {"all_delete": true}}}"#).unwrap();

        let store = assert_ok!(PolicyStore::load(&path, GuildPolicy::default()).await);
        let settings = store.settings(7).await;
        assert!(settings.policy.all_delete);
        assert!(settings.policy.detect);
        assert!(settings.immune_roles.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guilds.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let result = PolicyStore::load(&path, GuildPolicy::default()).await;
        assert!(matches!(result, Err(StoreError::Json(_))));
    }
}
