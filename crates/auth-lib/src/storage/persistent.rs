// ============================
// crates/auth-lib/src/storage/persistent.rs
// ============================
/** File-backed store with encryption.
Wraps [`MemoryStore`] with a snapshot that is reloaded at startup, so
accounts and sessions survive server restarts. Sessions are bearer
credentials, so the snapshot is encrypted at rest with AES-256-GCM under a
key generated on first start. */
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::{fs as tokio_fs, sync::Mutex};
use tracing::info;

use super::{CredentialStore, MemoryStore, SessionStore, StoreError, StoreState};
use crate::auth::lockout::{FailureState, LockoutPolicy};
use crate::models::{Account, AccountId, Session};

const KEY_FILE: &str = "store.key";
const SNAPSHOT_FILE: &str = "store.dat";
const NONCE_LEN: usize = 12;

/// Store that snapshots every mutation to an encrypted file.
pub struct FileBackedStore {
    inner: MemoryStore,
    storage_path: PathBuf,
    encryption_key: [u8; 32],
    /// Serializes snapshot writes so concurrent mutations cannot interleave
    /// partial files.
    save_lock: Mutex<()>,
}

impl std::fmt::Debug for FileBackedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBackedStore")
            .field("storage_path", &self.storage_path)
            .finish_non_exhaustive()
    }
}

impl FileBackedStore {
    /** Open (or initialize) the store under `storage_path`.
    Generates and persists an encryption key on first start, then loads the
    snapshot if one exists. */
    pub async fn open<P: AsRef<Path>>(storage_path: P) -> Result<Self, StoreError> {
        let storage_path = storage_path.as_ref().to_path_buf();
        fs::create_dir_all(&storage_path)?;

        let key_path = storage_path.join(KEY_FILE);
        let encryption_key = if key_path.exists() {
            let key_data = fs::read(&key_path)?;
            let mut key = [0u8; 32];
            if key_data.len() != 32 {
                return Err(StoreError::Corrupt(
                    "encryption key has wrong length".to_string(),
                ));
            }
            key.copy_from_slice(&key_data);
            key
        } else {
            let mut key = [0u8; 32];
            OsRng.fill_bytes(&mut key);
            fs::write(&key_path, key)?;
            key
        };

        let store = Self {
            inner: MemoryStore::new(),
            storage_path,
            encryption_key,
            save_lock: Mutex::new(()),
        };
        store.load_snapshot().await?;
        Ok(store)
    }

    async fn load_snapshot(&self) -> Result<(), StoreError> {
        let path = self.storage_path.join(SNAPSHOT_FILE);
        if !path.exists() {
            return Ok(());
        }

        let combined = tokio_fs::read(&path).await?;
        if combined.len() < NONCE_LEN {
            return Err(StoreError::Corrupt("snapshot too short".to_string()));
        }
        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.encryption_key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| StoreError::Corrupt("snapshot decryption failed".to_string()))?;

        let state: StoreState = serde_json::from_slice(&plaintext)?;
        let accounts = state.accounts.len();
        let sessions = state.sessions.len();
        self.inner.import_state(state).await;
        info!(accounts, sessions, "loaded store snapshot");
        Ok(())
    }

    /// Write the current contents to disk.
    pub async fn save_snapshot(&self) -> Result<(), StoreError> {
        let _guard = self.save_lock.lock().await;

        let state = self.inner.export_state().await;
        let plaintext = serde_json::to_vec(&state)?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.encryption_key));
        let nonce_bytes = generate_nonce();
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
            .map_err(|_| StoreError::Crypto)?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        tokio_fs::write(self.storage_path.join(SNAPSHOT_FILE), &combined).await?;
        Ok(())
    }
}

/// Generate a random nonce for AES-GCM
fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

#[async_trait]
impl CredentialStore for FileBackedStore {
    async fn create_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AccountId, StoreError> {
        let id = self.inner.create_account(username, password_hash).await?;
        self.save_snapshot().await?;
        Ok(id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        self.inner.find_by_username(username).await
    }

    async fn record_failed_attempt(
        &self,
        id: AccountId,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<FailureState, StoreError> {
        let state = self.inner.record_failed_attempt(id, policy, now).await?;
        self.save_snapshot().await?;
        Ok(state)
    }

    async fn reset_failure_state(&self, id: AccountId) -> Result<(), StoreError> {
        self.inner.reset_failure_state(id).await?;
        self.save_snapshot().await
    }
}

#[async_trait]
impl SessionStore for FileBackedStore {
    async fn create_session(
        &self,
        user_id: AccountId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner.create_session(user_id, token, expires_at).await?;
        self.save_snapshot().await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        self.inner.find_by_token(token).await
    }

    async fn delete_by_token(&self, token: &str) -> Result<(), StoreError> {
        self.inner.delete_by_token(token).await?;
        self.save_snapshot().await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let removed = self.inner.delete_expired(now).await?;
        if removed > 0 {
            self.save_snapshot().await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_accounts_survive_restart() {
        let dir = TempDir::new().unwrap();

        let id = {
            let store = FileBackedStore::open(dir.path()).await.unwrap();
            store.create_account("alice", "hash-a").await.unwrap()
        };

        let reopened = FileBackedStore::open(dir.path()).await.unwrap();
        let account = reopened.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(account.id, id);
        assert_eq!(account.password_hash, "hash-a");
    }

    #[tokio::test]
    async fn test_sessions_survive_restart() {
        let dir = TempDir::new().unwrap();
        let expires = Utc::now() + Duration::days(1);

        {
            let store = FileBackedStore::open(dir.path()).await.unwrap();
            store.create_session(7, "tok-a", expires).await.unwrap();
        }

        let reopened = FileBackedStore::open(dir.path()).await.unwrap();
        let session = reopened.find_by_token("tok-a").await.unwrap().unwrap();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.expires_at, expires);
    }

    #[tokio::test]
    async fn test_deletes_are_persisted() {
        let dir = TempDir::new().unwrap();

        {
            let store = FileBackedStore::open(dir.path()).await.unwrap();
            store
                .create_session(1, "tok-a", Utc::now() + Duration::days(1))
                .await
                .unwrap();
            store.delete_by_token("tok-a").await.unwrap();
        }

        let reopened = FileBackedStore::open(dir.path()).await.unwrap();
        assert!(reopened.find_by_token("tok-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_is_not_plaintext() {
        let dir = TempDir::new().unwrap();
        let store = FileBackedStore::open(dir.path()).await.unwrap();
        store.create_account("alice", "hash-a").await.unwrap();

        let raw = fs::read(dir.path().join(SNAPSHOT_FILE)).unwrap();
        let haystack = String::from_utf8_lossy(&raw);
        assert!(!haystack.contains("alice"));
    }

    #[tokio::test]
    async fn test_tampered_snapshot_is_rejected() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileBackedStore::open(dir.path()).await.unwrap();
            store.create_account("alice", "hash-a").await.unwrap();
        }

        let path = dir.path().join(SNAPSHOT_FILE);
        let mut raw = fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        fs::write(&path, raw).unwrap();

        let err = FileBackedStore::open(dir.path()).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
