use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use log::info;
use tokio::sync::Mutex;

use crate::error::{Result, ServiceError};
use crate::models::{User, UserUpdate};

/// Document store keyed by user id.
///
/// `merge` has partial-update semantics: fields left `None` are untouched and
/// array fields are replaced wholesale. Read-modify-write cycles that span
/// `get` + `merge` are serialized by the vocabulary ledger, not here.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<User>>;
    async fn create(&self, user: User) -> Result<User>;
    async fn merge(&self, user_id: &str, update: UserUpdate) -> Result<User>;
}

fn apply_update(user: &mut User, update: UserUpdate) {
    if let Some(name) = update.name {
        user.name = name;
    }
    if let Some(email) = update.email {
        user.email = email;
    }
    if let Some(problem_words) = update.problem_words {
        user.problem_words = problem_words;
    }
    if let Some(interests) = update.interests {
        user.interests = interests;
    }
    if let Some(modules_completed) = update.modules_completed {
        user.modules_completed = modules_completed;
    }
    if let Some(used) = update.used_non_frequent_words {
        user.used_non_frequent_words = used;
    }
    if let Some(unique) = update.unique_words_encountered {
        user.unique_words_encountered = unique;
    }
    if let Some(history) = update.passage_history {
        user.passage_history = history;
    }
    user.updated_at = Utc::now();
}

/// One JSON document per user under a data directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        info!("User store directory: {}", dir);
        Ok(JsonFileStore {
            dir: PathBuf::from(dir),
        })
    }

    fn path_for(&self, user_id: &str) -> Result<PathBuf> {
        // User ids become file names; reject anything that could escape the dir
        if user_id.is_empty()
            || !user_id
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ServiceError::Validation(format!(
                "invalid user id '{}'",
                user_id
            )));
        }
        Ok(self.dir.join(format!("{}.json", user_id)))
    }

    fn read(&self, path: &Path) -> Result<Option<User>> {
        if !path.exists() {
            return Ok(None);
        }
        let file = fs::File::open(path)?;
        Ok(Some(serde_json::from_reader(file)?))
    }

    fn write(&self, path: &Path, user: &User) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        {
            let file = fs::File::create(&tmp)?;
            serde_json::to_writer_pretty(file, user)?;
        }
        fs::rename(tmp, path)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for JsonFileStore {
    async fn get(&self, user_id: &str) -> Result<Option<User>> {
        let path = self.path_for(user_id)?;
        self.read(&path)
    }

    async fn create(&self, user: User) -> Result<User> {
        let path = self.path_for(&user.id)?;
        if path.exists() {
            return Err(ServiceError::Validation(format!(
                "user '{}' already exists",
                user.id
            )));
        }
        self.write(&path, &user)?;
        Ok(user)
    }

    async fn merge(&self, user_id: &str, update: UserUpdate) -> Result<User> {
        let path = self.path_for(user_id)?;
        let mut user = self
            .read(&path)?
            .ok_or_else(|| ServiceError::UserNotFound(user_id.to_string()))?;
        apply_update(&mut user, update);
        self.write(&path, &user)?;
        Ok(user)
    }
}

/// In-memory store used in tests.
pub struct MemoryStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            users: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.lock().await.get(user_id).cloned())
    }

    async fn create(&self, user: User) -> Result<User> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.id) {
            return Err(ServiceError::Validation(format!(
                "user '{}' already exists",
                user.id
            )));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn merge(&self, user_id: &str, update: UserUpdate) -> Result<User> {
        let mut users = self.users.lock().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ServiceError::UserNotFound(user_id.to_string()))?;
        apply_update(user, update);
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(id: &str) -> User {
        User::new(
            id.to_string(),
            "Test".to_string(),
            "test@example.com".to_string(),
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn test_json_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_str().unwrap()).unwrap();

        assert!(store.get("u1").await.unwrap().is_none());
        store.create(sample_user("u1")).await.unwrap();

        let loaded = store.get("u1").await.unwrap().unwrap();
        assert_eq!(loaded.id, "u1");
        assert!(loaded.problem_words.is_empty());
    }

    #[tokio::test]
    async fn test_merge_replaces_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_str().unwrap()).unwrap();
        store.create(sample_user("u1")).await.unwrap();

        let update = UserUpdate {
            unique_words_encountered: Some(vec!["zephyr".to_string()]),
            ..Default::default()
        };
        let merged = store.merge("u1", update).await.unwrap();
        assert_eq!(merged.unique_words_encountered, vec!["zephyr"]);
        assert_eq!(merged.name, "Test");
        assert!(merged.used_non_frequent_words.is_empty());
    }

    #[tokio::test]
    async fn test_merge_unknown_user_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_str().unwrap()).unwrap();
        let err = store.merge("ghost", UserUpdate::default()).await;
        assert!(matches!(err, Err(ServiceError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_str().unwrap()).unwrap();
        assert!(store.get("../etc/passwd").await.is_err());
    }
}
