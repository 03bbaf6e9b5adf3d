//! SQLite-backed profile store (optional persistence).

use async_trait::async_trait;
use mentor_types::{Profile, ProfileId, ProfileStore, ProfileStoreError};
use std::path::Path;

/// SQLite-backed profile store. Whole documents are stored as JSON, with
/// role and timestamps broken out into columns for inspection.
pub struct SqliteProfileStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteProfileStore {
    /// Open (or create) the store at the given path. `:memory:` works too.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ProfileStoreError> {
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| ProfileStoreError::Other(e.to_string()))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                role TEXT NOT NULL,
                document TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_profiles_role ON profiles(role);
            "#,
        )
        .map_err(|e| ProfileStoreError::Other(e.to_string()))?;

        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, ProfileStoreError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ProfileStoreError::Other(format!("failed to acquire lock: {}", e)))?;
        f(&conn).map_err(|e| ProfileStoreError::Other(e.to_string()))
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, ProfileStoreError> {
        let id = id.to_string();
        let document = self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT document FROM profiles WHERE id = ?1")?;
            match stmt.query_row([&id], |row| row.get::<_, String>(0)) {
                Ok(document) => Ok(Some(document)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })?;

        match document {
            Some(document) => serde_json::from_str(&document)
                .map(Some)
                .map_err(|e| ProfileStoreError::Other(e.to_string())),
            None => Ok(None),
        }
    }

    async fn save(&self, profile: Profile) -> Result<Profile, ProfileStoreError> {
        let document = serde_json::to_string(&profile)
            .map_err(|e| ProfileStoreError::Other(e.to_string()))?;
        let id = profile.id.to_string();
        let role = profile.role.as_str();
        let now = chrono::Utc::now().to_rfc3339();

        // Upsert keeps created_at from the first insert.
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, role, document, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(id) DO UPDATE SET role = ?2, document = ?3, updated_at = ?4",
                rusqlite::params![id, role, document, now],
            )
        })?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_types::Role;

    #[tokio::test]
    async fn round_trips_full_documents() {
        let store = SqliteProfileStore::new(":memory:").unwrap();
        let mut profile = Profile::new(Role::Student, "s@example.com", "Sam", "Student");
        if let Some(data) = profile.student_data.as_mut() {
            data.mentor = Some(ProfileId::new());
            data.coaches.push(ProfileId::new());
        }
        let id = profile.id;
        store.save(profile.clone()).await.unwrap();

        let found = store.find_by_id(&id).await.unwrap();
        assert_eq!(found, Some(profile));
    }

    #[tokio::test]
    async fn find_unknown_id_is_none() {
        let store = SqliteProfileStore::new(":memory:").unwrap();
        assert!(store.find_by_id(&ProfileId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_twice_updates_in_place() {
        let store = SqliteProfileStore::new(":memory:").unwrap();
        let mut profile = Profile::new(Role::Coach, "c@example.com", "Cal", "Coach");
        let id = profile.id;
        store.save(profile.clone()).await.unwrap();

        profile.students.push(ProfileId::new());
        store.save(profile).await.unwrap();

        let found = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.students.len(), 1);
    }
}
