use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{PersistError, Result};

/// What an uploaded file holds, as declared by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Pricing plan or bill export
    Plan,
    /// Usage metrics export
    Metrics,
    Other,
}

impl FromStr for FileType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "plan" => FileType::Plan,
            "metrics" => FileType::Metrics,
            _ => FileType::Other,
        })
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileType::Plan => "plan",
            FileType::Metrics => "metrics",
            FileType::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: Uuid,
    pub user_id: String,
    pub session_id: Option<String>,
    pub file_type: FileType,
    pub file_name: String,
    pub size: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUpload {
    pub user_id: String,
    pub session_id: Option<String>,
    pub file_type: FileType,
    pub file_name: String,
}

/// Directory-backed store for files uploaded ahead of a chat turn.
///
/// Bytes live under `base_path/<uuid>`; metadata is kept in memory and
/// scoped per user.
pub struct UploadStore {
    base_path: PathBuf,
    max_size: usize,
    files: RwLock<HashMap<Uuid, UploadedFile>>,
}

impl UploadStore {
    pub async fn new(base_path: impl Into<PathBuf>, max_size: usize) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;

        tracing::info!(path = %base_path.display(), max_size, "Upload store initialized");

        Ok(Self {
            base_path,
            max_size,
            files: RwLock::new(HashMap::new()),
        })
    }

    pub async fn store(&self, upload: NewUpload, data: &[u8]) -> Result<UploadedFile> {
        if data.is_empty() {
            return Err(PersistError::InvalidInput("Uploaded file is empty".to_string()));
        }
        if data.len() > self.max_size {
            return Err(PersistError::FileTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let file = UploadedFile {
            id: Uuid::new_v4(),
            user_id: upload.user_id,
            session_id: upload.session_id.filter(|s| !s.trim().is_empty()),
            file_type: upload.file_type,
            file_name: sanitize_file_name(&upload.file_name),
            size: data.len(),
            created_at: Utc::now(),
        };

        fs::write(self.blob_path(&file.id), data).await?;
        self.files.write().await.insert(file.id, file.clone());

        tracing::debug!(id = %file.id, size = file.size, file_type = %file.file_type, "Stored upload");
        Ok(file)
    }

    pub async fn get(&self, user_id: &str, id: &str) -> Result<UploadedFile> {
        let id = parse_id(id)?;
        self.files
            .read()
            .await
            .get(&id)
            .filter(|f| f.user_id == user_id)
            .cloned()
            .ok_or_else(|| PersistError::FileNotFound(id.to_string()))
    }

    /// File contents decoded as UTF-8 (invalid sequences replaced)
    pub async fn read_text(&self, file: &UploadedFile) -> Result<String> {
        let data = fs::read(self.blob_path(&file.id)).await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        let file = self.get(user_id, id).await?;
        self.remove(&file).await
    }

    /// Files still pending for a session, oldest first
    pub async fn session_files(&self, user_id: &str, session_id: &str) -> Vec<UploadedFile> {
        let mut files: Vec<UploadedFile> = self
            .files
            .read()
            .await
            .values()
            .filter(|f| f.user_id == user_id && f.session_id.as_deref() == Some(session_id))
            .cloned()
            .collect();
        files.sort_by_key(|f| f.created_at);
        files
    }

    /// Drop every pending file of a session, returning how many were removed
    pub async fn clear_session(&self, user_id: &str, session_id: &str) -> Result<usize> {
        let files = self.session_files(user_id, session_id).await;
        for file in &files {
            self.remove(file).await?;
        }
        if !files.is_empty() {
            tracing::debug!(session_id, removed = files.len(), "Cleared session uploads");
        }
        Ok(files.len())
    }

    async fn remove(&self, file: &UploadedFile) -> Result<()> {
        self.files.write().await.remove(&file.id);
        match fs::remove_file(self.blob_path(&file.id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn blob_path(&self, id: &Uuid) -> PathBuf {
        self.base_path.join(id.to_string())
    }
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| PersistError::FileNotFound(id.to_string()))
}

// Keep only the last path component of client-supplied names
fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        "upload".to_string()
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(session: &str, file_type: FileType) -> NewUpload {
        NewUpload {
            user_id: "guest".to_string(),
            session_id: Some(session.to_string()),
            file_type,
            file_name: "../../etc/billing.csv".to_string(),
        }
    }

    #[tokio::test]
    async fn test_store_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path(), 1024).await.unwrap();

        let file = store.store(upload("s1", FileType::Plan), b"m5.large,720h").await.unwrap();
        assert_eq!(file.file_name, "billing.csv");
        assert_eq!(file.size, 13);

        let fetched = store.get("guest", &file.id.to_string()).await.unwrap();
        assert_eq!(store.read_text(&fetched).await.unwrap(), "m5.large,720h");

        store.delete("guest", &file.id.to_string()).await.unwrap();
        assert!(matches!(
            store.get("guest", &file.id.to_string()).await,
            Err(PersistError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_oversized_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path(), 4).await.unwrap();

        assert!(matches!(
            store.store(upload("s1", FileType::Metrics), b"too large").await,
            Err(PersistError::FileTooLarge { size: 9, max: 4 })
        ));
        assert!(matches!(
            store.store(upload("s1", FileType::Metrics), b"").await,
            Err(PersistError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_files_are_scoped_to_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path(), 1024).await.unwrap();
        let file = store.store(upload("s1", FileType::Plan), b"plan").await.unwrap();

        assert!(store.get("someone-else", &file.id.to_string()).await.is_err());
        assert!(store.delete("someone-else", &file.id.to_string()).await.is_err());
        assert!(store.get("guest", "not-a-uuid").await.is_err());
    }

    #[tokio::test]
    async fn test_clear_session_only_touches_that_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path(), 1024).await.unwrap();
        store.store(upload("s1", FileType::Plan), b"plan").await.unwrap();
        store.store(upload("s1", FileType::Metrics), b"metrics").await.unwrap();
        store.store(upload("s2", FileType::Plan), b"other").await.unwrap();

        assert_eq!(store.clear_session("guest", "s1").await.unwrap(), 2);
        assert!(store.session_files("guest", "s1").await.is_empty());
        assert_eq!(store.session_files("guest", "s2").await.len(), 1);
    }

    #[test]
    fn test_file_type_parsing() {
        assert_eq!("Plan".parse::<FileType>().unwrap(), FileType::Plan);
        assert_eq!(" metrics ".parse::<FileType>().unwrap(), FileType::Metrics);
        assert_eq!("invoice".parse::<FileType>().unwrap(), FileType::Other);
    }
}
