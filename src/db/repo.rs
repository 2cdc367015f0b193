use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::db::models::{Record, Todo, User};
use crate::error::AppError;

pub const USERS_FILE: &str = "users.json";
pub const TODOS_FILE: &str = "todos.json";

/// Result of an [`JsonFile::update`] closure: whether the file must be rewritten.
pub enum Commit<R> {
    Write(R),
    Skip(R),
}

/// One JSON array on disk. The whole file is read and rewritten on every
/// access; the mutex serializes read-modify-write cycles within the process.
pub struct JsonFile<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    /// Creates the file as an empty array if it does not exist yet.
    pub async fn ensure(&self) -> Result<(), AppError> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        tracing::info!(path = %self.path.display(), "creating empty data file");
        self.write_unlocked(&[]).await
    }

    pub async fn read_all(&self) -> Result<Vec<T>, AppError> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    /// Reads the file, hands the records to `f`, and rewrites the file when `f`
    /// returns [`Commit::Write`]. Errors from `f` abort without writing.
    pub async fn update<R, F>(&self, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut Vec<T>) -> Result<Commit<R>, AppError>,
    {
        let _guard = self.lock.lock().await;
        let mut items = self.read_unlocked().await?;
        match f(&mut items)? {
            Commit::Write(result) => {
                self.write_unlocked(&items).await?;
                Ok(result)
            }
            Commit::Skip(result) => Ok(result),
        }
    }

    async fn read_unlocked(&self) -> Result<Vec<T>, AppError> {
        let data = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    async fn write_unlocked(&self, items: &[T]) -> Result<(), AppError> {
        let data = serde_json::to_vec_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// `max(id) + 1`, or 1 for an empty collection.
pub fn next_id<T: Record>(items: &[T]) -> u64 {
    items.iter().map(Record::id).max().map_or(1, |max| max + 1)
}

pub struct Store {
    pub users: JsonFile<User>,
    pub todos: JsonFile<Todo>,
}

impl Store {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            users: JsonFile::new(data_dir.join(USERS_FILE)),
            todos: JsonFile::new(data_dir.join(TODOS_FILE)),
        }
    }

    /// Creates the data directory and both files when missing.
    pub async fn open(data_dir: &Path) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(data_dir).await?;
        let store = Self::new(data_dir);
        store.users.ensure().await?;
        store.todos.ensure().await?;
        Ok(store)
    }

    pub async fn find_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        let users = self.users.read_all().await?;
        Ok(users.into_iter().find(|u| u.id == user_id))
    }

    pub async fn todos_for(&self, user_id: u64) -> Result<Vec<Todo>, AppError> {
        let mut todos = self.todos.read_all().await?;
        todos.retain(|t| t.user_id == user_id);
        Ok(todos)
    }
}
