pub mod backend;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;

use crate::config::StorageConfig;
use crate::error::AppError;
use crate::models::{Course, EmailConfirmation, LegacyStudent, User};

pub const USERS_KEY: &str = "users";
pub const STUDENTS_KEY: &str = "students";
pub const COURSES_KEY: &str = "courses";
pub const EMAIL_CONFIRMATIONS_KEY: &str = "email_confirmations";

/// Typed access to the four persisted documents. Every operation reads a
/// whole document, computes the next state and writes the whole document
/// back; there are no partial in-place field writes.
///
/// Read failures degrade to the empty default so a corrupt or missing
/// document never crashes a caller. Write failures are logged and dropped.
pub struct Store {
    backend: Box<dyn StorageBackend>,
    prefix: String,
}

impl Store {
    pub fn new(backend: Box<dyn StorageBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()), "stem")
    }

    pub fn open(config: &StorageConfig) -> Result<Self, AppError> {
        let backend = FileBackend::new(&config.data_dir)?;
        Ok(Self::new(Box::new(backend), config.key_prefix.clone()))
    }

    fn key(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let key = self.key(name);
        match self.backend.read(&key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    error!(key = %key, error = %e, "Failed to parse stored document");
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                error!(key = %key, error = %e, "Failed to read stored document");
                T::default()
            }
        }
    }

    fn persist<T: Serialize + ?Sized>(&self, name: &str, value: &T) {
        let key = self.key(name);
        match serde_json::to_string(value) {
            Ok(raw) => {
                if let Err(e) = self.backend.write(&key, &raw) {
                    error!(key = %key, error = %e, "Failed to write stored document");
                }
            }
            Err(e) => {
                error!(key = %key, error = %e, "Failed to serialize document");
            }
        }
    }

    pub fn users(&self) -> BTreeMap<String, User> {
        self.load(USERS_KEY)
    }

    pub fn save_users(&self, users: &BTreeMap<String, User>) {
        self.persist(USERS_KEY, users);
    }

    pub fn students(&self) -> Vec<LegacyStudent> {
        self.load(STUDENTS_KEY)
    }

    pub fn save_students(&self, students: &[LegacyStudent]) {
        self.persist(STUDENTS_KEY, students);
    }

    pub fn courses(&self) -> BTreeMap<String, Course> {
        self.load(COURSES_KEY)
    }

    pub fn save_courses(&self, courses: &BTreeMap<String, Course>) {
        self.persist(COURSES_KEY, courses);
    }

    pub fn confirmations(&self) -> BTreeMap<String, EmailConfirmation> {
        self.load(EMAIL_CONFIRMATIONS_KEY)
    }

    pub fn save_confirmations(&self, confirmations: &BTreeMap<String, EmailConfirmation>) {
        self.persist(EMAIL_CONFIRMATIONS_KEY, confirmations);
    }
}
