// src/client/session.rs

use std::{
    collections::{BTreeMap, HashMap},
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use crate::{client::error::ClientError, models::auth::User};

pub const TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "user_data";

/// Armazenamento chave/valor onde a sessão sobrevive entre execuções.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

// ---
// Arquivo JSON (usado pelo `swirls`)
// ---

pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Arquivo ausente ou corrompido conta como vazio
    fn read_map(&self) -> BTreeMap<String, String> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default()
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), ClientError> {
        if map.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(map).map_err(io::Error::other)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_map().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map();
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

// ---
// Memória (testes)
// ---

#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn with(self, key: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        self
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
        Ok(())
    }
}

// ---
// Sessão
// ---

#[derive(Debug, Clone)]
struct Current {
    token: String,
    user: User,
}

/// Token e usuário atuais. Compartilhada (via `Arc`) entre o `ApiClient`,
/// o `AuthContext` e as páginas.
pub struct Session {
    storage: Box<dyn Storage>,
    current: Mutex<Option<Current>>,
}

impl Session {
    /// Sessão vazia; não lê nada do storage.
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self { storage: Box::new(storage), current: Mutex::new(None) }
    }

    /// Restaura token + usuário. Dados ilegíveis ou pela metade são apagados.
    pub fn hydrate(storage: impl Storage + 'static) -> Self {
        let session = Self::new(storage);

        let token = session.storage.get(TOKEN_KEY);
        let user_data = session.storage.get(USER_KEY);
        match (token, user_data) {
            (Some(token), Some(data)) => match serde_json::from_str::<User>(&data) {
                Ok(user) if !token.is_empty() => {
                    tracing::debug!(user_id = %user.id, "sessão restaurada");
                    *session.lock() = Some(Current { token, user });
                }
                _ => {
                    tracing::warn!("dados de sessão inválidos, limpando");
                    session.clear();
                }
            },
            (None, None) => {}
            _ => {
                tracing::warn!("sessão incompleta no storage, limpando");
                session.clear();
            }
        }
        session
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Current>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn establish(&self, token: String, user: User) -> Result<(), ClientError> {
        let user_data = serde_json::to_string(&user).map_err(io::Error::other)?;
        self.storage.set(TOKEN_KEY, &token)?;
        self.storage.set(USER_KEY, &user_data)?;
        *self.lock() = Some(Current { token, user });
        Ok(())
    }

    /// Remove token e usuário da memória e do storage. Nunca falha.
    pub fn clear(&self) {
        *self.lock() = None;
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "falha ao limpar o storage da sessão");
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.lock().as_ref().map(|c| c.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.lock().as_ref().map(|c| c.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_some()
    }
}
