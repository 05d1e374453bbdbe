// src/client/error.rs

use std::collections::BTreeMap;

use thiserror::Error;

/// Erros vistos pelo cliente. Nunca são mostrados crus ao usuário:
/// as páginas passam por `user_message`.
#[derive(Debug, Error)]
pub enum ClientError {
    // 401 fora do login; a sessão já foi limpa
    #[error("Your session has expired. Please log in again.")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    // 422: mensagens por campo vindas do servidor
    #[error("{message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized | ClientError::InvalidCredentials => Some(401),
            ClientError::Validation { .. } => Some(422),
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Network(_) | ClientError::Storage(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    /// Mensagem para a tela: "Failed to load inventory items".
    /// Erros de regra de negócio (409) mantêm o texto do servidor.
    pub fn user_message(&self, action: &str, subject: &str) -> String {
        match self {
            ClientError::InvalidCredentials => "Invalid email or password".to_string(),
            ClientError::Unauthorized => self.to_string(),
            ClientError::Http { status: 409, message } => message.clone(),
            ClientError::Http { status: 403, .. } => {
                format!("You do not have permission to {action} {subject}")
            }
            _ => format!("Failed to {action} {subject}"),
        }
    }
}
