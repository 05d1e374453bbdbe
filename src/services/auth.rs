// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserStore,
    models::auth::{Claims, CreateUserRequest, LoginResponse, NewUser, Role, User},
};

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserStore>,
    jwt_secret: String,
    bcrypt_cost: u32,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserStore>, jwt_secret: String, bcrypt_cost: u32) -> Self {
        Self { user_repo, jwt_secret, bcrypt_cost }
    }

    pub async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let cost = self.bcrypt_cost;
        // Hashing é CPU-bound: roda fora do executor async
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    // E-mail desconhecido, senha errada e usuário desativado dão o mesmo erro
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .filter(|user| user.is_active)
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::debug!(email = %user.email, "senha inválida");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&user)?;
        tracing::info!(user_id = %user.id, role = %user.role, "login");

        Ok(LoginResponse {
            user_id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        })
    }

    /// Decodifica o token e carrega o usuário atual (que precisa estar ativo).
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .filter(|user| user.is_active)
            .ok_or(AppError::InvalidToken)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    // ---
    // Gestão de usuários
    // ---

    pub async fn create_user(&self, payload: &CreateUserRequest) -> Result<User, AppError> {
        let password_hash = self.hash_password(&payload.password).await?;
        let user = self
            .user_repo
            .create(NewUser {
                name: payload.name.trim().to_string(),
                email: normalize_email(&payload.email),
                password_hash,
                role: payload.role,
            })
            .await?;
        tracing::info!(user_id = %user.id, role = %user.role, "usuário criado");
        Ok(user)
    }

    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, AppError> {
        self.user_repo.list(role).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("User"))
    }

    pub async fn update_role(&self, id: Uuid, role: Role) -> Result<User, AppError> {
        self.user_repo
            .update_role(id, role)
            .await?
            .ok_or(AppError::NotFound("User"))
    }

    /// Ativa/desativa; repetir o estado atual é um conflito.
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<User, AppError> {
        if let Some(user) = self.user_repo.set_active(id, active).await? {
            return Ok(user);
        }
        let user = self.get_user(id).await?;
        let state = if user.is_active { "active" } else { "inactive" };
        Err(AppError::Conflict(format!("User is already {state}")))
    }

    pub async fn has_users(&self) -> Result<bool, AppError> {
        Ok(self.user_repo.count().await? > 0)
    }
}
