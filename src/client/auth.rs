// src/client/auth.rs

use chrono::Utc;

use crate::{
    client::{error::ClientError, ApiClient},
    models::{
        auth::{LoginRequest, LoginResponse, Role, User},
        rbac::Capability,
    },
};

/// Login/logout e as perguntas "quem sou eu / o que posso fazer".
/// As perguntas são puras: olham só o usuário guardado na sessão.
#[derive(Clone)]
pub struct AuthContext {
    api: ApiClient,
}

impl AuthContext {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Troca e-mail/senha por um token e persiste a sessão.
    /// Em qualquer falha a sessão fica vazia.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<User, ClientError> {
        self.api.session().clear();

        let response = self.api.login(credentials).await?;
        let user = user_snapshot(&response);
        self.api.session().establish(response.token, user.clone())?;

        tracing::info!(user_id = %user.id, role = %user.role, "login efetuado");
        Ok(user)
    }

    /// Sempre limpa a sessão local; não depende do servidor.
    pub fn logout(&self) {
        self.api.session().clear();
    }

    pub fn user(&self) -> Option<User> {
        self.api.session().user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.session().is_authenticated()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.user().is_some_and(|user| user.role == role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.user().is_some_and(|user| roles.contains(&user.role))
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.user().is_some_and(|user| capability.allows(user.role))
    }
}

// O login não devolve datas; o usuário recém-logado está ativo por definição
fn user_snapshot(response: &LoginResponse) -> User {
    let now = Utc::now();
    User {
        id: response.user_id,
        name: response.name.clone(),
        email: response.email.clone(),
        password_hash: String::new(),
        role: response.role,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::{ClientConfig, MemoryStorage, Session};
    use uuid::Uuid;

    fn context_as(role: Option<Role>) -> AuthContext {
        let session = Arc::new(Session::new(MemoryStorage::default()));
        if let Some(role) = role {
            let response = LoginResponse {
                user_id: Uuid::new_v4(),
                name: "Someone".into(),
                email: "someone@sweetswirls.com".into(),
                role,
                token: "jwt".into(),
            };
            session.establish(response.token.clone(), user_snapshot(&response)).unwrap();
        }
        let api = ApiClient::new(&ClientConfig::with_api_url("http://127.0.0.1:9/api"), session).unwrap();
        AuthContext::new(api)
    }

    #[test]
    fn predicates_are_false_without_a_user() {
        let auth = context_as(None);
        assert!(!auth.is_authenticated());
        assert!(!auth.has_role(Role::Admin));
        assert!(!auth.has_any_role(&Role::ALL));
        assert!(!auth.can(Capability::ViewInventory));
    }

    #[test]
    fn predicates_follow_the_capability_table() {
        let auth = context_as(Some(Role::ShiftLead));
        assert!(auth.has_role(Role::ShiftLead));
        assert!(auth.has_any_role(&[Role::Admin, Role::ShiftLead]));
        assert!(auth.can(Capability::TakeInventory));
        assert!(!auth.can(Capability::RecordBatches));
        assert!(!auth.can(Capability::ManageUsers));
    }

    #[test]
    fn logout_clears_the_session() {
        let auth = context_as(Some(Role::Admin));
        auth.logout();
        assert!(!auth.is_authenticated());
        assert!(auth.api().session().token().is_none());
    }

    #[test]
    fn snapshot_marks_user_active() {
        let response = LoginResponse {
            user_id: Uuid::new_v4(),
            name: "Team Member".into(),
            email: "team@sweetswirls.com".into(),
            role: Role::TeamMember,
            token: "jwt".into(),
        };
        let user = user_snapshot(&response);
        assert!(user.is_active);
        assert_eq!(user.id, response.user_id);
    }
}
