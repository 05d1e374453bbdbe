// src/client/forms.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    common::error::field_messages,
    models::production::CreateProductionRequestRequest,
};

/// Campo (camelCase) -> primeira mensagem de erro.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, String>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
    }

    pub fn from_validation(errors: &validator::ValidationErrors) -> Self {
        let mut form = Self::default();
        for (field, messages) in field_messages(errors) {
            if let Some(first) = messages.into_iter().next() {
                form.insert(field, first);
            }
        }
        form
    }

    /// Os 422 do servidor caem no mesmo formato.
    pub fn from_server(fields: &BTreeMap<String, Vec<String>>) -> Self {
        let mut form = Self::default();
        for (field, messages) in fields {
            if let Some(first) = messages.first() {
                form.insert(field.clone(), first.clone());
            }
        }
        form
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Validação local antes de enviar; nada inválido chega ao `ApiClient`.
pub fn validate_form<T: Validate>(form: &T) -> Result<(), FormErrors> {
    form.validate().map_err(|errors| FormErrors::from_validation(&errors))
}

/// Pedidos de produção também exigem `neededBy` no futuro.
pub fn validate_production_request(
    form: &CreateProductionRequestRequest,
    now: DateTime<Utc>,
) -> Result<(), FormErrors> {
    let mut errors = validate_form(form).err().unwrap_or_default();
    if form.needed_by <= now {
        errors.insert("neededBy", "Needed-by date must be in the future.");
    }
    errors.into_result()
}
