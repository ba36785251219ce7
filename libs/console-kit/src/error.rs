use thiserror::Error;

use crate::validate::ValidationErrors;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a call against the backend.
///
/// `Http::message` is already user-facing: it is the server's own message
/// when one could be extracted, otherwise the operation's generic fallback.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("{0}")]
    Validation(ValidationErrors),
}

impl ApiError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Text suitable for a notification description.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Não foi possível conectar ao servidor.".to_string(),
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Decode(_) => "Resposta inválida do servidor.".to_string(),
            ApiError::Validation(errors) => errors.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Pull a user-facing message out of an error response body.
///
/// Order: JSON `Message`, JSON `message`, a bare JSON string, the raw body
/// text, and `fallback` only when the body is blank.
pub fn extract_error_message(body: &str, fallback: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return fallback.to_string();
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => {
            for key in ["Message", "message"] {
                if let Some(serde_json::Value::String(msg)) = map.get(key) {
                    if !msg.trim().is_empty() {
                        return msg.clone();
                    }
                }
            }
            trimmed.to_string()
        }
        Ok(serde_json::Value::String(msg)) if !msg.trim().is_empty() => msg,
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_pascal_case_message_first() {
        let body = r#"{"Message":"Cliente já cadastrado","message":"other"}"#;
        assert_eq!(extract_error_message(body, "Erro"), "Cliente já cadastrado");
    }

    #[test]
    fn falls_back_to_camel_case_message() {
        assert_eq!(extract_error_message(r#"{"message":"x"}"#, "Erro"), "x");
    }

    #[test]
    fn json_object_without_message_is_returned_raw() {
        assert_eq!(
            extract_error_message(r#" {"errors":{"Nome":["required"]}} "#, "Erro ao inserir item."),
            r#"{"errors":{"Nome":["required"]}}"#
        );
    }

    #[test]
    fn plain_text_body_is_used_verbatim() {
        assert_eq!(
            extract_error_message("  Estoque insuficiente \n", "Erro"),
            "Estoque insuficiente"
        );
        assert_eq!(extract_error_message("\"quoted\"", "Erro"), "quoted");
    }

    #[test]
    fn blank_body_uses_fallback() {
        assert_eq!(extract_error_message("   ", "Erro ao listar."), "Erro ao listar.");
    }

    #[test]
    fn user_message_per_variant() {
        assert_eq!(ApiError::http(400, "bad").user_message(), "bad");
        assert!(ApiError::network("refused").user_message().contains("servidor"));
        assert!(ApiError::http(404, "x").is_not_found());
        assert!(ApiError::http(401, "x").is_unauthorized());
        assert_eq!(ApiError::decode("eof").status(), None);
    }
}
