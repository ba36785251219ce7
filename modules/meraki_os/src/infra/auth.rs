//! Login and sign-up against `/auth/*`.
//!
//! A successful call stores the issued token and user into the client's
//! [`Session`], so every resource built from the same client is
//! authenticated from then on.

use console_kit::{
    extract_error_message, ApiError, ApiResult, Session, TracedClient, UserInfo, ValidationErrors,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use crate::contract::client::MerakiApi;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    nome: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Body of a successful login or registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

#[derive(Clone)]
pub struct AuthApi {
    client: TracedClient,
    base: Url,
}

impl AuthApi {
    pub fn new(client: TracedClient, base: Url) -> Self {
        Self { client, base }
    }

    /// Auth endpoints on the same host and session as `api`.
    pub fn for_api(api: &MerakiApi) -> Self {
        Self::new(api.client().clone(), api.base_url().clone())
    }

    #[instrument(name = "auth.login", skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let mut errors = ValidationErrors::new();
        errors
            .email("email", email, "Email inválido")
            .require("password", password, "Senha é obrigatória");
        errors.into_result()?;

        self.authenticate("login", &LoginRequest { email, password }, "Credenciais inválidas")
            .await
    }

    #[instrument(name = "auth.register", skip_all, fields(email = %email))]
    pub async fn register(&self, nome: &str, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let mut errors = ValidationErrors::new();
        errors
            .require("nome", nome, "Nome é obrigatório")
            .email("email", email, "Email inválido")
            .require("password", password, "Senha é obrigatória");
        errors.into_result()?;

        self.authenticate(
            "register",
            &RegisterRequest {
                nome,
                email,
                password,
            },
            "Erro ao criar conta",
        )
        .await
    }

    pub fn logout(&self) {
        self.session().clear();
        info!("session cleared");
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn current_user(&self) -> Option<UserInfo> {
        self.session().user()
    }

    pub fn session(&self) -> &Session {
        self.client.session()
    }

    fn url(&self, action: &str) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::network(format!("base url cannot hold a path: {}", self.base)))?
            .pop_if_empty()
            .extend(["auth", action]);
        Ok(url)
    }

    async fn authenticate<B: Serialize>(
        &self,
        action: &str,
        body: &B,
        fallback: &str,
    ) -> ApiResult<AuthResponse> {
        let url = self.url(action)?;
        let resp = self
            .client
            .send(self.client.request(Method::POST, url).json(body))
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "authentication rejected");
            return Err(ApiError::http(status.as_u16(), extract_error_message(&body, fallback)));
        }

        let bytes = resp.bytes().await?;
        let auth: AuthResponse =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::decode(e.to_string()))?;
        self.session().set(auth.token.clone(), auth.user.clone());
        info!(user = auth.user.as_ref().map(|u| u.email.as_str()).unwrap_or_default(), "authenticated");
        Ok(auth)
    }
}
