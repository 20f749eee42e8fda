//! Identity service: the remote "who am I" lookup and the session actions.
//!
//! [`IdentityService`] is the seam the gate talks through.
//! [`HttpIdentityService`] implements it against the console backend, which
//! keeps the login in an http-only `session` cookie. The cookie can be
//! persisted to disk so a later process picks the login back up.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use serde::de::DeserializeOwned;

use abate_common::ConsoleConfig;

use crate::constants::{
    LOGIN_ENDPOINT, LOGOUT_ENDPOINT, ME_ENDPOINT, REGISTER_ENDPOINT, SESSION_COOKIE,
};
use crate::error::IdentityError;
use crate::types::{ApiMessage, Credentials, IdentityRecord, Registration, ServiceResponse};

/// Remote identity collaborator consumed by the session gate.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Which subject, if any, the current credentials belong to.
    async fn who_am_i(&self) -> Result<ServiceResponse<IdentityRecord>, IdentityError>;

    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<ServiceResponse<ApiMessage>, IdentityError>;

    async fn logout(&self) -> Result<ServiceResponse<ApiMessage>, IdentityError>;

    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<ServiceResponse<ApiMessage>, IdentityError>;
}

/// File holding the raw `session` cookie between runs.
#[derive(Debug, Clone)]
pub struct SessionCookieFile {
    path: PathBuf,
}

impl SessionCookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn load(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let raw = raw.trim();
        (!raw.is_empty()).then(|| raw.to_string())
    }

    fn save(&self, cookie_header: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, cookie_header)?;
        set_owner_only(&self.path)
    }

    fn clear(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Set restrictive file permissions (0600 on Unix).
fn set_owner_only(path: &std::path::Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    #[cfg(not(unix))]
    {
        let _ = path;
    }

    Ok(())
}

/// Identity service backed by the console's REST API.
#[derive(Clone)]
pub struct HttpIdentityService {
    client: reqwest::Client,
    jar: Arc<Jar>,
    base_url: String,
    cookie_file: Option<SessionCookieFile>,
}

impl HttpIdentityService {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:8000/api/v1`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, IdentityError> {
        Self::with_timeout(base_url, abate_common::DEFAULT_TIMEOUT)
    }

    /// Create a client from the console configuration.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, IdentityError> {
        Self::with_timeout(config.api_base_url(), config.request_timeout())
    }

    fn with_timeout(
        base_url: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, IdentityError> {
        let jar = Arc::new(Jar::default());
        let client = abate_common::create_client_builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Client(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            jar,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookie_file: None,
        })
    }

    /// Persist the session cookie in `file`, restoring whatever it already holds.
    pub fn with_cookie_file(mut self, file: SessionCookieFile) -> Self {
        if let (Some(saved), Ok(url)) = (file.load(), self.cookie_url()) {
            for pair in saved.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                self.jar.add_cookie_str(&format!("{pair}; Path=/"), &url);
            }
            tracing::debug!(path = %file.path().display(), "Restored session cookie");
        }
        self.cookie_file = Some(file);
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn cookie_url(&self) -> Result<Url, IdentityError> {
        Url::parse(&self.base_url)
            .map_err(|e| IdentityError::Client(format!("invalid base URL {}: {e}", self.base_url)))
    }

    fn persist_cookie(&self) {
        let Some(file) = &self.cookie_file else {
            return;
        };
        let Ok(url) = self.cookie_url() else {
            return;
        };
        let header = self
            .jar
            .cookies(&url)
            .and_then(|value| value.to_str().ok().map(str::to_string));
        if !header.as_deref().is_some_and(carries_session) {
            tracing::debug!("Backend set no {SESSION_COOKIE} cookie");
        }
        let result = match header {
            Some(header) => file.save(&header),
            None => file.clear(),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, path = %file.path().display(), "Failed to persist session cookie");
        }
    }

    fn forget_cookie(&self) {
        if let Some(file) = &self.cookie_file
            && let Err(e) = file.clear()
        {
            tracing::warn!(error = %e, "Failed to remove session cookie file");
        }
    }
}

fn carries_session(cookie_header: &str) -> bool {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(name, value)| name == SESSION_COOKIE && !value.is_empty())
}

/// Read status and body; a 2xx body that does not decode is an error, other
/// bodies are best-effort.
async fn read_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<ServiceResponse<T>, IdentityError> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    let reply = ServiceResponse::new(status, None);
    if bytes.is_empty() {
        return Ok(reply);
    }
    match serde_json::from_slice::<T>(&bytes) {
        Ok(data) => Ok(ServiceResponse::new(status, Some(data))),
        Err(e) if reply.ok() => Err(IdentityError::Decode(e)),
        Err(e) => {
            tracing::debug!(status, error = %e, "Ignoring undecodable error body");
            Ok(reply)
        }
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn who_am_i(&self) -> Result<ServiceResponse<IdentityRecord>, IdentityError> {
        let response = self.client.get(self.url(ME_ENDPOINT)).send().await?;
        read_response(response).await
    }

    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<ServiceResponse<ApiMessage>, IdentityError> {
        let response = self
            .client
            .post(self.url(LOGIN_ENDPOINT))
            .json(&credentials.to_wire())
            .send()
            .await?;
        let reply: ServiceResponse<ApiMessage> = read_response(response).await?;
        if reply.ok() {
            self.persist_cookie();
        }
        Ok(reply)
    }

    async fn logout(&self) -> Result<ServiceResponse<ApiMessage>, IdentityError> {
        let response = self.client.post(self.url(LOGOUT_ENDPOINT)).send().await?;
        let reply: ServiceResponse<ApiMessage> = read_response(response).await?;
        if reply.ok() {
            self.forget_cookie();
        }
        Ok(reply)
    }

    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<ServiceResponse<ApiMessage>, IdentityError> {
        let response = self
            .client
            .post(self.url(REGISTER_ENDPOINT))
            .json(&registration.to_wire())
            .send()
            .await?;
        read_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_carries_session() {
        assert!(carries_session("theme=dark; session=abc123"));
        assert!(!carries_session("session="));
        assert!(!carries_session("theme=dark"));
    }

    fn service(server: &MockServer) -> HttpIdentityService {
        HttpIdentityService::new(format!("{}/api/v1/", server.uri())).expect("client")
    }

    #[tokio::test]
    async fn test_who_am_i_decodes_identity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "username": "ana",
                "nome_completo": "Ana Souza",
                "email": "ana@example.com",
                "is_active": true,
                "created_at": "2024-05-01T12:00:00"
            })))
            .mount(&server)
            .await;

        let reply = service(&server).who_am_i().await.expect("who_am_i");
        assert!(reply.ok());
        let record = reply.data.expect("identity body");
        assert_eq!(record.username.as_deref(), Some("ana"));
        assert_eq!(record.is_active, Some(true));
    }

    #[tokio::test]
    async fn test_who_am_i_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"detail": "Não autenticado"})),
            )
            .mount(&server)
            .await;

        let reply = service(&server).who_am_i().await.expect("who_am_i");
        assert_eq!(reply.status, 401);
        assert!(!reply.ok());
        assert!(reply.data.is_none());
    }

    #[tokio::test]
    async fn test_who_am_i_malformed_success_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html>", "text/html"))
            .mount(&server)
            .await;

        let result = service(&server).who_am_i().await;
        assert!(matches!(result, Err(IdentityError::Decode(_))));
    }

    #[tokio::test]
    async fn test_login_cookie_is_replayed_on_me() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .and(body_partial_json(serde_json::json!({"username": "ana"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "session=tok123; Path=/; HttpOnly")
                    .set_body_json(serde_json::json!({"message": "Login efetuado"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me"))
            .and(header("cookie", "session=tok123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "username": "ana",
                "is_active": true
            })))
            .mount(&server)
            .await;

        let identity = service(&server);
        let login = identity
            .login(&Credentials::new("ana", "secret"))
            .await
            .expect("login");
        assert!(login.ok());

        let me = identity.who_am_i().await.expect("me");
        assert!(me.ok(), "cookie from login should authenticate /auth/me");
    }

    #[tokio::test]
    async fn test_login_rejection_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(serde_json::json!({"detail": "Conta inativa"})),
            )
            .mount(&server)
            .await;

        let reply = service(&server)
            .login(&Credentials::new("ana", "secret"))
            .await
            .expect("login");
        assert_eq!(reply.status, 403);
        assert_eq!(
            reply.data.and_then(|m| m.detail_text()).as_deref(),
            Some("Conta inativa")
        );
    }

    #[tokio::test]
    async fn test_cookie_file_survives_new_client() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "session=persisted; Path=/; HttpOnly"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me"))
            .and(header("cookie", "session=persisted"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "username": "ana",
                "is_active": true
            })))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let file = SessionCookieFile::new(tmp.path().join("cookie"));

        let first = service(&server).with_cookie_file(file.clone());
        first
            .login(&Credentials::new("ana", "secret"))
            .await
            .expect("login");
        assert!(file.path().exists());

        let second = service(&server).with_cookie_file(file);
        let me = second.who_am_i().await.expect("me");
        assert!(me.ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_request_error() {
        let identity = HttpIdentityService::new("http://127.0.0.1:9").expect("client");
        let result = identity.who_am_i().await;
        assert!(matches!(result, Err(IdentityError::Request(_))));
    }
}
