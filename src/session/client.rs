use reqwest::{
    Client as ReqwestClient, Method,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::types::{
    CommandLogRequest, CommandLogResponse, SessionEndResponse, SessionRequest,
    SessionStartResponse,
};
use crate::Result;

/// Client for the session lifecycle endpoints of the SARVIS backend.
///
/// A session is started over REST before the realtime channel is opened for
/// it, and ended after the channel is closed.
///
/// # Example
///
/// ```no_run
/// use sarvis_client::session::Client;
/// use sarvis_client::types::SecretString;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("http://localhost:8000")?
///     .with_token(SecretString::from("access-token"));
///
/// let started = client.start("sess-123").await?;
/// println!("started at {}", started.started_at);
///
/// client.end(&started.session_id).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    host: Url,
    client: ReqwestClient,
    token: Option<SecretString>,
}

impl Client {
    /// Creates a new session API client for `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host URL is invalid or the HTTP client fails to build.
    pub fn new(host: &str) -> Result<Client> {
        let mut headers = HeaderMap::new();

        headers.insert("User-Agent", HeaderValue::from_static("sarvis_client"));
        headers.insert("Accept", HeaderValue::from_static("*/*"));
        headers.insert("Connection", HeaderValue::from_static("keep-alive"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = ReqwestClient::builder().default_headers(headers).build()?;

        Ok(Self {
            host: Url::parse(host)?,
            client,
            token: None,
        })
    }

    /// Authenticate every call with `Authorization: Bearer <token>`.
    #[must_use]
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Returns the host URL for the client.
    #[must_use]
    pub fn host(&self) -> &Url {
        &self.host
    }

    /// Mark `session_id` as started. `POST /api/session/start/`
    pub async fn start(&self, session_id: &str) -> Result<SessionStartResponse> {
        let body = SessionRequest::builder().session_id(session_id).build();
        self.post("api/session/start/", &body).await
    }

    /// Mark `session_id` as ended. `POST /api/session/end/`
    pub async fn end(&self, session_id: &str) -> Result<SessionEndResponse> {
        let body = SessionRequest::builder().session_id(session_id).build();
        self.post("api/session/end/", &body).await
    }

    /// Append a command to the session's log. `POST /api/session/command-log/`
    pub async fn command_log(&self, request: &CommandLogRequest) -> Result<CommandLogResponse> {
        self.post("api/session/command-log/", request).await
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let request = self
            .client
            .request(Method::POST, self.host.join(path)?)
            .json(body)
            .build()?;

        crate::request(&self.client, request, self.auth_headers()?).await
    }

    fn auth_headers(&self) -> Result<Option<HeaderMap>> {
        let Some(token) = &self.token else {
            return Ok(None);
        };

        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(Some(headers))
    }
}
