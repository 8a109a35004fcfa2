//! OAuth 2.0 for the Google Sheets API.
//!
//! `TokenProvider` loads `token.json` and refreshes the access token when it is about to expire.
//! When no token exists yet it runs the installed-app consent flow: a loopback HTTP server receives
//! the authorization code, which is exchanged for tokens and saved.

use crate::api::files::{File, SecretFile, TokenFile};
use crate::api::OAUTH_SCOPES;
use crate::error::Res;
use anyhow::{bail, Context};
use chrono::Utc;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::convert::Infallible;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How long the consent flow waits for the browser to come back.
const CONSENT_TIMEOUT: Duration = Duration::from_secs(300);

type OAuthClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Provides a valid access token, refreshing it when needed.
pub(crate) struct TokenProvider {
    secret: SecretFile,
    token: File<TokenFile>,
    http: reqwest::Client,
}

impl TokenProvider {
    /// Loads the existing token file, or runs the consent flow if there is none.
    pub(crate) async fn load_or_initialize(secret_path: &Path, token_path: &Path) -> Res<Self> {
        if token_path.is_file() {
            Self::load(secret_path, token_path).await
        } else {
            info!(
                "No OAuth token found at {}, starting the consent flow",
                token_path.display()
            );
            Self::initialize(secret_path, token_path).await
        }
    }

    /// Loads the client secret and the existing token file. Never opens a browser.
    pub(crate) async fn load(secret_path: &Path, token_path: &Path) -> Res<Self> {
        let secret = SecretFile::load(secret_path).await?;
        let token = TokenFile::load(token_path).await?;
        debug!("Token valid until: {}", token.data().expires_at());
        Ok(Self {
            secret,
            token,
            http: http_client()?,
        })
    }

    /// Runs the consent flow and saves the resulting tokens to `token_path`.
    pub(crate) async fn initialize(secret_path: &Path, token_path: &Path) -> Res<Self> {
        let secret = SecretFile::load(secret_path).await?;
        let http = http_client()?;

        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .context("Unable to start the local OAuth callback server")?;
        let port = listener.local_addr()?.port();
        let redirect = format!("{}:{port}", secret.redirect_host());
        let client = oauth_client(&secret)?.set_redirect_uri(
            RedirectUrl::new(redirect.clone()).context("Invalid OAuth redirect URL")?,
        );

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let mut request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge)
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent");
        for scope in OAUTH_SCOPES {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        let (auth_url, csrf) = request.url();

        info!("Open this URL to authorize tosheets:\n\n{auth_url}\n");
        if let Err(e) = open::that_detached(auth_url.as_str()) {
            warn!("Unable to open a browser: {e}");
        }

        let code = tokio::time::timeout(CONSENT_TIMEOUT, wait_for_code(listener, csrf.secret()))
            .await
            .context("Timed out waiting for the OAuth consent")??;

        let response = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http)
            .await
            .context("Failed to exchange the authorization code for a token")?;

        let refresh_token = response
            .refresh_token()
            .map(|t| t.secret().to_string())
            .context("Google did not return a refresh token")?;
        let scopes = match response.scopes() {
            Some(scopes) => scopes.iter().map(|s| s.to_string()).collect(),
            None => OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
        };
        let token = TokenFile::new(
            scopes,
            response.access_token().secret().to_string(),
            refresh_token,
            expires_at(response.expires_in()),
            None,
        );
        let token = File::new(token_path, token);
        token.save().await?;
        info!("Tokens saved to {}", token_path.display());

        Ok(Self {
            secret,
            token,
            http,
        })
    }

    /// The current access token, which may be expired.
    pub(crate) fn token(&self) -> &str {
        self.token.data().access_token()
    }

    /// The access token, refreshed first if it is expired or about to expire.
    pub(crate) async fn token_with_refresh(&mut self) -> Res<&str> {
        if self.token.data().is_expired() {
            self.refresh().await?;
        }
        Ok(self.token())
    }

    /// Exchanges the refresh token for a new access token and saves it.
    pub(crate) async fn refresh(&mut self) -> Res<()> {
        debug!("Refreshing the OAuth access token");
        let refresh_token = RefreshToken::new(self.token.data().refresh_token().to_string());
        let response = oauth_client(&self.secret)?
            .exchange_refresh_token(&refresh_token)
            .request_async(&self.http)
            .await
            .context("Failed to refresh the OAuth token, delete token.json to re-authorize")?;

        self.token.data_mut().update(
            response.access_token().secret().to_string(),
            expires_at(response.expires_in()),
            response.refresh_token().map(|t| t.secret().to_string()),
        );
        self.token.save().await?;
        debug!("Refreshed token saved to {}", self.token.path().display());
        Ok(())
    }
}

fn oauth_client(secret: &SecretFile) -> Res<OAuthClient> {
    Ok(BasicClient::new(ClientId::new(secret.client_id().to_string()))
        .set_client_secret(ClientSecret::new(secret.client_secret().to_string()))
        .set_auth_uri(AuthUrl::new(secret.auth_uri().to_string()).context("Invalid auth_uri")?)
        .set_token_uri(TokenUrl::new(secret.token_uri().to_string()).context("Invalid token_uri")?))
}

fn http_client() -> Res<reqwest::Client> {
    // Redirects are not followed for token requests.
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Unable to build the HTTP client")
}

fn expires_at(expires_in: Option<Duration>) -> chrono::DateTime<Utc> {
    let seconds = expires_in.map(|d| d.as_secs()).unwrap_or(3600);
    Utc::now() + chrono::Duration::seconds(seconds as i64)
}

/// Serves the loopback redirect until a request carrying `code` and the expected `state` arrives.
async fn wait_for_code(listener: TcpListener, expected_state: &str) -> Res<String> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Res<String>>();
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _) = accepted.context("OAuth callback server failed")?;
                let tx = tx.clone();
                let expected_state = expected_state.to_string();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let tx = tx.clone();
                        let expected_state = expected_state.clone();
                        async move {
                            let body = match parse_callback(req.uri().query(), &expected_state) {
                                Some(result) => {
                                    let body = match &result {
                                        Ok(_) => "tosheets is authorized. You can close this window.",
                                        Err(_) => "tosheets authorization failed. See the terminal for details.",
                                    };
                                    let _ = tx.send(result);
                                    body
                                }
                                None => "Waiting for the OAuth redirect.",
                            };
                            Ok::<_, Infallible>(Response::new(body.to_string()))
                        }
                    });
                    if let Err(e) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        debug!("OAuth callback connection error: {e}");
                    }
                });
            }
            Some(result) = rx.recv() => return result,
        }
    }
}

/// Returns `None` for requests that are not the OAuth redirect (e.g. `/favicon.ico`).
fn parse_callback(query: Option<&str>, expected_state: &str) -> Option<Res<String>> {
    let query = query?;
    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }
    if let Some(error) = error {
        return Some(Err(anyhow::anyhow!("OAuth consent was denied: {error}")));
    }
    let code = code?;
    Some(check_state(state.as_deref(), expected_state).map(|_| code))
}

fn check_state(state: Option<&str>, expected: &str) -> Res<()> {
    match state {
        Some(s) if s == expected => Ok(()),
        _ => bail!("The OAuth state parameter did not match, refusing the authorization code"),
    }
}
