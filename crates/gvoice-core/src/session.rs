//! Authenticated HTTP session against the Voice web app.
//!
//! A [`Session`] owns the cookie jar (inside the blocking HTTP client) and the
//! `_rnr_se` page token scraped after sign-in. Its lifecycle is
//! `Unauthenticated -> Authenticated -> Invalidated`; signing in again after
//! logout is allowed.
//!
//! Only the sign-in routine and logout change the session. [`Session::request`]
//! may swap in a freshly scraped token when the service reports the old one
//! as expired, and otherwise leaves the session alone.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::cookie::Jar;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{AuthConfig, ServiceConfig};
use crate::endpoints::{Endpoint, Endpoints};
use crate::error::{AuthError, GvError, Result};
use crate::verify::{CodeSource, NoCode, Oathtool};

const GXF_PATTERN: &str = r#"name="gxf"[^>]*?\bvalue="([^"]*)""#;
const SMS_TOKEN_PATTERN: &str = r#"name="smsToken"[^>]*?\bvalue="([^"]+)""#;
const TOKEN_PATTERN: &str = r#"'_rnr_se':\s*'([^']+)'"#;

/// Shown on the verification page when a code was wrong or stale.
const CODE_REJECTED: &str = "The code you entered didn&#39;t verify.";
const MAX_SMS_ATTEMPTS: u32 = 5;

/// Form fields whose values never go to the log.
const SECRET_FIELDS: [&str; 4] = ["Passwd", "smsUserPin", "smsToken", "_rnr_se"];

/// Opaque page token (`_rnr_se`) that authorizes mutating requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(<{} chars>)", self.0.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    Invalidated,
}

/// Google account credentials.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    /// Base32 TOTP secret for answering SMS verification with `oathtool`.
    pub sms_key: Option<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            sms_key: None,
        }
    }

    pub fn with_sms_key(mut self, sms_key: impl Into<String>) -> Self {
        self.sms_key = Some(sms_key.into());
        self
    }

    /// Take credentials from the `[auth]` config section.
    pub fn from_config(auth: &AuthConfig) -> Result<Self> {
        let email = auth
            .email
            .clone()
            .ok_or_else(|| GvError::Config("no email address configured".into()))?;
        let password = auth
            .password
            .clone()
            .ok_or_else(|| GvError::Config("no password configured".into()))?;
        Ok(Self {
            email,
            password,
            sms_key: auth.sms_key.clone(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"********")
            .field("sms_key", &self.sms_key.as_ref().map(|_| "********"))
            .finish()
    }
}

/// Query and form parameters for one request.
///
/// Form parameters turn the request into a POST (and get the page token
/// appended); otherwise it is a GET.
#[derive(Debug, Clone, Default)]
pub struct Params {
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn form(mut self, key: &str, value: impl Into<String>) -> Self {
        self.form.push((key.to_string(), value.into()));
        self
    }

    pub fn is_post(&self) -> bool {
        !self.form.is_empty()
    }

    /// Parameter names with secrets masked, for logging.
    fn describe(&self) -> String {
        self.query
            .iter()
            .chain(self.form.iter())
            .map(|(k, v)| {
                if SECRET_FIELDS.contains(&k.as_str()) {
                    format!("{}=***", k)
                } else {
                    format!("{}={}", k, v)
                }
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// What came back: final URL (after redirects), status and body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub url: Url,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct Session {
    http: Client,
    endpoints: Endpoints,
    service: ServiceConfig,
    state: SessionState,
    token: Option<Token>,
    email: Option<String>,
}

impl Session {
    /// Create an unauthenticated session.
    pub fn new(service: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(service)?,
            endpoints: service.endpoints()?,
            service: service.clone(),
            state: SessionState::Unauthenticated,
            token: None,
            email: None,
        })
    }

    /// Create a session and sign in.
    pub fn open(service: &ServiceConfig, credentials: &Credentials) -> Result<Self> {
        let mut session = Self::new(service)?;
        session.login(credentials)?;
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    // ========================================================================
    // Sign-in / sign-out
    // ========================================================================

    /// Sign in, answering SMS verification with `oathtool` when the
    /// credentials carry an SMS key.
    pub fn login(&mut self, credentials: &Credentials) -> Result<()> {
        match credentials.sms_key.as_deref() {
            Some(key) => self.login_with(credentials, &mut Oathtool::new(key)),
            None => self.login_with(credentials, &mut NoCode),
        }
    }

    /// Sign in, asking `codes` for verification codes if Google wants one.
    ///
    /// A no-op when already authenticated.
    pub fn login_with(&mut self, credentials: &Credentials, codes: &mut dyn CodeSource) -> Result<()> {
        if self.is_authenticated() {
            debug!("already logged in");
            return Ok(());
        }
        info!(email = %credentials.email, "logging in");

        let page = self.send(&Endpoint::Login, &Params::new(), None)?;
        let page = check_status(page)?;
        let gxf = scrape(GXF_PATTERN, &page.text())
            .ok_or_else(|| GvError::parse("login", "sign-in page has no gxf field"))?;

        let params = Params::new()
            .form("Email", credentials.email.as_str())
            .form("Passwd", credentials.password.as_str())
            .form("gxf", gxf);
        let result = self.send(&Endpoint::LoginPost, &params, None)?;
        if result.status == 401 || result.status == 403 {
            return Err(AuthError::InvalidCredentials.into());
        }

        if self.endpoints.is_sms_auth(&result.url) {
            self.verify_sms(codes)?;
        }

        let token = self.scrape_token()?.ok_or(AuthError::InvalidCredentials)?;
        self.token = Some(token);
        self.email = Some(credentials.email.clone());
        self.state = SessionState::Authenticated;
        info!(email = %credentials.email, "logged in");
        Ok(())
    }

    /// Two-step sign-in: submit codes until one verifies, then hand the
    /// resulting token back to the sign-in page.
    fn verify_sms(&mut self, codes: &mut dyn CodeSource) -> Result<()> {
        info!("SMS verification requested");
        let delay = self.service.sms_retry_delay();

        let mut attempt = 1;
        let mut content = self.submit_code(codes)?;
        while content.contains(CODE_REJECTED) && attempt < MAX_SMS_ATTEMPTS {
            attempt += 1;
            warn!(attempt, delay_secs = delay.as_secs(), "verification code rejected, retrying");
            sleep(delay);
            content = self.submit_code(codes)?;
        }

        let sms_token = scrape(SMS_TOKEN_PATTERN, &content).ok_or_else(|| {
            AuthError::Verification(format!("code not accepted after {} attempt(s)", attempt))
        })?;

        let params = Params::new()
            .form("smsToken", sms_token)
            .form("service", "grandcentral");
        check_status(self.send(&Endpoint::Login, &params, None)?)?;
        Ok(())
    }

    fn submit_code(&mut self, codes: &mut dyn CodeSource) -> Result<String> {
        let pin = codes.code()?;
        let params = Params::new().form("smsUserPin", pin);
        let response = check_status(self.send(&Endpoint::SmsAuth, &params, None)?)?;
        Ok(response.text())
    }

    /// Fetch the inbox page and pull the page token out of its inline script.
    ///
    /// `None` means the account is not signed in (a bounce to the sign-in
    /// page, 401/403, or no token on the page). Any other error status is
    /// `HttpStatus`.
    fn scrape_token(&self) -> Result<Option<Token>> {
        let page = self.send(&Endpoint::Inbox, &Params::new(), None)?;
        if self.is_expired(&page) {
            return Ok(None);
        }
        let page = check_status(page)?;
        Ok(scrape(TOKEN_PATTERN, &page.text()).map(Token))
    }

    /// Sign out and forget the token and cookies. Safe to call repeatedly.
    ///
    /// Without an active session nothing is sent, but cookies left over from
    /// a failed sign-in are still dropped.
    pub fn logout(&mut self) {
        if self.is_authenticated() {
            if let Err(e) = self.send(&Endpoint::Logout, &Params::new(), None) {
                warn!(error = %e, "sign-out request failed, dropping local session anyway");
            }
            self.state = SessionState::Invalidated;
            info!("logged out");
        } else {
            debug!(state = ?self.state, "logout: no active session");
        }

        self.token = None;
        self.email = None;

        // A fresh client is the only way to empty reqwest's cookie jar.
        match build_client(&self.service) {
            Ok(client) => self.http = client,
            Err(e) => warn!(error = %e, "could not rebuild HTTP client, cookies kept"),
        }
        debug!("session cleared");
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Issue an authenticated request.
    ///
    /// Fails with `AuthError::NotLoggedIn` without touching the network when
    /// there is no active session. If the service bounces the request to the
    /// sign-in page (or answers 401/403) the token is re-scraped once and the
    /// request retried; if that does not help the result is `AuthError::Expired`.
    pub fn request(&mut self, endpoint: &Endpoint, params: &Params) -> Result<RawResponse> {
        let token = self.require_token()?;
        let response = self.send(endpoint, params, Some(&token))?;
        if !self.is_expired(&response) {
            return check_status(response);
        }

        warn!(page = %endpoint.name(), "session looks expired, refreshing token");
        let fresh = self.scrape_token()?.ok_or(AuthError::Expired)?;
        self.token = Some(fresh.clone());

        let retry = self.send(endpoint, params, Some(&fresh))?;
        if self.is_expired(&retry) {
            return Err(AuthError::Expired.into());
        }
        check_status(retry)
    }

    fn require_token(&self) -> Result<Token> {
        match (&self.state, &self.token) {
            (SessionState::Authenticated, Some(token)) => Ok(token.clone()),
            _ => Err(AuthError::NotLoggedIn.into()),
        }
    }

    fn is_expired(&self, response: &RawResponse) -> bool {
        response.status == 401 || response.status == 403 || self.endpoints.is_sign_in(&response.url)
    }

    fn send(&self, endpoint: &Endpoint, params: &Params, token: Option<&Token>) -> Result<RawResponse> {
        let url = self.endpoints.url(endpoint);
        let method = if params.is_post() { "POST" } else { "GET" };
        debug!(page = %endpoint.name(), %method, %url, params = %params.describe(), "request");

        let mut builder = if params.is_post() {
            let mut form = params.form.clone();
            if let Some(token) = token {
                form.push(("_rnr_se".to_string(), token.as_str().to_string()));
            }
            self.http.post(url).form(&form)
        } else {
            self.http.get(url)
        };
        if !params.query.is_empty() {
            builder = builder.query(&params.query);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.bytes()?.to_vec();
        debug!(page = %endpoint.name(), status, url = %final_url, bytes = body.len(), "response");

        Ok(RawResponse {
            status,
            url: final_url,
            body,
        })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("email", &self.email)
            .field("token", &self.token)
            .field("voice", &self.endpoints.voice_base().as_str())
            .finish()
    }
}

fn build_client(service: &ServiceConfig) -> Result<Client> {
    let client = Client::builder()
        .cookie_provider(Arc::new(Jar::default()))
        .user_agent(service.user_agent.clone())
        .timeout(service.timeout())
        .build()?;
    Ok(client)
}

fn check_status(response: RawResponse) -> Result<RawResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(GvError::HttpStatus {
            status: response.status,
            url: response.url.to_string(),
        })
    }
}

/// First capture group of `pattern` in `text`.
fn scrape(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn sleep(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
