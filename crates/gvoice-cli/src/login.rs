//! Signing in from the command line.
//!
//! Credentials come from, in order: `--email` / `--password`, the
//! `GOOGLE_VOICE_USER` / `GOOGLE_VOICE_PASS` environment variables, the
//! `[auth]` section of the config file, and finally a prompt. Batch mode
//! never prompts.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use gvoice_core::config::{env_flag, BATCH_ENV};
use gvoice_core::{AuthConfig, Credentials, GvError, NoCode, Oathtool, Voice};
use tracing::debug;

use crate::prompt::Prompter;

#[derive(Debug, Clone, Default)]
pub struct LoginOptions {
    pub email: Option<String>,
    pub password: Option<String>,
    pub sms_key: Option<String>,
    pub batch: bool,
}

impl LoginOptions {
    /// Merge command-line flags over the (env-overridden) `[auth]` config.
    pub fn resolve(
        auth: &AuthConfig,
        email: Option<String>,
        password: Option<String>,
        batch: bool,
        batch_env: Option<&str>,
    ) -> Self {
        Self {
            email: email.or_else(|| auth.email.clone()),
            password: password.or_else(|| auth.password.clone()),
            sms_key: auth.sms_key.clone(),
            batch: batch || env_flag(batch_env),
        }
    }

    pub fn from_env(auth: &AuthConfig, email: Option<String>, password: Option<String>, batch: bool) -> Self {
        let batch_env = std::env::var(BATCH_ENV).ok();
        Self::resolve(auth, email, password, batch, batch_env.as_deref())
    }

    /// Fill in whatever is missing by asking, unless in batch mode.
    pub fn credentials<R: BufRead, W: Write>(&self, prompter: &mut Prompter<R, W>) -> Result<Credentials> {
        let email = match &self.email {
            Some(email) => email.clone(),
            None if self.batch => {
                return Err(GvError::Config(
                    "no email address given (use --email or GOOGLE_VOICE_USER)".into(),
                )
                .into())
            }
            None => prompter.ask("Email address: ").context("failed to read email address")?,
        };
        let password = match &self.password {
            Some(password) => password.clone(),
            None if self.batch => {
                return Err(GvError::Config(
                    "no password given (use --password or GOOGLE_VOICE_PASS)".into(),
                )
                .into())
            }
            None => prompter.ask_secret("Password: ").context("failed to read password")?,
        };

        let credentials = Credentials::new(email, password);
        Ok(match &self.sms_key {
            Some(key) => credentials.with_sms_key(key.clone()),
            None => credentials,
        })
    }
}

/// Log `voice` in. `Ok(false)` means the user gave up (or batch mode hit
/// bad credentials); other failures are errors.
pub fn login<R: BufRead, W: Write>(
    voice: &mut Voice,
    options: &LoginOptions,
    prompter: &mut Prompter<R, W>,
) -> Result<bool> {
    let mut options = options.clone();
    loop {
        let credentials = options.credentials(prompter)?;
        prompter.say(&format!("Logging into voice as {}...", credentials.email))?;

        let result = match credentials.sms_key.as_deref() {
            Some(key) => voice.login_with(&credentials, &mut Oathtool::new(key)),
            None if options.batch => voice.login_with(&credentials, &mut NoCode),
            None => {
                let mut ask_code = || -> gvoice_core::Result<String> {
                    Ok(prompter.ask_secret("SMS verification code: ")?)
                };
                voice.login_with(&credentials, &mut ask_code)
            }
        };

        match result {
            Ok(()) => return Ok(true),
            Err(e) if e.is_auth() => {
                debug!(error = %e, "login rejected");
                if options.batch {
                    prompter.say(&format!("Login failed: {}", e))?;
                    return Ok(false);
                }
                if !prompter.confirm(&format!("Login failed ({}). Retry? [Y/n] ", e))? {
                    return Ok(false);
                }
                // Ask again rather than resubmitting what was just refused
                options.email = Some(credentials.email);
                options.password = None;
            }
            Err(e) => return Err(e).context("login failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gvoice_core::{Config, ServiceConfig};
    use mockito::{Matcher, Server, ServerGuard};
    use std::io::Cursor;

    const LOGIN_PAGE: &str = r#"<input type="hidden" name="gxf" value="AFoagUX-1">"#;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn auth(email: Option<&str>, password: Option<&str>) -> AuthConfig {
        AuthConfig {
            email: email.map(String::from),
            password: password.map(String::from),
            sms_key: None,
        }
    }

    fn voice_for(server: &ServerGuard) -> Voice {
        let config = Config {
            service: ServiceConfig {
                accounts_url: server.url(),
                voice_url: format!("{}/voice/", server.url()),
                sms_retry_delay_secs: 0,
                ..ServiceConfig::default()
            },
            ..Config::default()
        };
        Voice::new(&config).unwrap()
    }

    /// Every password is refused with a 403.
    fn mock_rejecting_sign_in(server: &mut ServerGuard, attempts: usize) -> Vec<mockito::Mock> {
        vec![
            server
                .mock("GET", "/ServiceLogin")
                .match_query(Matcher::Any)
                .with_body(LOGIN_PAGE)
                .create(),
            server
                .mock("POST", "/ServiceLoginAuth")
                .with_status(403)
                .expect(attempts)
                .create(),
        ]
    }

    #[test]
    fn test_flags_override_config() {
        let options = LoginOptions::resolve(
            &auth(Some("config@example.com"), Some("from-config")),
            Some("flag@example.com".into()),
            None,
            false,
            None,
        );
        assert_eq!(options.email.as_deref(), Some("flag@example.com"));
        assert_eq!(options.password.as_deref(), Some("from-config"));
        assert!(!options.batch);
    }

    #[test]
    fn test_batch_from_environment() {
        let options = LoginOptions::resolve(&auth(None, None), None, None, false, Some("true"));
        assert!(options.batch);
        let options = LoginOptions::resolve(&auth(None, None), None, None, false, Some("0"));
        assert!(!options.batch);
    }

    #[test]
    fn test_prompts_for_missing_credentials() {
        let options = LoginOptions::resolve(&auth(None, None), None, None, false, None);
        let mut p = prompter("me@example.com\nhunter2\n");

        let credentials = options.credentials(&mut p).unwrap();
        assert_eq!(credentials.email, "me@example.com");
        assert_eq!(credentials.password, "hunter2");
        assert_eq!(p.into_output(), b"Email address: Password: ");
    }

    #[test]
    fn test_password_is_read_as_secret() {
        fn password(prompt: &str) -> std::io::Result<String> {
            assert_eq!(prompt, "Password: ");
            Ok("hunter2".into())
        }
        let options = LoginOptions::resolve(&auth(None, None), None, None, false, None);
        let mut p = prompter("me@example.com\n").with_secret_reader(password);

        let credentials = options.credentials(&mut p).unwrap();
        assert_eq!(credentials.password, "hunter2");
        // Only the email prompt went through the echoing prompter
        assert_eq!(p.into_output(), b"Email address: ");
    }

    #[test]
    fn test_batch_never_prompts() {
        let options = LoginOptions::resolve(&auth(Some("me@example.com"), None), None, None, true, None);
        let mut p = prompter("ignored\n");

        let err = options.credentials(&mut p).unwrap_err();
        let gv = err.downcast_ref::<GvError>().unwrap();
        assert_eq!(gv.code(), "CONFIG_ERROR");
        assert!(p.into_output().is_empty());
    }

    #[test]
    fn test_batch_login_failure_gives_up() {
        let mut server = Server::new();
        let _mocks = mock_rejecting_sign_in(&mut server, 1);
        let mut voice = voice_for(&server);
        let options = LoginOptions::resolve(
            &auth(Some("me@example.com"), Some("wrong")),
            None,
            None,
            true,
            None,
        );
        let mut p = prompter("");

        assert!(!login(&mut voice, &options, &mut p).unwrap());
        let shown = String::from_utf8(p.into_output()).unwrap();
        assert!(shown.contains("Login failed"));
        assert!(!voice.session().is_authenticated());
    }

    #[test]
    fn test_interactive_retry_asks_for_password_again() {
        let mut server = Server::new();
        let mocks = mock_rejecting_sign_in(&mut server, 2);
        let mut voice = voice_for(&server);
        let options = LoginOptions::resolve(
            &auth(Some("me@example.com"), Some("wrong")),
            None,
            None,
            false,
            None,
        );
        // Retry once with a new password, then give up
        let mut p = prompter("y\nstill-wrong\nn\n");

        assert!(!login(&mut voice, &options, &mut p).unwrap());
        let shown = String::from_utf8(p.into_output()).unwrap();
        assert_eq!(shown.matches("Retry? [Y/n]").count(), 2);
        assert!(shown.contains("Password: "));
        mocks[1].assert();
    }

    #[test]
    fn test_network_failure_is_not_retried() {
        let config = Config {
            service: ServiceConfig {
                // Port 1 is reserved; nothing answers there
                accounts_url: "http://127.0.0.1:1/".into(),
                ..ServiceConfig::default()
            },
            ..Config::default()
        };
        let mut voice = Voice::new(&config).unwrap();
        let options = LoginOptions::resolve(&auth(Some("me@example.com"), Some("pw")), None, None, false, None);
        let mut p = prompter("");

        let err = login(&mut voice, &options, &mut p).unwrap_err();
        let gv = err.chain().find_map(|c| c.downcast_ref::<GvError>()).unwrap();
        assert_eq!(gv.code(), "NETWORK_ERROR");
    }
}
