//! Shared fixtures: a fake sign-in flow on a local mockito server.

#![allow(dead_code)]

use gvoice_core::{Config, Credentials, ServiceConfig, Voice};
use mockito::{Matcher, Mock, Server, ServerGuard};

pub const EMAIL: &str = "me@example.com";
pub const PASSWORD: &str = "hunter2";
pub const GXF: &str = "AFoagUX-123";
pub const TOKEN: &str = "tok-abc+def/=";

pub const LOGIN_PAGE: &str = r#"<html><form action="/ServiceLoginAuth">
<input type="hidden" name="gxf" value="AFoagUX-123">
<input type="email" name="Email"></form></html>"#;

pub const INBOX_PAGE: &str = r#"<html><script>
var _gcData = { 'flags': {}, '_rnr_se': 'tok-abc+def/=', 'number': {} };
</script></html>"#;

pub const SIGNED_OUT_PAGE: &str = "<html><title>Sign in - Google Accounts</title></html>";

pub fn service(server: &ServerGuard) -> ServiceConfig {
    ServiceConfig {
        accounts_url: server.url(),
        voice_url: format!("{}/voice/", server.url()),
        user_agent: "gvoice-tests".to_string(),
        timeout_secs: 5,
        sms_retry_delay_secs: 0,
    }
}

pub fn config(server: &ServerGuard) -> Config {
    Config {
        service: service(server),
        ..Config::default()
    }
}

pub fn credentials() -> Credentials {
    Credentials::new(EMAIL, PASSWORD)
}

pub fn form(pairs: &[(&str, &str)]) -> Matcher {
    Matcher::AllOf(
        pairs
            .iter()
            .map(|(k, v)| Matcher::UrlEncoded(k.to_string(), v.to_string()))
            .collect(),
    )
}

pub fn mock_login_page(server: &mut Server) -> Mock {
    server
        .mock("GET", "/ServiceLogin")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(LOGIN_PAGE)
        .create()
}

pub fn mock_login_post(server: &mut Server) -> Mock {
    server
        .mock("POST", "/ServiceLoginAuth")
        .match_body(form(&[("Email", EMAIL), ("Passwd", PASSWORD), ("gxf", GXF)]))
        .with_status(200)
        .with_body("<html>welcome</html>")
        .create()
}

pub fn mock_inbox(server: &mut Server) -> Mock {
    server
        .mock("GET", "/voice/")
        .with_status(200)
        .with_body(INBOX_PAGE)
        .create()
}

/// All mocks for a plain (no two-step) sign-in.
pub fn mock_sign_in(server: &mut Server) -> Vec<Mock> {
    vec![
        mock_login_page(server),
        mock_login_post(server),
        mock_inbox(server),
    ]
}

/// A signed-in client plus the mocks that must outlive it.
pub fn signed_in(server: &mut ServerGuard) -> (Voice, Vec<Mock>) {
    let config = config(server);
    signed_in_with(server, config)
}

/// Like [`signed_in`], with a caller-built config.
pub fn signed_in_with(server: &mut ServerGuard, config: Config) -> (Voice, Vec<Mock>) {
    let mocks = mock_sign_in(server);
    let mut voice = Voice::new(&config).expect("client");
    voice.login(&credentials()).expect("login");
    (voice, mocks)
}

pub fn feed_xml(json: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<response><json><![CDATA[{}]]></json><html><![CDATA[<div></div>]]></html></response>"#,
        json
    )
}
