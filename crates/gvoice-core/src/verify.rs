//! Verification codes for two-step (SMS) sign-in.
//!
//! Codes come from a [`CodeSource`]: a TOTP secret run through `oathtool`,
//! a fixed PIN, or any closure (the CLI prompts on stdin).

use std::process::Command;

use crate::error::{AuthError, GvError, Result};

/// Something that can produce a verification code on demand.
///
/// Called once per attempt; sources that can't produce a fresh code
/// may return the same value again.
pub trait CodeSource {
    fn code(&mut self) -> Result<String>;
}

impl<F> CodeSource for F
where
    F: FnMut() -> Result<String>,
{
    fn code(&mut self) -> Result<String> {
        self()
    }
}

/// Strip the spaces Google shows in the secret and uppercase it.
pub fn normalize_secret(secret: &str) -> String {
    secret
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// TOTP codes from the `oathtool` binary.
pub struct Oathtool {
    secret: String,
}

impl Oathtool {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: normalize_secret(secret),
        }
    }
}

impl CodeSource for Oathtool {
    fn code(&mut self) -> Result<String> {
        let output = Command::new("oathtool")
            .arg("--totp")
            .arg("-b")
            .arg(&self.secret)
            .output()
            .map_err(|e| {
                GvError::from(AuthError::Verification(format!("failed to run oathtool: {}", e)))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AuthError::Verification(format!("oathtool failed: {}", stderr.trim())).into());
        }

        let code = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if code.is_empty() {
            return Err(AuthError::Verification("oathtool produced no code".into()).into());
        }
        Ok(code)
    }
}

/// A PIN the caller already has.
pub struct FixedCode(pub String);

impl CodeSource for FixedCode {
    fn code(&mut self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Used when the caller configured nothing; two-step sign-in then fails.
pub struct NoCode;

impl CodeSource for NoCode {
    fn code(&mut self) -> Result<String> {
        Err(AuthError::Verification(
            "two-step verification required but no SMS key or PIN was given".into(),
        )
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_secret() {
        assert_eq!(normalize_secret("jbsw y3dp ehpk 3pxp"), "JBSWY3DPEHPK3PXP");
        assert_eq!(normalize_secret("ABC"), "ABC");
    }

    #[test]
    fn test_fixed_code_repeats() {
        let mut source = FixedCode("123456".into());
        assert_eq!(source.code().unwrap(), "123456");
        assert_eq!(source.code().unwrap(), "123456");
    }

    #[test]
    fn test_no_code_is_verification_error() {
        let err = NoCode.code().unwrap_err();
        assert!(matches!(err, GvError::Auth(AuthError::Verification(_))));
    }

    #[test]
    fn test_closure_source() {
        let mut calls = 0;
        let mut source = || -> Result<String> {
            calls += 1;
            Ok(format!("00000{}", calls))
        };
        assert_eq!(CodeSource::code(&mut source).unwrap(), "000001");
        assert_eq!(CodeSource::code(&mut source).unwrap(), "000002");
    }
}
