//! Line-oriented terminal prompts.
//!
//! Prompts go to stderr so `--json` output on stdout stays machine-readable.

use std::io::{self, BufRead, IsTerminal, Write};

/// Reads a secret after showing its prompt, without echoing it.
pub type SecretReader = fn(&str) -> io::Result<String>;

pub struct Prompter<R, W> {
    input: R,
    output: W,
    secret: Option<SecretReader>,
}

impl Prompter<io::StdinLock<'static>, io::Stderr> {
    /// Prompts on stderr. Secrets are read from the terminal with echo off
    /// when stdin is a terminal.
    pub fn stdio() -> Self {
        let prompter = Self::new(io::stdin().lock(), io::stderr());
        if io::stdin().is_terminal() {
            prompter.with_secret_reader(read_hidden)
        } else {
            prompter
        }
    }
}

fn read_hidden(prompt: &str) -> io::Result<String> {
    rpassword::prompt_password(prompt)
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            secret: None,
        }
    }

    pub fn with_secret_reader(mut self, reader: SecretReader) -> Self {
        self.secret = Some(reader);
        self
    }

    /// Print `prompt` and read one trimmed line. End of input is an error.
    pub fn ask(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no more input"));
        }
        Ok(line.trim().to_string())
    }

    /// Ask for a password or PIN. Without a secret reader (input is not a
    /// terminal) this is a plain [`ask`](Self::ask).
    pub fn ask_secret(&mut self, prompt: &str) -> io::Result<String> {
        match self.secret {
            Some(read) => read(prompt),
            None => self.ask(prompt),
        }
    }

    /// Like [`ask`](Self::ask), but an empty answer is `None`.
    pub fn ask_optional(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let answer = self.ask(prompt)?;
        Ok(if answer.is_empty() { None } else { Some(answer) })
    }

    /// `[Y/n]` question; an empty answer means yes.
    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        let answer = self.ask(prompt)?.to_lowercase();
        Ok(matches!(answer.as_str(), "" | "y" | "yes"))
    }

    pub fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_ask_trims_and_echoes_prompt() {
        let mut p = prompter("  +14155551234 \n");
        assert_eq!(p.ask("Phone number: ").unwrap(), "+14155551234");
        assert_eq!(p.into_output(), b"Phone number: ");
    }

    #[test]
    fn test_ask_at_eof() {
        let mut p = prompter("");
        let err = p.ask("Message: ").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_secret_reader_bypasses_echoed_input() {
        fn pin(prompt: &str) -> io::Result<String> {
            assert_eq!(prompt, "PIN: ");
            Ok("123456".into())
        }
        let mut p = prompter("visible\n").with_secret_reader(pin);
        assert_eq!(p.ask_secret("PIN: ").unwrap(), "123456");
        assert_eq!(p.ask("Name: ").unwrap(), "visible");
        assert_eq!(p.into_output(), b"Name: ");
    }

    #[test]
    fn test_optional_and_confirm() {
        let mut p = prompter("\n\nn\nYes\n");
        assert_eq!(p.ask_optional("Forwarding number [optional]: ").unwrap(), None);
        assert!(p.confirm("Retry? [Y/n] ").unwrap());
        assert!(!p.confirm("Retry? [Y/n] ").unwrap());
        assert!(p.confirm("Retry? [Y/n] ").unwrap());
    }
}
