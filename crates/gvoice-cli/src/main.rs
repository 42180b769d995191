//! gvoice - command-line client for Google Voice
//!
//! Place and cancel calls, send SMS, list and search folders, download
//! voicemail, and manage forwarding phones. With no subcommand it starts an
//! interactive prompt.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gvoice_core::config::default_config_path;
use gvoice_core::{Config, Feed, Voice};

mod commands;
mod interactive;
mod login;
mod output;
mod prompt;

use commands::messages::Action;
use login::LoginOptions;
use output::OutputControls;
use prompt::Prompter;

/// Command-line client for Google Voice.
#[derive(Parser, Debug)]
#[command(name = "gvoice")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Google Voice account email
    #[arg(short, long, global = true)]
    email: Option<String>,

    /// Account password (prompted if missing)
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// Batch mode: never prompt, exit on login failure
    #[arg(short, long, global = true)]
    batch: bool,

    /// Config file (default: $GVOICE_CONFIG or ~/.gvoice)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Compact JSON output (no whitespace)
    #[arg(long, global = true)]
    compact: bool,

    /// Comma-separated field allowlist
    #[arg(long, global = true)]
    fields: Option<String>,

    /// Truncate text fields to this length
    #[arg(long, global = true)]
    max_text_chars: Option<u32>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    // =========================================================================
    // SESSION
    // =========================================================================
    /// Log in and report the account
    #[command(alias = "li")]
    Login,

    /// Interactive prompt (the default)
    Interactive,

    // =========================================================================
    // CALLS AND SMS
    // =========================================================================
    /// Call an outgoing number from a forwarding number
    #[command(alias = "c")]
    Call {
        /// Number to call
        outgoing: String,

        /// Phone to ring first (default: [gvoice] forwarding_number)
        #[arg(short, long)]
        forwarding: Option<String>,

        /// Forwarding phone type: 1-Home, 2-Mobile, 3-Work, 7-Gizmo
        #[arg(short = 't', long, value_parser = commands::calls::parse_phone_type)]
        phone_type: Option<gvoice_core::PhoneType>,

        /// Subscriber number
        #[arg(short, long)]
        subscriber: Option<String>,
    },

    /// Cancel a call that is still ringing
    #[command(alias = "cc")]
    Cancel {
        #[arg(long)]
        outgoing: Option<String>,

        #[arg(long)]
        forwarding: Option<String>,
    },

    /// Send an SMS
    #[command(alias = "send_sms", alias = "s")]
    SendSms {
        /// Destination number
        phone: String,

        /// Message text
        #[arg(required = true)]
        message: Vec<String>,
    },

    // =========================================================================
    // FOLDERS
    // =========================================================================
    /// Show a folder: inbox, starred, all, spam, trash, voicemail, sms,
    /// recorded, placed, received, missed
    Folder {
        feed: Feed,
    },

    /// Search calls, voicemail and SMS
    #[command(alias = "se")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    // =========================================================================
    // MESSAGES
    // =========================================================================
    /// Download the mp3 of a voicemail or recorded call
    #[command(alias = "d")]
    Download {
        /// Message id
        id: String,

        /// Destination directory
        #[arg(short, long, default_value = ".")]
        dir: String,
    },

    /// Archive a message
    Archive {
        id: String,

        /// Move it back to the inbox instead
        #[arg(long)]
        undo: bool,
    },

    /// Move a message to the trash
    Delete {
        id: String,

        /// Restore it from the trash instead
        #[arg(long)]
        undo: bool,
    },

    /// Star a message
    Star {
        id: String,

        #[arg(long)]
        undo: bool,
    },

    /// Mark a message read
    Mark {
        id: String,

        /// Mark unread instead
        #[arg(long)]
        unread: bool,
    },

    // =========================================================================
    // ACCOUNT
    // =========================================================================
    /// List forwarding phones
    Phones,

    /// Show account settings
    Settings,

    /// Enable forwarding to a phone
    EnablePhone {
        phone_id: String,
    },

    /// Disable forwarding to a phone
    DisablePhone {
        phone_id: String,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn load_config(path: Option<&str>) -> Result<Config> {
    let path = match path {
        Some(p) => PathBuf::from(shellexpand::tilde(p).to_string()),
        None => default_config_path(),
    };
    let mut config = Config::load(&path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

fn run(cli: Cli, output: &OutputControls) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let options = LoginOptions::from_env(&config.auth, cli.email, cli.password, cli.batch);

    let mut voice = Voice::new(&config).context("failed to set up HTTP client")?;
    let mut prompter = Prompter::stdio();
    if !login::login(&mut voice, &options, &mut prompter)? {
        bail!("couldn't log in");
    }

    let result = dispatch(cli.command, &mut voice, &options, &mut prompter, output);

    eprintln!("Logging out of voice...");
    voice.logout();
    result
}

fn dispatch(
    command: Option<Command>,
    voice: &mut Voice,
    options: &LoginOptions,
    prompter: &mut Prompter<std::io::StdinLock<'static>, std::io::Stderr>,
    output: &OutputControls,
) -> Result<()> {
    match command.unwrap_or(Command::Interactive) {
        Command::Login => commands::account::status(voice, output),
        Command::Interactive => interactive::run(voice, options, prompter, output),

        Command::Call { outgoing, forwarding, phone_type, subscriber } => commands::calls::call(
            voice,
            &outgoing,
            forwarding.as_deref(),
            phone_type,
            subscriber.as_deref(),
            output,
        ),
        Command::Cancel { outgoing, forwarding } => {
            commands::calls::cancel(voice, outgoing.as_deref(), forwarding.as_deref(), output)
        }
        Command::SendSms { phone, message } => {
            commands::messaging::send_sms(voice, &phone, &message.join(" "), output)
        }

        Command::Folder { feed } => commands::folders::folder(voice, feed, output),
        Command::Search { query } => commands::folders::search(voice, &query.join(" "), output),

        Command::Download { id, dir } => {
            let dir = commands::messages::expand_dir(&dir);
            commands::messages::download(voice, &id, &dir, output)
        }
        Command::Archive { id, undo } => commands::messages::update(voice, Action::Archive, &id, !undo, output),
        Command::Delete { id, undo } => commands::messages::update(voice, Action::Trash, &id, !undo, output),
        Command::Star { id, undo } => commands::messages::update(voice, Action::Star, &id, !undo, output),
        Command::Mark { id, unread } => commands::messages::update(voice, Action::Read, &id, !unread, output),

        Command::Phones => commands::account::phones(voice, output),
        Command::Settings => commands::account::settings(voice, output),
        Command::EnablePhone { phone_id } => commands::account::set_forwarding(voice, &phone_id, true, output),
        Command::DisablePhone { phone_id } => commands::account::set_forwarding(voice, &phone_id, false, output),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output_controls = OutputControls {
        json: cli.json,
        compact: cli.compact,
        fields: cli.fields.clone(),
        max_text_chars: cli.max_text_chars,
    };

    match run(cli, &output_controls) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if output_controls.json {
                println!("{}", output::format_error(&e));
            } else {
                eprintln!("Error: {}", output::describe(&e));
            }
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["gvoice", "-e", "me@example.com", "-b"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.batch);
        assert_eq!(cli.email.as_deref(), Some("me@example.com"));
    }

    #[test]
    fn test_send_sms_joins_words() {
        let cli = Cli::try_parse_from(["gvoice", "send_sms", "+14155551234", "on", "my", "way"]).unwrap();
        match cli.command {
            Some(Command::SendSms { phone, message }) => {
                assert_eq!(phone, "+14155551234");
                assert_eq!(message.join(" "), "on my way");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_folder_and_phone_type_parsing() {
        let cli = Cli::try_parse_from(["gvoice", "--json", "folder", "voicemail"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Some(Command::Folder { feed: Feed::Voicemail })));

        assert!(Cli::try_parse_from(["gvoice", "folder", "drafts"]).is_err());

        let cli = Cli::try_parse_from(["gvoice", "call", "+18005551212", "-t", "gizmo"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Call { phone_type: Some(gvoice_core::PhoneType::Gizmo), .. })
        ));
    }

    #[test]
    fn test_load_config_from_flag_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gvoice]\nforwarding_number = \"+14155550000\"\nphone_type = 2").unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.gvoice.forwarding_number.as_deref(), Some("+14155550000"));
        assert_eq!(config.gvoice.phone_type, Some(2));
    }

    #[test]
    fn test_bad_config_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gvoice\nphone_type = ").unwrap();

        let err = load_config(file.path().to_str()).unwrap_err();
        assert!(output::format_error(&err).contains("CONFIG_ERROR"));
    }
}
