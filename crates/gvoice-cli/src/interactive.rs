//! The `gvoice>` prompt.
//!
//! Accepts full command words and one- or two-letter aliases; `help`
//! prints the table below. Failures are reported and the loop goes on.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::Result;
use gvoice_core::{Feed, Voice};

use crate::commands::{account, calls, folders, messages, messaging};
use crate::login::{self, LoginOptions};
use crate::output::{describe, OutputControls};
use crate::prompt::Prompter;

pub const HELP: &str = "\
Commands
    login (li)       log into the voice service
    logout (lo)      log out and drop the session
    help (h, ?)      show this help
    quit (q, exit)   leave

Voice commands
    call (c)         call an outgoing number from a forwarding number
    cancel (cc)      cancel a call that is still ringing
    download (d)     download the mp3 of a message given its id
    sendsms (s)      send an SMS

Folder views
    search (se)   inbox (i)     voicemail (v)   starred (st)
    all (a)       spam (sp)     trash (t)       sms (sm)
    recorded (r)  placed (p)    received (re)   missed (m)

Account
    phones   settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Help,
    Login,
    Logout,
    Call,
    Cancel,
    SendSms,
    Search,
    Download,
    Folder(Feed),
    Phones,
    Settings,
}

impl Action {
    pub fn parse(input: &str) -> Option<Action> {
        let action = match input.trim().to_lowercase().as_str() {
            "q" | "quit" | "exit" => Action::Quit,
            "h" | "?" | "help" => Action::Help,
            "li" | "login" => Action::Login,
            "lo" | "logout" => Action::Logout,
            "c" | "call" => Action::Call,
            "cc" | "cancel" | "cancelcall" => Action::Cancel,
            "s" | "sendsms" | "send_sms" | "send-sms" => Action::SendSms,
            "se" | "search" => Action::Search,
            "d" | "download" => Action::Download,
            "i" | "inbox" => Action::Folder(Feed::Inbox),
            "v" | "voicemail" => Action::Folder(Feed::Voicemail),
            "st" | "starred" => Action::Folder(Feed::Starred),
            "a" | "all" => Action::Folder(Feed::All),
            "sp" | "spam" => Action::Folder(Feed::Spam),
            "t" | "trash" => Action::Folder(Feed::Trash),
            "sm" | "sms" => Action::Folder(Feed::Sms),
            "r" | "recorded" => Action::Folder(Feed::Recorded),
            "p" | "placed" => Action::Folder(Feed::Placed),
            "re" | "received" => Action::Folder(Feed::Received),
            "m" | "missed" => Action::Folder(Feed::Missed),
            "phones" => Action::Phones,
            "settings" => Action::Settings,
            _ => return None,
        };
        Some(action)
    }
}

/// Run the prompt until `quit` or end of input.
pub fn run<R: BufRead, W: Write>(
    voice: &mut Voice,
    options: &LoginOptions,
    prompter: &mut Prompter<R, W>,
    output: &OutputControls,
) -> Result<()> {
    loop {
        let line = match prompter.ask("gvoice> ") {
            Ok(line) => line,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if line.is_empty() {
            continue;
        }

        let action = match Action::parse(&line) {
            Some(Action::Quit) => return Ok(()),
            Some(action) => action,
            None => {
                prompter.say(&format!("Unknown command '{}'; try 'help'", line))?;
                continue;
            }
        };

        if let Err(e) = perform(voice, action, options, prompter, output) {
            prompter.say(&format!("Error: {}", describe(&e)))?;
        }
    }
}

fn perform<R: BufRead, W: Write>(
    voice: &mut Voice,
    action: Action,
    options: &LoginOptions,
    prompter: &mut Prompter<R, W>,
    output: &OutputControls,
) -> Result<()> {
    match action {
        Action::Quit => Ok(()),
        Action::Help => Ok(prompter.say(HELP)?),
        Action::Login => {
            if login::login(voice, options, prompter)? {
                account::status(voice, output)
            } else {
                Ok(prompter.say("Still logged out")?)
            }
        }
        Action::Logout => {
            voice.logout();
            Ok(prompter.say("Logged out")?)
        }
        Action::Call => {
            let outgoing = prompter.ask("Outgoing number: ")?;
            let forwarding = prompter.ask_optional("Forwarding number [optional]: ")?;
            let phone_type = prompter
                .ask_optional("Phone type [1-Home, 2-Mobile, 3-Work, 7-Gizmo]: ")?
                .map(|t| calls::parse_phone_type(&t))
                .transpose()?;
            calls::call(voice, &outgoing, forwarding.as_deref(), phone_type, None, output)
        }
        Action::Cancel => calls::cancel(voice, None, None, output),
        Action::SendSms => {
            let phone = prompter.ask("Phone number: ")?;
            let message = prompter.ask("Message: ")?;
            messaging::send_sms(voice, &phone, &message, output)
        }
        Action::Search => {
            let query = prompter.ask("Search query: ")?;
            folders::search(voice, &query, output)
        }
        Action::Download => {
            let id = prompter.ask("Message id: ")?;
            messages::download(voice, &id, Path::new("."), output)
        }
        Action::Folder(feed) => folders::folder(voice, feed, output),
        Action::Phones => account::phones(voice, output),
        Action::Settings => account::settings(voice, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gvoice_core::Config;
    use std::io::Cursor;

    fn session(input: &str) -> String {
        let mut voice = Voice::new(&Config::default()).unwrap();
        let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        run(&mut voice, &LoginOptions::default(), &mut prompter, &OutputControls::default()).unwrap();
        String::from_utf8(prompter.into_output()).unwrap()
    }

    #[test]
    fn test_aliases() {
        assert_eq!(Action::parse("c"), Some(Action::Call));
        assert_eq!(Action::parse("CC"), Some(Action::Cancel));
        assert_eq!(Action::parse(" s "), Some(Action::SendSms));
        assert_eq!(Action::parse("se"), Some(Action::Search));
        assert_eq!(Action::parse("d"), Some(Action::Download));
        assert_eq!(Action::parse("li"), Some(Action::Login));
        assert_eq!(Action::parse("lo"), Some(Action::Logout));
        assert_eq!(Action::parse("q"), Some(Action::Quit));
        assert_eq!(Action::parse("nope"), None);
    }

    #[test]
    fn test_folder_aliases_cover_every_feed() {
        let aliases = ["a", "i", "st", "sp", "t", "v", "sm", "r", "p", "re", "m"];
        let mut feeds: Vec<Feed> = aliases
            .iter()
            .filter_map(|a| match Action::parse(a) {
                Some(Action::Folder(feed)) => Some(feed),
                _ => None,
            })
            .collect();
        feeds.sort_by_key(|f| f.as_str());
        feeds.dedup();
        assert_eq!(feeds.len(), Feed::ALL.len());
    }

    #[test]
    fn test_quit_ends_session() {
        let shown = session("q\nhelp\n");
        assert_eq!(shown, "gvoice> ");
    }

    #[test]
    fn test_end_of_input_ends_session() {
        let shown = session("\n\n");
        assert_eq!(shown.matches("gvoice> ").count(), 3);
    }

    #[test]
    fn test_unknown_command_keeps_going() {
        let shown = session("frobnicate\nhelp\nquit\n");
        assert!(shown.contains("Unknown command 'frobnicate'"));
        assert!(shown.contains("Folder views"));
    }

    #[test]
    fn test_errors_are_reported_not_fatal() {
        // Signed out, so the send fails without touching the network
        let shown = session("s\n+14155551234\nhello\nv\nq\n");
        assert!(shown.contains("Phone number: Message: "));
        assert_eq!(shown.matches("Error: ").count(), 2);
        assert!(shown.contains("not logged in"));
    }

    #[test]
    fn test_bad_phone_type_is_reported() {
        let shown = session("c\n+18005551212\n\nlandline\nq\n");
        assert!(shown.contains("Error: unknown phone type 'landline'"));
    }
}
