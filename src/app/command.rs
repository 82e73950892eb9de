//! Typed commands and the line parser used by the terminal front end.
//!
//! [`Command`] is the closed set of actions [`super::App::dispatch`] accepts.
//! [`CommandParser`] turns one line of user input into an [`Input`]: either a
//! ready [`Command`], a request that needs more input first (password
//! prompts), or a purely local action such as showing the board.

use log::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Roll,
    Move,
    MoveToCell(u32),
    Reset,
    AddComment { cell: u32, text: String },
    DeleteComment(u32),
    ClearComments,
    Save,
    Login { username: String, password: String },
    Register {
        username: String,
        password: String,
        email: Option<String>,
    },
    Logout,
    ChangePassword { current: String, new_password: String },
    EnterGuest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    /// Username is known; password still has to be read.
    LoginPrompt(Option<String>),
    RegisterPrompt(Option<String>),
    PasswordPrompt,
    Show,
    ListComments,
    Status,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub const HELP: &str = "\
Commands:
  roll (r)              roll the die
  move (m)              move by the rolled value
  goto <cell>           jump straight to a cell (1-100)
  reset                 start a new game (comments are kept)
  comment <cell> <text> add or replace a comment on a cell
  uncomment <cell>      remove a cell comment
  clearcomments         remove all comments
  comments              list comments
  board (b)             show the board
  save                  save progress now
  status                show session and storage info
  login [user]          log in (prompts for password)
  register [user]       create an account
  passwd                change your password
  guest                 play as guest
  logout                end the session
  help (?)              this text
  quit (q)              leave";

#[derive(Debug, Default)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, raw: &str) -> Input {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Input::Empty;
        }
        let (word, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (trimmed, ""),
        };
        let word = word.to_ascii_lowercase();
        trace!("Parsed '{}' with args '{}'", word, rest);

        match word.as_str() {
            "roll" | "r" => Input::Command(Command::Roll),
            "move" | "m" => Input::Command(Command::Move),
            "goto" | "jump" => match parse_cell(rest) {
                Some(n) => Input::Command(Command::MoveToCell(n)),
                None => Input::Invalid("Usage: goto <cell>".into()),
            },
            "reset" | "new" => Input::Command(Command::Reset),
            "comment" | "note" => {
                let (cell, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                match parse_cell(cell) {
                    Some(n) if !text.trim().is_empty() => Input::Command(Command::AddComment {
                        cell: n,
                        text: text.trim().to_string(),
                    }),
                    _ => Input::Invalid("Usage: comment <cell> <text>".into()),
                }
            }
            "uncomment" | "delcomment" => match parse_cell(rest) {
                Some(n) => Input::Command(Command::DeleteComment(n)),
                None => Input::Invalid("Usage: uncomment <cell>".into()),
            },
            "clearcomments" => Input::Command(Command::ClearComments),
            "comments" | "notes" => Input::ListComments,
            "board" | "b" | "show" => Input::Show,
            "save" => Input::Command(Command::Save),
            "status" => Input::Status,
            "login" => Input::LoginPrompt(first_word(rest)),
            "register" => Input::RegisterPrompt(first_word(rest)),
            "passwd" | "password" => Input::PasswordPrompt,
            "guest" => Input::Command(Command::EnterGuest),
            "logout" => Input::Command(Command::Logout),
            "help" | "?" => Input::Help,
            "quit" | "exit" | "q" => Input::Quit,
            _ => Input::Invalid(format!("Unknown command '{}'. Type 'help'", word)),
        }
    }
}

/// Cell argument as typed. Range is checked by the game itself so that the
/// user sees its message for `goto 0` or `goto 500`.
fn parse_cell(s: &str) -> Option<u32> {
    s.trim().parse::<u32>().ok()
}

fn first_word(s: &str) -> Option<String> {
    s.split_whitespace().next().map(str::to_string)
}
