//! Conversation log
//!
//! Every turn is appended as a [`Message`] and rendered through a
//! [`LogView`]; the latest message is mirrored to the view's status line.

use std::fmt;
use std::io::Write;

/// Who sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    /// The person talking to the assistant
    User,
    /// The assistant
    Bot,
}

impl Sender {
    /// Lowercase tag used for styling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Who sent it
    pub sender: Sender,
    /// What was said
    pub text: String,
}

impl Message {
    /// Status-line rendering, e.g. `"BOT: Hello!"`
    #[must_use]
    pub fn status_line(&self) -> String {
        format!("{}: {}", self.sender.as_str().to_uppercase(), self.text)
    }
}

/// Where the conversation is displayed
pub trait LogView: Send {
    /// Show a new message at the end of the panel
    fn render(&mut self, message: &Message);

    /// Overwrite the single-line status
    fn set_status(&mut self, status: &str);

    /// Show a blocking notice to the user
    fn alert(&mut self, text: &str);
}

/// Append-only conversation history bound to a view
pub struct ConversationLog {
    messages: Vec<Message>,
    view: Box<dyn LogView>,
}

impl ConversationLog {
    /// Create an empty log rendering into `view`
    #[must_use]
    pub fn new(view: Box<dyn LogView>) -> Self {
        Self {
            messages: Vec::new(),
            view,
        }
    }

    /// Append a message, render it and mirror it to the status line
    pub fn append(&mut self, sender: Sender, text: impl Into<String>) {
        let message = Message {
            sender,
            text: text.into(),
        };

        tracing::debug!(%sender, text = %message.text, "message appended");
        self.view.render(&message);
        self.view.set_status(&message.status_line());
        self.messages.push(message);
    }

    /// Overwrite the status line without logging a message
    pub fn set_status(&mut self, status: &str) {
        self.view.set_status(status);
    }

    /// Show a blocking notice
    pub fn alert(&mut self, text: &str) {
        tracing::warn!(text, "alert");
        self.view.alert(text);
    }

    /// All messages so far, oldest first
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// Terminal rendering: messages on stdout, status and alerts on stderr
#[derive(Debug, Default)]
pub struct TerminalView {
    bot_name: String,
}

impl TerminalView {
    /// Create a view labelling bot messages with `bot_name`
    #[must_use]
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
        }
    }
}

impl LogView for TerminalView {
    fn render(&mut self, message: &Message) {
        let label = match message.sender {
            Sender::User => "you",
            Sender::Bot => self.bot_name.as_str(),
        };
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{label}> {}", message.text);
        let _ = stdout.flush();
    }

    fn set_status(&mut self, status: &str) {
        let _ = writeln!(std::io::stderr().lock(), "  [{status}]");
    }

    fn alert(&mut self, text: &str) {
        let _ = writeln!(std::io::stderr().lock(), "!! {text}");
    }
}
