//! Karen - a keyword-driven voice assistant
//!
//! Listens for speech (or typed text), matches it against a small ordered
//! set of keyword intents, looks up "who is" / "what is" questions on
//! Wikipedia and speaks the answer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐     ┌──────────────────────────┐
//! │  Recognizer (mic + STT)  │     │      Typed input         │
//! └────────────┬─────────────┘     └────────────┬─────────────┘
//!              │ wake word / persona            │
//! ┌────────────▼────────────────────────────────▼─────────────┐
//! │                         Session                           │
//! │      Intent Resolver  →  Conversation Log  →  Voice       │
//! └────────────┬──────────────────────────────────────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │  Wikipedia summary API   │
//! └──────────────────────────┘
//! ```

pub mod assistant;
pub mod config;
pub mod conversation;
pub mod encyclopedia;
pub mod error;
pub mod intent;
pub mod platform;
pub mod session;
pub mod voice;

pub use config::Config;
pub use conversation::{ConversationLog, LogView, Message, Sender, TerminalView};
pub use encyclopedia::{Encyclopedia, Lookup, WikipediaClient};
pub use error::{Error, Result};
pub use intent::{Capabilities, Handler, IntentResolver, Predicate, Rule};
pub use platform::{Clock, Connectivity, NetworkProbe, SystemBrowser, SystemClock, UrlOpener};
pub use session::{Reply, Session};
pub use voice::{Persona, SpeechRecognizer, SpeechSynthesizer, VoiceOutput, WakeWord};
