//! Shared test fakes for the platform capabilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Semaphore, watch};

use karen_assistant::conversation::{ConversationLog, LogView, Message};
use karen_assistant::encyclopedia::{Encyclopedia, Lookup};
use karen_assistant::intent::{Capabilities, IntentResolver};
use karen_assistant::platform::{Clock, Connectivity, UrlOpener};
use karen_assistant::session::Session;
use karen_assistant::voice::{
    SpeechRecognizer, SpeechSynthesizer, Utterance, Voice, VoiceOutput, VoiceSelection, WakeWord,
};
use karen_assistant::{Error, Result};

/// Time rendered by [`FixedClock`] in tests
pub const FIXED_TIME: &str = "3:04:05 PM";

/// Ordered record of everything the session made visible or audible
pub type Journal = Arc<Mutex<Vec<String>>>;

pub struct FakeConnectivity(pub AtomicBool);

impl FakeConnectivity {
    pub fn online() -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(true)))
    }

    pub fn offline() -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(false)))
    }
}

#[async_trait]
impl Connectivity for FakeConnectivity {
    async fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Canned response for a subject
#[derive(Clone)]
pub enum Canned {
    Found(String),
    NotFound,
    Fails,
}

/// Encyclopedia answering from a table, optionally gated until released
#[derive(Default)]
pub struct FakeEncyclopedia {
    answers: HashMap<String, Canned>,
    gate: Option<Arc<Semaphore>>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeEncyclopedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, subject: &str, canned: Canned) -> Self {
        self.answers.insert(subject.to_string(), canned);
        self
    }

    /// Hold every lookup until a permit is added to `gate`
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Encyclopedia for FakeEncyclopedia {
    async fn summary(&self, subject: &str) -> Result<Lookup> {
        self.queries.lock().unwrap().push(subject.to_string());

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        match self.answers.get(subject) {
            Some(Canned::Found(extract)) => Ok(Lookup::Found(extract.clone())),
            Some(Canned::Fails) => Err(Error::Encyclopedia("connection reset".to_string())),
            Some(Canned::NotFound) | None => Ok(Lookup::NotFound),
        }
    }
}

#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingOpener {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(Error::Browser("no browser".to_string()));
        }
        Ok(())
    }
}

pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> String {
        FIXED_TIME.to_string()
    }
}

/// Handles to the fakes behind a resolver
pub struct Fakes {
    pub connectivity: Arc<FakeConnectivity>,
    pub encyclopedia: Arc<FakeEncyclopedia>,
    pub opener: Arc<RecordingOpener>,
}

impl Fakes {
    pub fn new(encyclopedia: FakeEncyclopedia) -> Self {
        Self {
            connectivity: FakeConnectivity::online(),
            encyclopedia: Arc::new(encyclopedia),
            opener: Arc::new(RecordingOpener::default()),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            connectivity: self.connectivity.clone(),
            encyclopedia: self.encyclopedia.clone(),
            opener: self.opener.clone(),
            clock: Arc::new(FixedClock),
        }
    }

    pub fn resolver(&self) -> IntentResolver {
        IntentResolver::new("karen", self.capabilities())
    }
}

/// View that journals rendered messages, statuses and alerts
pub struct JournalView(pub Journal);

impl LogView for JournalView {
    fn render(&mut self, message: &Message) {
        self.0
            .lock()
            .unwrap()
            .push(format!("render {}: {}", message.sender, message.text));
    }

    fn set_status(&mut self, status: &str) {
        self.0.lock().unwrap().push(format!("status {status}"));
    }

    fn alert(&mut self, text: &str) {
        self.0.lock().unwrap().push(format!("alert {text}"));
    }
}

/// Synthesizer that journals what it is asked to speak
pub struct JournalSynth {
    journal: Journal,
    voices: watch::Sender<Vec<Voice>>,
}

impl JournalSynth {
    pub fn new(journal: Journal, voices: Vec<Voice>) -> Self {
        let (voices, _) = watch::channel(voices);
        Self { journal, voices }
    }
}

impl SpeechSynthesizer for JournalSynth {
    fn voices(&self) -> Vec<Voice> {
        self.voices.borrow().clone()
    }

    fn watch_voices(&self) -> watch::Receiver<Vec<Voice>> {
        self.voices.subscribe()
    }

    fn cancel(&mut self) {
        self.journal.lock().unwrap().push("cancel".to_string());
    }

    fn speak(&mut self, utterance: Utterance) -> Result<()> {
        let voice = utterance
            .voice
            .map_or_else(|| "default".to_string(), |v| v.name);
        self.journal
            .lock()
            .unwrap()
            .push(format!("speak [{voice}] {}", utterance.text));
        Ok(())
    }
}

/// Recognizer that only counts start/stop calls
#[derive(Clone, Default)]
pub struct FakeRecognizer {
    pub starts: Arc<Mutex<u32>>,
    pub running: Arc<AtomicBool>,
}

impl SpeechRecognizer for FakeRecognizer {
    fn start(&mut self) -> Result<()> {
        *self.starts.lock().unwrap() += 1;
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

pub fn voice(name: &str) -> Voice {
    Voice {
        name: name.to_string(),
        language: "en-US".to_string(),
        id: name.to_lowercase(),
    }
}

/// Build a session over fakes; voices "Alex" (male) and "Samantha" (female)
pub fn session_with(fakes: &Fakes) -> (Session, Journal) {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));

    let synth = JournalSynth::new(Arc::clone(&journal), vec![voice("Alex"), voice("Samantha")]);
    let selection = VoiceSelection::new(
        vec!["male".into(), "daniel".into(), "alex".into()],
        vec!["karen".into(), "female".into(), "samantha".into()],
    );
    let output = VoiceOutput::new(Box::new(synth), selection);
    let log = ConversationLog::new(Box::new(JournalView(Arc::clone(&journal))));

    let session = Session::new(WakeWord::new("karen").unwrap(), fakes.resolver(), log, output);
    (session, journal)
}

/// Journal entries excluding status mirrors and cancels
pub fn visible(journal: &Journal) -> Vec<String> {
    journal
        .lock()
        .unwrap()
        .iter()
        .filter(|e| !e.starts_with("status ") && e.as_str() != "cancel")
        .cloned()
        .collect()
}
