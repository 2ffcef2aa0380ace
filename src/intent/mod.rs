//! Keyword intent resolution
//!
//! An utterance is matched against an ordered list of [`Rule`]s; the first
//! rule whose [`Predicate`] holds produces the response through its
//! [`Handler`]. Matching is substring containment on the lowercased
//! utterance, so an utterance hitting several keyword sets resolves to the
//! earliest rule only.

pub mod responses;

use std::sync::Arc;

use crate::encyclopedia::{Encyclopedia, Lookup};
use crate::platform::{Clock, Connectivity, UrlOpener};

pub use responses::default_rules;

/// When a rule applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// The network is unreachable (utterance content is ignored)
    Offline,
    /// The utterance contains any of these lowercase keywords
    ContainsAny(Vec<String>),
    /// Always applies
    Always,
}

impl Predicate {
    /// Build a keyword predicate, lowercasing the keywords
    #[must_use]
    pub fn contains_any(keywords: &[&str]) -> Self {
        Self::ContainsAny(keywords.iter().map(|k| k.to_lowercase()).collect())
    }
}

/// How a matched rule produces its response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    /// A fixed response
    Reply(String),
    /// "The time is {now}."
    Time,
    /// Strip `phrases` to get a subject and look it up
    Encyclopedia {
        /// Phrases removed (first occurrence each, in order) from the utterance
        phrases: Vec<String>,
    },
    /// Open a URL and acknowledge
    OpenSite {
        /// URL to open
        url: String,
        /// Response returned whether or not the browser opened
        acknowledgment: String,
    },
}

/// A named (predicate, handler) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Name used in logs
    pub name: String,
    /// When the rule applies
    pub predicate: Predicate,
    /// What the rule answers
    pub handler: Handler,
}

impl Rule {
    /// Create a rule
    #[must_use]
    pub fn new(name: impl Into<String>, predicate: Predicate, handler: Handler) -> Self {
        Self {
            name: name.into(),
            predicate,
            handler,
        }
    }
}

/// Host capabilities the resolver depends on
#[derive(Clone)]
pub struct Capabilities {
    /// Network reachability
    pub connectivity: Arc<dyn Connectivity>,
    /// Summary lookups
    pub encyclopedia: Arc<dyn Encyclopedia>,
    /// Browser launching
    pub opener: Arc<dyn UrlOpener>,
    /// Local time
    pub clock: Arc<dyn Clock>,
}

/// Resolves utterances to responses
pub struct IntentResolver {
    rules: Vec<Rule>,
    caps: Capabilities,
}

impl IntentResolver {
    /// Create a resolver with the built-in rule table
    #[must_use]
    pub fn new(wake_word: &str, caps: Capabilities) -> Self {
        Self::with_rules(default_rules(wake_word), caps)
    }

    /// Create a resolver with a custom rule table
    #[must_use]
    pub fn with_rules(rules: Vec<Rule>, caps: Capabilities) -> Self {
        Self { rules, caps }
    }

    /// The ordered rule table
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Resolve an utterance to a response
    ///
    /// Never fails: lookup and browser errors become apologetic responses.
    pub async fn resolve(&self, utterance: &str) -> String {
        let utterance = utterance.to_lowercase();

        for rule in &self.rules {
            if self.matches(&rule.predicate, &utterance).await {
                tracing::debug!(rule = %rule.name, utterance, "intent matched");
                return self.handle(&rule.handler, &utterance).await;
            }
        }

        tracing::debug!(utterance, "no rule matched");
        responses::FALLBACK.to_string()
    }

    async fn matches(&self, predicate: &Predicate, utterance: &str) -> bool {
        match predicate {
            Predicate::Offline => !self.caps.connectivity.is_online().await,
            Predicate::ContainsAny(keywords) => {
                keywords.iter().any(|k| utterance.contains(k.as_str()))
            }
            Predicate::Always => true,
        }
    }

    async fn handle(&self, handler: &Handler, utterance: &str) -> String {
        match handler {
            Handler::Reply(text) => text.clone(),
            Handler::Time => responses::time_response(&self.caps.clock.now()),
            Handler::Encyclopedia { phrases } => {
                let subject = extract_subject(utterance, phrases);
                self.lookup(&subject).await
            }
            Handler::OpenSite {
                url,
                acknowledgment,
            } => {
                if let Err(e) = self.caps.opener.open(url) {
                    tracing::warn!(url, error = %e, "failed to open site");
                }
                acknowledgment.clone()
            }
        }
    }

    async fn lookup(&self, subject: &str) -> String {
        match self.caps.encyclopedia.summary(subject).await {
            Ok(Lookup::Found(extract)) => extract,
            Ok(Lookup::NotFound) => responses::NOT_FOUND.to_string(),
            Err(e) => {
                tracing::error!(subject, error = %e, "encyclopedia lookup failed");
                responses::LOOKUP_FAILED.to_string()
            }
        }
    }
}

/// Remove the first occurrence of each phrase, in order, and trim
#[must_use]
pub fn extract_subject(utterance: &str, phrases: &[String]) -> String {
    phrases
        .iter()
        .fold(utterance.to_string(), |acc, phrase| acc.replacen(phrase.as_str(), "", 1))
        .trim()
        .to_string()
}
