//! Built-in rule table and fixed responses

use super::{Handler, Predicate, Rule};

pub const OFFLINE: &str = "Activate your internet first.";
pub const GREETING: &str = "Hello! How can I help you today?";
pub const WELL_BEING: &str = "I'm doing great, thanks for asking! How are you?";
pub const CREATOR: &str = "I was created by Shashwat Pandey with some coding magic!";
pub const NOT_FOUND: &str = "Sorry, I couldn't find anything on Wikipedia.";
pub const LOOKUP_FAILED: &str = "Oops! Something went wrong while searching Wikipedia.";
pub const FALLBACK: &str = "I only know Wikipedia searches and some basic chats for now.";

/// Phrases that introduce an encyclopedia subject, stripped in this order
pub const KNOWLEDGE_PHRASES: &[&str] = &["who is", "what is", "tell me about"];

/// (trigger, url, acknowledgment) for site shortcuts
pub const SITES: &[(&str, &str, &str)] = &[
    ("open youtube", "https://www.youtube.com", "Opening YouTube..."),
    ("open whatsapp", "https://web.whatsapp.com/", "Opening WhatsApp Web..."),
    ("open chrome", "https://www.google.com", "Opening Google Chrome homepage..."),
    ("open gmail", "https://mail.google.com", "Opening Gmail..."),
];

/// Render the time response
#[must_use]
pub fn time_response(now: &str) -> String {
    format!("The time is {now}.")
}

/// The default ordered rule table, first match wins
#[must_use]
pub fn default_rules(wake_word: &str) -> Vec<Rule> {
    let wake_greeting = format!("hey {wake_word}");

    let mut rules = vec![
        Rule::new("offline", Predicate::Offline, Handler::Reply(OFFLINE.to_string())),
        Rule::new(
            "greeting",
            Predicate::contains_any(&["hi", "hello", wake_greeting.as_str()]),
            Handler::Reply(GREETING.to_string()),
        ),
        Rule::new(
            "well_being",
            Predicate::contains_any(&["how are you"]),
            Handler::Reply(WELL_BEING.to_string()),
        ),
        Rule::new(
            "time",
            Predicate::contains_any(&["what is the time", "tell me the time", "current time"]),
            Handler::Time,
        ),
        Rule::new(
            "creator",
            Predicate::contains_any(&["who made you", "who created you"]),
            Handler::Reply(CREATOR.to_string()),
        ),
        Rule::new(
            "knowledge",
            Predicate::contains_any(KNOWLEDGE_PHRASES),
            Handler::Encyclopedia {
                phrases: KNOWLEDGE_PHRASES.iter().map(ToString::to_string).collect(),
            },
        ),
    ];

    rules.extend(SITES.iter().map(|(trigger, url, ack)| {
        Rule::new(
            "open_site",
            Predicate::contains_any(&[*trigger]),
            Handler::OpenSite {
                url: (*url).to_string(),
                acknowledgment: (*ack).to_string(),
            },
        )
    }));

    rules.push(Rule::new(
        "fallback",
        Predicate::Always,
        Handler::Reply(FALLBACK.to_string()),
    ));

    rules
}
