//! Persona voice selection

use super::{Persona, Voice};

/// Name substrings preferred for the male persona
pub const DEFAULT_MALE_PREFERENCES: &[&str] = &["male", "daniel", "alex"];

/// Name substrings preferred for the female persona
pub const DEFAULT_FEMALE_PREFERENCES: &[&str] =
    &["karen", "female", "samantha", "google us english"];

/// Cached male and female voices
///
/// Populated from the first non-empty voice list and only rebuilt when the
/// synthesizer reports a change.
#[derive(Debug, Clone, Default)]
pub struct VoiceSelection {
    male_preferences: Vec<String>,
    female_preferences: Vec<String>,
    male: Option<Voice>,
    female: Option<Voice>,
}

impl VoiceSelection {
    /// Create an empty selection with the given name preferences
    #[must_use]
    pub fn new(male_preferences: Vec<String>, female_preferences: Vec<String>) -> Self {
        Self {
            male_preferences: lowercase_all(male_preferences),
            female_preferences: lowercase_all(female_preferences),
            male: None,
            female: None,
        }
    }

    /// Rebuild the selection from a voice list
    ///
    /// An empty list leaves the current selection untouched.
    pub fn populate(&mut self, voices: &[Voice]) {
        if voices.is_empty() {
            return;
        }

        self.male = pick(voices, &self.male_preferences);
        self.female = pick(voices, &self.female_preferences);

        tracing::debug!(
            male = ?self.male.as_ref().map(|v| &v.name),
            female = ?self.female.as_ref().map(|v| &v.name),
            available = voices.len(),
            "voice selection updated"
        );
    }

    /// Voice cached for a persona
    #[must_use]
    pub const fn voice_for(&self, persona: Persona) -> Option<&Voice> {
        match persona {
            Persona::Male => self.male.as_ref(),
            Persona::Female => self.female.as_ref(),
        }
    }

    /// Whether voices have been selected yet
    #[must_use]
    pub const fn is_populated(&self) -> bool {
        self.male.is_some() || self.female.is_some()
    }
}

/// First voice whose lowercased name contains any preference, else the first voice
fn pick(voices: &[Voice], preferences: &[String]) -> Option<Voice> {
    voices
        .iter()
        .find(|voice| {
            let name = voice.name.to_lowercase();
            preferences.iter().any(|p| name.contains(p.as_str()))
        })
        .or_else(|| voices.first())
        .cloned()
}

fn lowercase_all(items: Vec<String>) -> Vec<String> {
    items.into_iter().map(|s| s.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str) -> Voice {
        Voice {
            name: name.to_string(),
            language: "en-US".to_string(),
            id: name.to_string(),
        }
    }

    fn defaults() -> VoiceSelection {
        VoiceSelection::new(
            DEFAULT_MALE_PREFERENCES.iter().map(ToString::to_string).collect(),
            DEFAULT_FEMALE_PREFERENCES.iter().map(ToString::to_string).collect(),
        )
    }

    #[test]
    fn test_prefers_named_voices() {
        let mut selection = defaults();
        selection.populate(&[voice("Fred"), voice("Samantha"), voice("Daniel")]);

        assert_eq!(selection.voice_for(Persona::Male).unwrap().name, "Daniel");
        assert_eq!(selection.voice_for(Persona::Female).unwrap().name, "Samantha");
    }

    #[test]
    fn test_list_order_wins_over_preference_order() {
        let mut selection = defaults();
        selection.populate(&[voice("Google US English"), voice("Karen")]);

        assert_eq!(
            selection.voice_for(Persona::Female).unwrap().name,
            "Google US English"
        );
    }

    #[test]
    fn test_falls_back_to_first_voice() {
        let mut selection = defaults();
        selection.populate(&[voice("Fred"), voice("Victoria")]);

        assert_eq!(selection.voice_for(Persona::Male).unwrap().name, "Fred");
        assert_eq!(selection.voice_for(Persona::Female).unwrap().name, "Fred");
    }

    #[test]
    fn test_female_name_also_matches_male_preference() {
        let mut selection = defaults();
        selection.populate(&[voice("Female Voice"), voice("Alex")]);

        assert_eq!(selection.voice_for(Persona::Male).unwrap().name, "Female Voice");
    }

    #[test]
    fn test_empty_list_keeps_selection() {
        let mut selection = defaults();
        assert!(!selection.is_populated());

        selection.populate(&[voice("Alex")]);
        selection.populate(&[]);

        assert!(selection.is_populated());
        assert_eq!(selection.voice_for(Persona::Male).unwrap().name, "Alex");
    }
}
