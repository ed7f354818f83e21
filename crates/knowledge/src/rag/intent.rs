//! Question intent classification.

/// What kind of information a question asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Skills,
    Experience,
    Education,
    Contact,
    Summary,
    General,
}

impl Intent {
    /// Sentence an answer of this kind opens with.
    pub fn lead_in(self) -> &'static str {
        match self {
            Intent::Skills => "Based on the document, here are the skills mentioned:",
            Intent::Experience => "Based on the document, here is the experience/work history:",
            Intent::Education => "Based on the document, here is the education background:",
            Intent::Contact => "Based on the document, here is the contact information:",
            Intent::Summary => "Based on the document, here are the key points:",
            Intent::General => "Based on the document, here is the relevant information:",
        }
    }
}

/// Maps a question to an [`Intent`].
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, question: &str) -> Intent;
}

/// Case-insensitive substring rules, tried in order; first hit wins.
#[derive(Debug, Clone)]
pub struct KeywordIntentClassifier {
    rules: Vec<(Intent, Vec<String>)>,
}

impl KeywordIntentClassifier {
    pub fn new(rules: Vec<(Intent, Vec<String>)>) -> Self {
        let rules = rules
            .into_iter()
            .map(|(intent, needles)| {
                (intent, needles.into_iter().map(|n| n.to_lowercase()).collect())
            })
            .collect();
        Self { rules }
    }
}

impl Default for KeywordIntentClassifier {
    fn default() -> Self {
        let rule = |intent: Intent, needles: &[&str]| {
            (intent, needles.iter().map(|n| n.to_string()).collect())
        };
        Self::new(vec![
            rule(Intent::Skills, &["skill", "skills"]),
            rule(Intent::Experience, &["experience", "work"]),
            rule(Intent::Education, &["education", "degree"]),
            rule(Intent::Contact, &["contact", "email", "phone"]),
            rule(Intent::Summary, &["summary", "overview", "key points"]),
        ])
    }
}

impl IntentClassifier for KeywordIntentClassifier {
    fn classify(&self, question: &str) -> Intent {
        let question = question.to_lowercase();
        self.rules
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| question.contains(n.as_str())))
            .map(|(intent, _)| *intent)
            .unwrap_or(Intent::General)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let c = KeywordIntentClassifier::default();
        assert_eq!(c.classify("What SKILLS does she have?"), Intent::Skills);
        assert_eq!(c.classify("Where did he work before?"), Intent::Experience);
        assert_eq!(c.classify("Which degree?"), Intent::Education);
        assert_eq!(c.classify("phone number please"), Intent::Contact);
        assert_eq!(c.classify("Give me the key points"), Intent::Summary);
        assert_eq!(c.classify("Where is the office?"), Intent::General);
    }

    #[test]
    fn test_first_rule_wins() {
        let c = KeywordIntentClassifier::default();
        // Mentions both skills and experience; skills comes first
        assert_eq!(c.classify("skills gained through work experience"), Intent::Skills);
        // "network" contains "work"
        assert_eq!(c.classify("network summary"), Intent::Experience);
    }

    #[test]
    fn test_custom_rules() {
        let c = KeywordIntentClassifier::new(vec![(Intent::Contact, vec!["LinkedIn".to_string()])]);
        assert_eq!(c.classify("linkedin profile?"), Intent::Contact);
        assert_eq!(c.classify("skills"), Intent::General);
    }

    #[test]
    fn test_lead_ins() {
        assert_eq!(
            Intent::General.lead_in(),
            "Based on the document, here is the relevant information:"
        );
        assert!(Intent::Skills.lead_in().ends_with("skills mentioned:"));
    }
}
