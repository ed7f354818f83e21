//! Skill keyword extraction for skill-oriented answers.

use std::collections::BTreeSet;

/// Turns free text into a list of recognised skills.
pub trait SkillExtractor: Send + Sync {
    /// `"Skills found: a, b"` when anything matched, otherwise `text`
    /// unchanged.
    fn extract(&self, text: &str) -> String;
}

const DEFAULT_VOCABULARY: &[&str] = &[
    // Languages
    "javascript", "typescript", "python", "java", "c++", "c#", "php", "ruby", "go", "rust",
    "html", "css", "scss", "sass", "sql", "nosql", "r", "matlab", "swift", "kotlin", "scala",
    // Frameworks and libraries
    "react", "reactjs", "nextjs", "angular", "vue", "vue.js", "node.js", "express",
    "expressjs", "django", "flask", "fastapi", "spring", "laravel", "symfony", "jquery",
    "bootstrap", "tailwind", "material-ui", "ant design", "redux", "mobx", "zustand", "svelte",
    "ember",
    // Databases
    "mongodb", "mysql", "postgresql", "sqlite", "redis", "elasticsearch", "dynamodb",
    "firebase", "supabase", "cassandra", "neo4j", "oracle", "sql server", "mariadb",
    // Cloud and devops
    "aws", "azure", "gcp", "docker", "kubernetes", "jenkins", "gitlab", "github", "git",
    "bitbucket", "terraform", "ansible", "nginx", "apache", "vault", "consul",
    // AI / ML
    "ai", "machine learning", "deep learning", "tensorflow", "pytorch", "scikit-learn",
    "langchain", "genai", "openai", "chatgpt", "nlp", "computer vision", "neural networks",
    // Tools
    "jira", "confluence", "slack", "trello", "asana", "figma", "sketch", "adobe", "socket.io",
    "webpack", "babel", "eslint", "prettier", "jest", "cypress", "postman",
    // Practices
    "rest api", "graphql", "microservices", "serverless", "agile", "scrum", "kanban", "tdd",
    "bdd", "ci/cd", "devops", "api", "sdlc", "responsive design", "ux/ui",
    // Product features
    "canvas api", "webgl", "three.js", "d3.js", "chart.js", "konva", "fabric.js",
    "websockets", "real-time", "collaboration", "drawing", "erasing", "undo", "redo",
    "sticky notes", "voice search", "image upload", "text manipulation",
    // Problem solving
    "algorithms", "data structures", "leetcode", "hackathon", "competitive programming", "dsa",
    "problem solving", "optimization", "performance", "testing",
];

const DISPLAY_OVERRIDES: &[(&str, &str)] = &[
    ("reactjs", "ReactJS"),
    ("nextjs", "NextJS"),
    ("expressjs", "ExpressJS"),
    ("c++", "C++"),
    ("rest api", "REST API"),
    ("socket.io", "Socket.IO"),
    ("canvas api", "Canvas API"),
    ("real-time", "Real-time"),
    ("machine learning", "Machine Learning"),
    ("data structures", "Data Structures"),
    ("competitive programming", "Competitive Programming"),
    ("responsive design", "Responsive Design"),
    ("voice search", "Voice Search"),
    ("image upload", "Image Upload"),
    ("text manipulation", "Text Manipulation"),
    ("sticky notes", "Sticky Notes"),
    ("genai", "GenAI"),
    ("langchain", "LangChain"),
    ("sql server", "SQL Server"),
    ("ux/ui", "UX/UI"),
];

/// Matches a fixed keyword vocabulary as case-insensitive substrings.
///
/// Matching is deliberately naive: "r" matches any text containing the
/// letter r, and "java" matches "javascript".
#[derive(Debug, Clone)]
pub struct VocabularySkillExtractor {
    vocabulary: Vec<String>,
    overrides: Vec<(String, String)>,
}

impl VocabularySkillExtractor {
    pub fn new(vocabulary: Vec<String>, overrides: Vec<(String, String)>) -> Self {
        Self {
            vocabulary: vocabulary.into_iter().map(|k| k.to_lowercase()).collect(),
            overrides,
        }
    }

    fn display_name(&self, keyword: &str) -> String {
        self.overrides
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, display)| display.clone())
            .unwrap_or_else(|| title_case(keyword))
    }
}

impl Default for VocabularySkillExtractor {
    fn default() -> Self {
        Self::new(
            DEFAULT_VOCABULARY.iter().map(|k| k.to_string()).collect(),
            DISPLAY_OVERRIDES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl SkillExtractor for VocabularySkillExtractor {
    fn extract(&self, text: &str) -> String {
        let haystack = text.to_lowercase();
        let found: BTreeSet<String> = self
            .vocabulary
            .iter()
            .filter(|keyword| haystack.contains(keyword.as_str()))
            .map(|keyword| self.display_name(keyword))
            .collect();

        if found.is_empty() {
            return text.to_string();
        }

        let skills: Vec<String> = found.into_iter().collect();
        format!("Skills found: {}", skills.join(", "))
    }
}

/// Uppercase every letter that follows a non-letter, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}
