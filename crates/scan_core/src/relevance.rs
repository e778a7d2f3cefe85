use serde::{Deserialize, Serialize};

use crate::record::is_unavailable;

/// Title-level verdict, refined by a description check for ambiguous titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    Skip,
    KeepImmediate,
    CheckDescription,
}

impl Relevance {
    pub fn as_str(self) -> &'static str {
        match self {
            Relevance::Skip => "SKIP",
            Relevance::KeepImmediate => "KEEP_IMMEDIATE",
            Relevance::CheckDescription => "CHECK_DESCRIPTION",
        }
    }
}

/// How a configured term is matched against lowercased text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchMode {
    /// Plain containment; "lead" also hits "leadership".
    #[default]
    Substring,
    /// The term must be bounded by non-alphanumeric characters or the text edges.
    WholeWord,
}

/// Term lists driving the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub exclusion: Vec<String>,
    pub strong: Vec<String>,
    pub ambiguous: Vec<String>,
    pub technical: Vec<String>,
    pub match_mode: MatchMode,
}

fn owned(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclusion: owned(&[
                "intern",
                "co-op",
                "coop",
                "student",
                "summer",
                "placement",
                "manager",
                "director",
                "head of",
                "vp",
                "president",
                "chief",
                "principal",
                "lead",
                "sales",
                "customer service",
                "technician",
                "support",
                "clerk",
                "admin",
                "marketing",
                "account executive",
                "driver",
                "warehouse",
                "nurse",
                "bilingual",
                "business analyst",
                "business systems analyst",
                "business system analyst",
            ]),
            strong: owned(&[
                "data scientist",
                "data engineer",
                "machine learning",
                "ai engineer",
                "analytics",
                "computer vision",
                "nlp",
                "business intelligence",
                "deep learning",
                "data analyst",
                "quantitative researcher",
                "statistical modeling",
                "statistician",
            ]),
            ambiguous: owned(&[
                "analyst",
                "insights",
                "consultant",
                "scientist",
                "researcher",
                "strategist",
                "specialist",
                "associate",
            ]),
            technical: owned(&[
                "sql",
                "python",
                " r ",
                "r-programming",
                "tableau",
                "power bi",
                "powerbi",
                "aws",
                "azure",
                "gcp",
                "snowflake",
                "etl",
                "pipeline",
                "modeling",
                "models",
                "machine learning",
                "statistical",
                "looker",
                "bigquery",
                "spark",
                "hadoop",
            ]),
            match_mode: MatchMode::Substring,
        }
    }
}

/// Classification outcome with the term that decided it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleVerdict {
    pub relevance: Relevance,
    pub matched: Option<String>,
}

/// Three-tier keyword classifier. Exclusion always wins over positive terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevanceClassifier {
    exclusion: Vec<String>,
    strong: Vec<String>,
    ambiguous: Vec<String>,
    technical: Vec<String>,
    mode: MatchMode,
}

impl Default for RelevanceClassifier {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

impl RelevanceClassifier {
    pub fn new(config: FilterConfig) -> Self {
        let mode = config.match_mode;
        let prepare = |terms: Vec<String>| -> Vec<String> {
            terms
                .into_iter()
                .map(|t| match mode {
                    // Padding like " r " only makes sense for plain containment.
                    MatchMode::WholeWord => t.trim().to_lowercase(),
                    MatchMode::Substring => t.to_lowercase(),
                })
                .filter(|t| !t.trim().is_empty())
                .collect()
        };
        Self {
            exclusion: prepare(config.exclusion),
            strong: prepare(config.strong),
            ambiguous: prepare(config.ambiguous),
            technical: prepare(config.technical),
            mode,
        }
    }

    pub fn classify_title(&self, title: &str) -> Relevance {
        self.explain_title(title).relevance
    }

    pub fn explain_title(&self, title: &str) -> TitleVerdict {
        let lowered = title.to_lowercase();
        let tiers = [
            (&self.exclusion, Relevance::Skip),
            (&self.strong, Relevance::KeepImmediate),
            (&self.ambiguous, Relevance::CheckDescription),
        ];
        for (terms, relevance) in tiers {
            if let Some(term) = self.first_hit(&lowered, terms) {
                return TitleVerdict {
                    relevance,
                    matched: Some(term.to_string()),
                };
            }
        }
        TitleVerdict {
            relevance: Relevance::Skip,
            matched: None,
        }
    }

    /// Any technical term in the description confirms; the sentinel never does.
    pub fn confirm_by_description(&self, description: &str) -> bool {
        if is_unavailable(description) {
            return false;
        }
        let lowered = description.to_lowercase();
        self.first_hit(&lowered, &self.technical).is_some()
    }

    pub fn should_save(&self, relevance: Relevance, description: &str) -> bool {
        match relevance {
            Relevance::KeepImmediate => true,
            Relevance::CheckDescription => self.confirm_by_description(description),
            Relevance::Skip => false,
        }
    }

    fn first_hit<'a>(&self, lowered: &str, terms: &'a [String]) -> Option<&'a str> {
        terms
            .iter()
            .find(|term| contains_term(lowered, term, self.mode))
            .map(String::as_str)
    }
}

fn contains_term(haystack: &str, term: &str, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Substring => haystack.contains(term),
        MatchMode::WholeWord => haystack.match_indices(term).any(|(start, matched)| {
            let before = haystack[..start].chars().next_back();
            let after = haystack[start + matched.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_mode_hits_inside_words() {
        assert!(contains_term("team leadership", "lead", MatchMode::Substring));
        assert!(!contains_term("team leadership", "lead", MatchMode::WholeWord));
        assert!(contains_term("tech lead, data", "lead", MatchMode::WholeWord));
        assert!(contains_term("lead", "lead", MatchMode::WholeWord));
    }

    #[test]
    fn whole_word_trims_padded_terms() {
        let classifier = RelevanceClassifier::new(FilterConfig {
            technical: vec![" r ".to_string()],
            match_mode: MatchMode::WholeWord,
            ..FilterConfig::default()
        });
        assert!(classifier.confirm_by_description("Experience with R, please"));
        assert!(!classifier.confirm_by_description("Strong reporting skills"));
    }
}
