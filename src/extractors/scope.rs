// src/extractors/scope.rs

/// Domain vocabulary for centrifugal pump procurement (API 610 overhung / between-bearings).
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "API 610",
    "bomba centrífuga",
    "bomba",
    "bombas",
    "Aquisição de bombas centrífugas",
    "OH1", "OH-1", "OH2", "OH-2", "OH3", "OH-3",
    "OH4", "OH-4", "OH5", "OH-5", "OH6", "OH-6", "OHH",
    "BB1", "BB-1", "BB2", "BB-2", "BB3", "BB-3", "BB4", "BB-4", "BB5", "BB-5",
    "overhung",
    "between bearings",
    "entre mancais",
    "axial split",
    "radial split",
];

/// Ordered, case-insensitive keyword set. A row is in scope when any keyword
/// occurs anywhere in it as a substring.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    keywords: Vec<String>,
    folded: Vec<String>,
}

impl Vocabulary {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = std::collections::HashSet::new();
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(Into::into)
            .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
            .collect();
        let folded = keywords.iter().map(|k| k.to_lowercase()).collect();
        Self { keywords, folded }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True iff at least one keyword is a case-insensitive substring of `text`.
    pub fn matches(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }

    /// The first keyword (in vocabulary order) found in `text`.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.folded
            .iter()
            .position(|k| haystack.contains(k.as_str()))
            .map(|i| self.keywords[i].as_str())
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().copied())
    }
}
