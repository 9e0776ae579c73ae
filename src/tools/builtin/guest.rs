use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ToolError};
use crate::tools::ToolHandler;

pub const NAME: &str = "guest_info_retriever";
pub const DESCRIPTION: &str =
    "Retrieves detailed information about gala guests based on their name or relation.";
pub const PARAMETER: &str = "query";

const NO_MATCH: &str = "No matching guest information found.";
const TOP_K: usize = 3;

// Okapi BM25 parameters.
const K1: f64 = 1.5;
const B: f64 = 0.75;

static BUILTIN_GUESTS: &str = include_str!("../../../data/guests.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub name: String,
    pub relation: String,
    pub description: String,
    pub email: String,
}

impl Guest {
    /// The text block that is both indexed and handed back to the model.
    pub fn card(&self) -> String {
        format!(
            "Name: {}\nRelation: {}\nDescription: {}\nEmail: {}",
            self.name, self.relation, self.description, self.email
        )
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Guest list with a keyword index over each guest's card.
pub struct GuestBook {
    guests: Vec<Guest>,
    docs: Vec<HashMap<String, usize>>,
    doc_lens: Vec<usize>,
    avg_len: f64,
    doc_freq: HashMap<String, usize>,
}

impl GuestBook {
    pub fn new(guests: Vec<Guest>) -> Self {
        let mut docs = Vec::with_capacity(guests.len());
        let mut doc_lens = Vec::with_capacity(guests.len());
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for guest in &guests {
            let tokens = tokenize(&guest.card());
            doc_lens.push(tokens.len());
            let mut tf: HashMap<String, usize> = HashMap::new();
            for token in tokens {
                *tf.entry(token).or_default() += 1;
            }
            for term in tf.keys() {
                *doc_freq.entry(term.clone()).or_default() += 1;
            }
            docs.push(tf);
        }

        let avg_len = if doc_lens.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<usize>() as f64 / doc_lens.len() as f64
        };

        Self {
            guests,
            docs,
            doc_lens,
            avg_len,
            doc_freq,
        }
    }

    /// The guest list bundled with the crate.
    pub fn builtin() -> Result<Self, serde_json::Error> {
        Self::from_json(BUILTIN_GUESTS)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let guests: Vec<Guest> = serde_json::from_str(json)?;
        Ok(Self::new(guests))
    }

    /// Load a JSON array of guests from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Invalid {
                field: "guests",
                reason: format!("{}: {e}", path.display()),
            })?;
        Self::from_json(&json).map_err(|e| ConfigError::Invalid {
            field: "guests",
            reason: format!("{}: {e}", path.display()),
        })
    }

    pub fn guests(&self) -> &[Guest] {
        &self.guests
    }

    fn score(&self, doc: usize, query: &[String]) -> f64 {
        let n = self.guests.len() as f64;
        let len_norm = if self.avg_len > 0.0 {
            self.doc_lens[doc] as f64 / self.avg_len
        } else {
            0.0
        };

        query
            .iter()
            .filter_map(|term| {
                let tf = *self.docs[doc].get(term)? as f64;
                let df = self.doc_freq.get(term).copied().unwrap_or(0) as f64;
                let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                Some(idf * tf * (K1 + 1.0) / (tf + K1 * (1.0 - B + B * len_norm)))
            })
            .sum()
    }

    /// Guests ranked by relevance to `query`; only guests sharing at least
    /// one term with it are returned.
    pub fn lookup(&self, query: &str, limit: usize) -> Vec<&Guest> {
        let terms = tokenize(query);
        let mut scored: Vec<(usize, f64)> = (0..self.guests.len())
            .map(|i| (i, self.score(i, &terms)))
            .filter(|(_, s)| *s > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .take(limit)
            .map(|(i, _)| &self.guests[i])
            .collect()
    }

    /// Top matching guest cards separated by blank lines.
    pub fn answer(&self, query: &str) -> String {
        let hits = self.lookup(query, TOP_K);
        if hits.is_empty() {
            return NO_MATCH.to_string();
        }
        hits.iter()
            .map(|g| g.card())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Tool adapter over a [`GuestBook`].
pub struct GuestInfoTool {
    book: GuestBook,
}

impl GuestInfoTool {
    pub fn new(book: GuestBook) -> Self {
        Self { book }
    }
}

#[async_trait]
impl ToolHandler for GuestInfoTool {
    async fn call(&self, argument: &str) -> Result<String, ToolError> {
        Ok(self.book.answer(argument))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> GuestBook {
        GuestBook::builtin().unwrap()
    }

    #[test]
    fn builtin_list_parses() {
        assert_eq!(book().guests().len(), 3);
    }

    #[test]
    fn name_query_ranks_guest_first() {
        let book = book();
        let hits = book.lookup("Tell me about Lady Ada Lovelace", 3);
        assert_eq!(hits[0].name, "Ada Lovelace");
    }

    #[test]
    fn relation_query() {
        let book = book();
        let hits = book.lookup("university", 3);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Dr. Nikola Tesla");
    }

    #[test]
    fn answer_renders_cards() {
        let text = book().answer("pigeons");
        assert!(text.starts_with("Name: Dr. Nikola Tesla\nRelation: old friend"));
        assert!(text.contains("Email: nikola.tesla@example.com"));
    }

    #[test]
    fn no_overlap_means_no_match() {
        assert_eq!(book().answer("xylophone quartet"), NO_MATCH);
        assert_eq!(book().answer(""), NO_MATCH);
    }

    #[test]
    fn empty_book() {
        let book = GuestBook::new(Vec::new());
        assert_eq!(book.answer("Ada"), NO_MATCH);
    }

    #[tokio::test]
    async fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guests.json");
        tokio::fs::write(
            &path,
            r#"[{"name": "Grace Hopper", "relation": "colleague", "description": "Admiral and compiler pioneer.", "email": "grace@example.com"}]"#,
        )
        .await
        .unwrap();

        let book = GuestBook::load(&path).await.unwrap();
        assert_eq!(book.lookup("compiler", 3)[0].name, "Grace Hopper");

        let err = GuestBook::load(dir.path().join("missing.json"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Invalid { field: "guests", .. }));
    }

    #[tokio::test]
    async fn tool_answers_queries() {
        let tool = GuestInfoTool::new(book());
        let out = tool.call("Marie Curie").await.unwrap();
        assert!(out.starts_with("Name: Marie Curie"));
    }
}
