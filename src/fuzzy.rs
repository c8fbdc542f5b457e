//! Fuzzy title matching shared by every instance of a provider type.
//!
//! The manager owns exactly one [`FuzzyMatcher`] for its whole lifetime. It is
//! built through a factory that receives a [`FuzzyCallback`]; whatever the
//! matcher reports through that callback is relabelled as a `fuzzyEvent` and
//! sent to the host. [`TitleMatcher`] is the matcher used when none is
//! supplied.
//!
//! # Examples
//!
//! ```rust
//! use provider_worker::fuzzy::{FuzzyCallback, FuzzyMatcher, TitleMatcher};
//! use std::sync::Arc;
//!
//! let callback: FuzzyCallback = Arc::new(|event| println!("{:?}", event));
//! let matcher = TitleMatcher::new(callback);
//!
//! matcher.set_fuzzy_list(Some(vec!["Hollow Knight".to_string()]));
//! assert_eq!(matcher.match_title("hollow_knight (GOTY)"), "Hollow Knight");
//! ```

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;

/// An event reported by a fuzzy matcher, forwarded verbatim to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyEvent {
    pub event: String,
    pub data: Value,
}

impl FuzzyEvent {
    /// Creates an event named `event` carrying `data`.
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

/// Sink a matcher reports its events to.
pub type FuzzyCallback = Arc<dyn Fn(FuzzyEvent) + Send + Sync>;

/// Title matcher shared by all provider instances of one manager.
///
/// Implementations must be safe to call from any provider task. They report
/// events only through the [`FuzzyCallback`] they were built with.
pub trait FuzzyMatcher: Send + Sync {
    /// Replaces the candidate list. `None` clears it.
    fn set_fuzzy_list(&self, list: Option<Vec<String>>);

    /// Resolves `title` to the best known candidate.
    ///
    /// Returns `title` unchanged when nothing matches.
    fn match_title(&self, title: &str) -> String;
}

static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]|\{[^}]*\}").expect("valid bracket pattern"));
static SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("valid separator pattern"));

/// Lowercases a title, drops bracketed segments and folds punctuation runs
/// into single spaces.
pub fn normalize_title(title: &str) -> String {
    let lower = title.to_lowercase();
    let stripped = BRACKETED.replace_all(&lower, " ");
    SEPARATORS.replace_all(&stripped, " ").trim().to_string()
}

struct Candidate {
    title: String,
    normalized: String,
}

/// Word-overlap matcher over a host supplied candidate list.
///
/// A normalized exact match wins outright. Otherwise the candidate sharing
/// the most words with the title is chosen, provided it shares at least half
/// of them; ties go to the shorter candidate.
pub struct TitleMatcher {
    candidates: RwLock<Option<Vec<Candidate>>>,
    callback: FuzzyCallback,
}

impl TitleMatcher {
    /// Creates a matcher with no candidate list that reports through `callback`.
    pub fn new(callback: FuzzyCallback) -> Self {
        Self {
            candidates: RwLock::new(None),
            callback,
        }
    }

    fn emit(&self, event: &str, data: Value) {
        (self.callback)(FuzzyEvent::new(event, data));
    }

    fn best_candidate(candidates: &[Candidate], normalized: &str) -> Option<String> {
        if let Some(exact) = candidates.iter().find(|c| c.normalized == normalized) {
            return Some(exact.title.clone());
        }

        let words: HashSet<&str> = normalized.split(' ').collect();
        let required = words.len().div_ceil(2);

        candidates
            .iter()
            .map(|c| {
                let shared = c
                    .normalized
                    .split(' ')
                    .filter(|w| words.contains(w))
                    .collect::<HashSet<_>>()
                    .len();
                (shared, c)
            })
            .filter(|(shared, _)| *shared > 0 && *shared >= required)
            .max_by(|(a, ca), (b, cb)| {
                a.cmp(b)
                    .then_with(|| cb.normalized.len().cmp(&ca.normalized.len()))
            })
            .map(|(_, c)| c.title.clone())
    }
}

impl FuzzyMatcher for TitleMatcher {
    fn set_fuzzy_list(&self, list: Option<Vec<String>>) {
        let total = list.as_ref().map(Vec::len);
        *self.candidates.write() = list.map(|titles| {
            titles
                .into_iter()
                .map(|title| Candidate {
                    normalized: normalize_title(&title),
                    title,
                })
                .collect()
        });

        match total {
            Some(total) => self.emit("info", json!({ "message": "fuzzy list updated", "total": total })),
            None => self.emit("info", json!({ "message": "fuzzy list cleared", "total": 0 })),
        }
    }

    fn match_title(&self, title: &str) -> String {
        let normalized = normalize_title(title);
        if normalized.is_empty() {
            return title.to_string();
        }

        let found = {
            let guard = self.candidates.read();
            match guard.as_deref() {
                Some(candidates) => Self::best_candidate(candidates, &normalized),
                None => return title.to_string(),
            }
        };

        match found {
            Some(candidate) => candidate,
            None => {
                self.emit("info", json!({ "message": "no fuzzy match", "title": title }));
                title.to_string()
            }
        }
    }
}
