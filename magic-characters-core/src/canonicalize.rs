//! Card name to character identity
//!
//! `"Urza, Lord High Artificer"` and `"Urza, Academy Headmaster"` both become
//! `"Urza"`. The rules run in a fixed order and the separator list is tried in
//! priority order, so `"Ruhan of the Fomori"` becomes `"Ruhan of"`: the
//! `" the "` cut leaves no trailing space for `" of "` to match.

use crate::scryfall::Card;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Title separators, highest priority first
pub const TITLE_SEPARATORS: [&str; 4] = [",", " the ", " of ", " and "];

/// Identities shorter than this are too ambiguous to search for
pub const MIN_IDENTITY_CHARS: usize = 3;

lazy_static! {
    static ref PARENTHETICAL: Regex = Regex::new(r"\([^)]*\)").unwrap();
}

/// Drop `(...)` annotations and any back face, then trim.
pub fn strip_face_and_annotation(raw_name: &str) -> String {
    let without_annotations = PARENTHETICAL.replace_all(raw_name, "");
    without_annotations
        .split("//")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Cut a front-face name at each title separator in turn.
pub fn truncate_titles(name: &str) -> &str {
    let mut name = name;
    for separator in TITLE_SEPARATORS {
        name = name.split(separator).next().unwrap_or(name);
    }
    name.trim()
}

/// Full name of a planeswalker as it appears in the protected set
pub fn protected_form(raw_name: &str) -> String {
    let base = strip_face_and_annotation(raw_name);
    base.split(',').next().unwrap_or_default().trim().to_string()
}

pub fn is_acceptable_identity(identity: &str) -> bool {
    identity.chars().count() >= MIN_IDENTITY_CHARS
}

/// Known planeswalker names, fetched once per run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProtectedNames {
    names: HashSet<String>,
}

impl ProtectedNames {
    pub fn from_cards(cards: &[Card]) -> Self {
        Self::from_names(cards.iter().map(|card| protected_form(&card.raw_name)))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProtectedNames {
            names: names
                .into_iter()
                .map(Into::into)
                .filter(|name: &String| !name.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.iter().cloned().collect();
        names.sort();
        names
    }
}

#[derive(Debug, Clone)]
pub struct NameCanonicalizer {
    protected: ProtectedNames,
}

impl NameCanonicalizer {
    pub fn new(protected: ProtectedNames) -> Self {
        NameCanonicalizer { protected }
    }

    pub fn protected_names(&self) -> &ProtectedNames {
        &self.protected
    }

    /// Character identity for a raw card name, or `None` if the result is too short to search.
    pub fn canonicalize(&self, raw_name: &str) -> Option<String> {
        let base = strip_face_and_annotation(raw_name);
        let identity = truncate_titles(&base);

        let full_name = protected_form(&base);
        if self.protected.contains(&full_name) && identity != full_name {
            // Truncation still applies to planeswalker names
            debug!(
                card = raw_name,
                planeswalker = %full_name,
                identity = identity,
                "Truncated a known planeswalker name"
            );
        }

        if is_acceptable_identity(identity) {
            Some(identity.to_string())
        } else {
            debug!(card = raw_name, identity = identity, "Rejected short identity");
            None
        }
    }
}
