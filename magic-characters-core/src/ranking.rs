//! Character tally and reference-count ranking

use crate::references::ReferenceSet;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCharacter {
    pub name: String,
    pub references: ReferenceSet,
}

impl RankedCharacter {
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }
}

/// Characters in first-seen order. Recording a character again replaces its
/// references but keeps its original position.
#[derive(Debug, Default)]
pub struct CharacterTally {
    characters: Vec<RankedCharacter>,
    positions: HashMap<String, usize>,
}

impl CharacterTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: String, references: ReferenceSet) {
        match self.positions.get(&name) {
            Some(&index) => self.characters[index].references = references,
            None => {
                self.positions.insert(name.clone(), self.characters.len());
                self.characters.push(RankedCharacter { name, references });
            }
        }
    }

    pub fn into_ranked(self) -> Vec<RankedCharacter> {
        rank_characters(self.characters)
    }
}

/// Most referenced first; equal counts keep their incoming order.
pub fn rank_characters(mut characters: Vec<RankedCharacter>) -> Vec<RankedCharacter> {
    characters.sort_by(|a, b| b.reference_count().cmp(&a.reference_count()));
    characters
}
