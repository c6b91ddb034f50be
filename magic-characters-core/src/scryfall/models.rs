use crate::error::FinderError;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct ScryfallSearchAnswer {
    pub object: String,
    #[serde(default)]
    pub total_cards: i32,
    pub has_more: bool,
    pub next_page: Option<String>,
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// The part of a Scryfall card object the character census needs
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Front face of the printed name, trimmed
    pub name: String,
    /// Name exactly as Scryfall returns it, e.g. `"Front // Back"`
    pub raw_name: String,
}

impl Card {
    pub fn new(raw_name: &str) -> Card {
        let name = raw_name
            .split(" // ")
            .next()
            .unwrap_or(raw_name)
            .trim()
            .to_string();

        Card {
            name,
            raw_name: raw_name.to_string(),
        }
    }

    pub fn from_scryfall_object(
        d: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Card, FinderError> {
        let raw_name = d
            .get("name")
            .and_then(|name| name.as_str())
            .ok_or_else(|| FinderError::InvalidCard("Missing name field".to_string()))?;

        Ok(Card::new(raw_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture() -> ScryfallSearchAnswer {
        let input = include_str!("../../test_data/search_page_urza.json");
        serde_json::from_str(input).unwrap()
    }

    #[test]
    fn test_search_answer_parsing() {
        let answer = load_fixture();
        assert_eq!(answer.object, "list");
        assert!(answer.has_more);
        assert!(answer.next_page.unwrap().contains("page=2"));
        assert_eq!(answer.data.len(), 5);
    }

    #[test]
    fn test_dual_faced_card_parsing() {
        let answer = load_fixture();
        let card = Card::from_scryfall_object(&answer.data[2]).unwrap();
        assert_eq!(card.raw_name, "Urza, Lord Protector // Urza, Planeswalker");
        assert_eq!(card.name, "Urza, Lord Protector");
    }

    #[test]
    fn test_single_faced_card_keeps_name() {
        let answer = load_fixture();
        let card = Card::from_scryfall_object(&answer.data[0]).unwrap();
        assert_eq!(card.name, "Urza, Academy Headmaster");
        assert_eq!(card.raw_name, card.name);
    }

    #[test]
    fn test_missing_name_error() {
        let answer = load_fixture();
        let result = Card::from_scryfall_object(&answer.data[4]);
        assert!(matches!(result, Err(FinderError::InvalidCard(_))));
    }

    #[test]
    fn test_last_page_without_locator() {
        let answer: ScryfallSearchAnswer = serde_json::from_str(
            r#"{"object":"list","total_cards":1,"has_more":false,"data":[{"name":"Jace Beleren"}]}"#,
        )
        .unwrap();
        assert!(!answer.has_more);
        assert!(answer.next_page.is_none());
    }
}
