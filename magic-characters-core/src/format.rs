use crate::ranking::RankedCharacter;

const REPORT_HEADING: &str = "Characters with multiple card references:";

/// Plain-text report: each character with its count and its referencing cards in sorted order
pub fn format_report(characters: &[RankedCharacter]) -> String {
    let mut lines = vec![
        String::new(),
        REPORT_HEADING.to_string(),
        "-".repeat(REPORT_HEADING.len() - 1),
    ];

    for character in characters {
        lines.push(String::new());
        lines.push(format!(
            "{} ({} cards):",
            character.name,
            character.reference_count()
        ));
        // BTreeSet iterates in sorted order
        for card in &character.references {
            lines.push(format!("  - {}", card));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_layout() {
        let characters = vec![RankedCharacter {
            name: "Karn".to_string(),
            references: ["Karn, Scion of Urza", "Karn Liberated"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }];

        let report = format_report(&characters);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                "",
                "Characters with multiple card references:",
                "----------------------------------------",
                "",
                "Karn (2 cards):",
                "  - Karn Liberated",
                "  - Karn, Scion of Urza",
            ]
        );
    }

    #[test]
    fn test_empty_report_has_heading_only() {
        let report = format_report(&[]);
        assert!(report.contains(REPORT_HEADING));
        assert_eq!(report.lines().count(), 3);
    }
}
