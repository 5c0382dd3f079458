//! Scalar values for the story text: the highlighted zones and how many
//! households live in them.

use serde::Serialize;
use std::collections::HashSet;

use crate::config::PropertyKeys;
use crate::model::{Feature, TractProperties};

/// Story text for the priority-zone step, filled by [`summarize`] unless the
/// zone config supplies its own.
pub const PRIORITY_ZONES_TEMPLATE: &str = "We identified priority zones such as \
{NEIGHBORHOOD_1} and {NEIGHBORHOOD_2}. These are dense communities (over {HOUSEHOLDS} \
households combined) with high car-free populations and limited train access.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrativeSummary {
    pub top_zones: Vec<String>,
    /// Households across all priority zones, floored to the thousand.
    pub priority_households: u64,
    pub formatted_households: String,
    /// The story template with every placeholder filled.
    pub story_text: String,
}

impl NarrativeSummary {
    /// Replaces the first `{NEIGHBORHOOD_n}` (1-based) for each top zone and
    /// the first `{HOUSEHOLDS}`.
    pub fn fill_template(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (i, zone) in self.top_zones.iter().enumerate() {
            out = out.replacen(&format!("{{NEIGHBORHOOD_{}}}", i + 1), zone, 1);
        }
        out.replacen("{HOUSEHOLDS}", &self.formatted_households, 1)
    }
}

/// Summarizes the rolled-up tracts against the ordered priority zone list
/// and fills `template` with the result.
pub fn summarize(
    tracts: &[Feature],
    priority: &[String],
    top_n: usize,
    template: &str,
    keys: &PropertyKeys,
) -> NarrativeSummary {
    let top_zones = (0..top_n)
        .map(|i| priority.get(i).cloned().unwrap_or_else(|| placeholder(i)))
        .collect();

    let targets: HashSet<&str> = priority.iter().map(String::as_str).collect();
    let total: u64 = tracts
        .iter()
        .filter(|t| {
            t.property_str(&keys.display_name)
                .is_some_and(|name| targets.contains(name))
        })
        .map(|t| t.property_u64(&keys.total_households).unwrap_or(0))
        .sum();

    let priority_households = floor_to_thousand(total);

    let mut summary = NarrativeSummary {
        top_zones,
        priority_households,
        formatted_households: format_thousands(priority_households),
        story_text: String::new(),
    };
    summary.story_text = summary.fill_template(template);
    summary
}

fn placeholder(i: usize) -> String {
    format!("Neighborhood {}", char::from(b'A' + (i % 26) as u8))
}

pub fn floor_to_thousand(n: u64) -> u64 {
    n / 1000 * 1000
}

/// Formats with comma thousands separators, e.g. `68000` → `"68,000"`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tract(display: &str, households: u64) -> Feature {
        crate::model::tract(json!({ "display_name": display, "total_households": households }))
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(68000), "68,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_floor_to_thousand() {
        assert_eq!(floor_to_thousand(68999), 68000);
        assert_eq!(floor_to_thousand(999), 0);
        assert_eq!(floor_to_thousand(5000), 5000);
    }

    #[test]
    fn test_summarize_sums_priority_zones() {
        let priority = vec!["East Brooklyn".to_string(), "Soundview".to_string()];
        let tracts = vec![
            tract("East Brooklyn", 1500),
            tract("East Brooklyn", 2500),
            tract("Soundview", 800),
            tract("Midtown", 9000),
        ];

        let summary = summarize(
            &tracts,
            &priority,
            2,
            PRIORITY_ZONES_TEMPLATE,
            &PropertyKeys::default(),
        );

        assert_eq!(summary.top_zones, priority);
        assert_eq!(summary.priority_households, 4000);
        assert_eq!(summary.formatted_households, "4,000");
        assert!(
            summary
                .story_text
                .starts_with("We identified priority zones such as East Brooklyn and Soundview.")
        );
        assert!(summary.story_text.contains("(over 4,000 households combined)"));
    }

    #[test]
    fn test_summarize_placeholders() {
        let priority = vec!["Corona".to_string()];
        let summary = summarize(&[], &priority, 2, "{NEIGHBORHOOD_2}", &PropertyKeys::default());

        assert_eq!(summary.top_zones, vec!["Corona", "Neighborhood B"]);
        assert_eq!(summary.priority_households, 0);
        assert_eq!(summary.story_text, "Neighborhood B");
    }

    #[test]
    fn test_fill_template() {
        let summary = NarrativeSummary {
            top_zones: vec!["Corona".to_string(), "Brownsville".to_string()],
            priority_households: 68000,
            formatted_households: "68,000".to_string(),
            story_text: String::new(),
        };

        let text = "zones such as {NEIGHBORHOOD_1} and {NEIGHBORHOOD_2} (over {HOUSEHOLDS} households). {HOUSEHOLDS}";
        assert_eq!(
            summary.fill_template(text),
            "zones such as Corona and Brownsville (over 68,000 households). {HOUSEHOLDS}"
        );
    }
}
