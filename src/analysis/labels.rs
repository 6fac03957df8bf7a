//! Document field label dictionary
//!
//! Fixed, ordered list of the fields printed on identity documents and the
//! lowercase phrases OCR output is scanned for. Order matters: labels are
//! checked in list order and, within a label, the first phrase found wins.

use once_cell::sync::Lazy;
use regex::Regex;

/// One canonical field label and the phrases that identify it
#[derive(Debug, Clone, Copy)]
pub struct LabelEntry {
    /// Canonical label name reported in results
    pub label: &'static str,
    /// Lowercase phrases, most specific first
    pub phrases: &'static [&'static str],
}

/// Known document fields
pub const LABELS: &[LabelEntry] = &[
    LabelEntry {
        label: "Name",
        phrases: &["full name", "surname", "given name", "name"],
    },
    LabelEntry {
        label: "Date of Birth",
        phrases: &["date of birth", "birth date", "dob", "born"],
    },
    LabelEntry {
        label: "ID Number",
        phrases: &[
            "id number",
            "license number",
            "licence number",
            "document number",
            "id no",
            "dl no",
            "lic#",
        ],
    },
    LabelEntry {
        label: "Address",
        phrases: &["address", "addr"],
    },
    LabelEntry {
        label: "City",
        phrases: &["city"],
    },
    LabelEntry {
        label: "State",
        phrases: &["state"],
    },
    LabelEntry {
        label: "ZIP Code",
        phrases: &["zip code", "postal code", "zip"],
    },
    LabelEntry {
        label: "Sex",
        phrases: &["sex", "gender"],
    },
    LabelEntry {
        label: "Height",
        phrases: &["height", "hgt"],
    },
    LabelEntry {
        label: "Weight",
        phrases: &["weight", "wgt"],
    },
    LabelEntry {
        label: "Issue Date",
        phrases: &["issue date", "date of issue", "issued", "iss"],
    },
    LabelEntry {
        label: "Expiration",
        phrases: &["expiration", "expires", "expiry", "exp"],
    },
    LabelEntry {
        label: "Class",
        phrases: &["class"],
    },
];

/// Case-insensitive "phrase, optional ':'/whitespace, rest of line" patterns,
/// indexed like [`LABELS`] and their phrases
static VALUE_PATTERNS: Lazy<Vec<Vec<Regex>>> = Lazy::new(|| {
    LABELS
        .iter()
        .map(|entry| {
            entry
                .phrases
                .iter()
                .map(|phrase| {
                    Regex::new(&format!(r"(?i){}[:\s]*(.*)", regex::escape(phrase)))
                        .expect("static regex")
                })
                .collect()
        })
        .collect()
});

/// A label found on a line, with the phrase that identified it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelHit {
    /// Index into [`LABELS`]
    pub entry: usize,
    /// Index into that entry's phrases
    pub phrase: usize,
}

impl LabelHit {
    /// Canonical label name
    pub fn label(&self) -> &'static str {
        LABELS[self.entry].label
    }

    /// Matched phrase
    pub fn phrase(&self) -> &'static str {
        LABELS[self.entry].phrases[self.phrase]
    }

    /// Text following the phrase on `line`, trimmed; None when nothing follows
    pub fn inline_value(&self, line: &str) -> Option<String> {
        let pattern = &VALUE_PATTERNS[self.entry][self.phrase];
        let value = pattern.captures(line)?.get(1)?.as_str().trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Every label present on `line`, in dictionary order.
/// A line may carry several labels; each label reports its first matching phrase.
pub fn find_labels(line: &str) -> Vec<LabelHit> {
    let normalized = line.trim().to_lowercase();

    LABELS
        .iter()
        .enumerate()
        .filter_map(|(entry, label)| {
            label
                .phrases
                .iter()
                .position(|phrase| normalized.contains(phrase))
                .map(|phrase| LabelHit { entry, phrase })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_shape() {
        assert_eq!(LABELS.len(), 13);
        let names: Vec<&str> = LABELS.iter().map(|e| e.label).collect();
        assert_eq!(
            names,
            [
                "Name",
                "Date of Birth",
                "ID Number",
                "Address",
                "City",
                "State",
                "ZIP Code",
                "Sex",
                "Height",
                "Weight",
                "Issue Date",
                "Expiration",
                "Class"
            ]
        );
        for entry in LABELS {
            assert!(!entry.phrases.is_empty());
            for phrase in entry.phrases {
                assert_eq!(*phrase, phrase.to_lowercase());
            }
        }
    }

    #[test]
    fn test_find_labels_is_case_insensitive() {
        let hits = find_labels("  DATE OF BIRTH  ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label(), "Date of Birth");
        assert_eq!(hits[0].phrase(), "date of birth");
    }

    #[test]
    fn test_first_listed_phrase_wins() {
        // "full name" precedes the bare "name" phrase
        let hits = find_labels("Full Name: Jane Doe");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].phrase(), "full name");
        assert_eq!(hits[0].inline_value("Full Name: Jane Doe").as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_line_can_match_several_labels() {
        let hits = find_labels("SEX: M HGT: 5-10 WGT: 180");
        let labels: Vec<&str> = hits.iter().map(|h| h.label()).collect();
        assert_eq!(labels, ["Sex", "Height", "Weight"]);
    }

    #[test]
    fn test_inline_value_preserves_case() {
        let hit = find_labels("name: John Smith")[0];
        assert_eq!(hit.inline_value("NAME:   John Smith  ").as_deref(), Some("John Smith"));
    }

    #[test]
    fn test_inline_value_empty_after_phrase() {
        let hit = find_labels("Address:")[0];
        assert_eq!(hit.inline_value("Address:  "), None);
    }

    #[test]
    fn test_no_labels() {
        assert!(find_labels("01/01/1990").is_empty());
        assert!(find_labels("").is_empty());
    }
}
