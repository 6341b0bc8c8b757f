//! Canonical topic categories and the alias table that folds upstream
//! classifier variants onto them.

pub struct CategoryMeta {
    pub label: &'static str,
    pub id: &'static str,
    pub icon: &'static str,
}

pub const CATEGORIES: [CategoryMeta; 11] = [
    CategoryMeta { label: "Presidential Politics", id: "presidential_politics", icon: "🏛️" },
    CategoryMeta { label: "General Politics", id: "general_politics", icon: "🗳️" },
    CategoryMeta { label: "Elections & Voting", id: "elections_voting", icon: "🗳️" },
    CategoryMeta { label: "Foreign Policy", id: "foreign_policy", icon: "🌍" },
    CategoryMeta { label: "Immigration Policy", id: "immigration_policy", icon: "🛂" },
    CategoryMeta { label: "Legislative Politics", id: "legislative_politics", icon: "📜" },
    CategoryMeta { label: "Economic Policy", id: "economic_policy", icon: "💰" },
    CategoryMeta { label: "Healthcare Policy", id: "healthcare_policy", icon: "🏥" },
    CategoryMeta { label: "Education Policy", id: "education_policy", icon: "🎓" },
    CategoryMeta { label: "Environmental Policy", id: "environmental_policy", icon: "🌿" },
    CategoryMeta { label: "Civil Rights", id: "civil_rights", icon: "✊" },
];

pub const FALLBACK_CATEGORY: &str = "General Politics";

/// Alias → canonical label, in priority order. The substring fallback scans
/// this list top to bottom and takes the first hit, so ordering is load-bearing.
const ALIASES: &[(&str, &str)] = &[
    // Presidential Politics
    ("presidential", "Presidential Politics"),
    ("president", "Presidential Politics"),
    ("white house", "Presidential Politics"),
    ("executive", "Presidential Politics"),
    ("trump", "Presidential Politics"),
    // General Politics
    ("politics", "General Politics"),
    ("political", "General Politics"),
    ("government", "General Politics"),
    ("government & accountability", "General Politics"),
    ("government and accountability", "General Politics"),
    // Elections & Voting
    ("elections", "Elections & Voting"),
    ("election", "Elections & Voting"),
    ("voting", "Elections & Voting"),
    ("elections & political figures", "Elections & Voting"),
    ("elections and political figures", "Elections & Voting"),
    // Foreign Policy
    ("foreign", "Foreign Policy"),
    ("foreign policy & world", "Foreign Policy"),
    ("foreign policy and world", "Foreign Policy"),
    ("international", "Foreign Policy"),
    ("geopolitics", "Foreign Policy"),
    // Immigration Policy
    ("immigration", "Immigration Policy"),
    ("border", "Immigration Policy"),
    ("immigration & civil liberties", "Immigration Policy"),
    ("immigration and civil liberties", "Immigration Policy"),
    // Legislative Politics
    ("legislative", "Legislative Politics"),
    ("congress", "Legislative Politics"),
    ("senate", "Legislative Politics"),
    ("legislation", "Legislative Politics"),
    // Economic Policy
    ("economy", "Economic Policy"),
    ("economic", "Economic Policy"),
    ("economics", "Economic Policy"),
    ("finance", "Economic Policy"),
    ("fiscal", "Economic Policy"),
    ("economic inequality", "Economic Policy"),
    ("corporate power & consumers", "Economic Policy"),
    ("corporate power and consumers", "Economic Policy"),
    ("trade", "Economic Policy"),
    // Healthcare Policy
    ("healthcare", "Healthcare Policy"),
    ("health", "Healthcare Policy"),
    ("medical", "Healthcare Policy"),
    ("health policy", "Healthcare Policy"),
    // Education Policy
    ("education", "Education Policy"),
    ("schools", "Education Policy"),
    ("student", "Education Policy"),
    // Environmental Policy
    ("environment", "Environmental Policy"),
    ("environmental", "Environmental Policy"),
    ("climate", "Environmental Policy"),
    ("energy", "Environmental Policy"),
    ("environment & science", "Environmental Policy"),
    ("environment and science", "Environmental Policy"),
    // Civil Rights
    ("civil rights", "Civil Rights"),
    ("civil liberties", "Civil Rights"),
    ("social justice", "Civil Rights"),
    ("criminal justice", "Civil Rights"),
    ("culture & media", "Civil Rights"),
    ("culture and media", "Civil Rights"),
    ("other", "General Politics"),
];

/// Fold an upstream category string onto a canonical label. Exact canonical
/// labels pass through; otherwise try an exact alias match, then a partial
/// match in either direction, then fall back to General Politics.
pub fn normalize_category(raw: &str) -> &'static str {
    if let Some(meta) = CATEGORIES.iter().find(|m| m.label == raw) {
        return meta.label;
    }
    let lower = raw.trim().to_lowercase();
    if lower.is_empty() {
        return FALLBACK_CATEGORY;
    }
    if let Some(&(_, canonical)) = ALIASES.iter().find(|&&(alias, _)| alias == lower) {
        return canonical;
    }
    for &(alias, canonical) in ALIASES {
        if lower.contains(alias) || alias.contains(lower.as_str()) {
            return canonical;
        }
    }
    FALLBACK_CATEGORY
}

pub fn category_meta(label: &str) -> Option<&'static CategoryMeta> {
    CATEGORIES.iter().find(|m| m.label == label)
}

/// Exact canonical-label match, case-insensitive, no alias fallback. The
/// live-event gate uses this: pre-categorized rows must already carry one
/// of the eleven labels to count as political.
pub fn canonical_label(raw: &str) -> Option<&'static str> {
    let trimmed = raw.trim();
    CATEGORIES
        .iter()
        .find(|m| m.label.eq_ignore_ascii_case(trimmed))
        .map(|m| m.label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_labels_pass_through() {
        assert_eq!(normalize_category("Immigration Policy"), "Immigration Policy");
    }

    #[test]
    fn exact_alias_beats_substring_scan() {
        // "health" as an exact alias, not via the "healthcare" substring
        assert_eq!(normalize_category("Health"), "Healthcare Policy");
        assert_eq!(normalize_category("other"), "General Politics");
    }

    #[test]
    fn substring_matches_in_either_direction() {
        // alias contained in the input
        assert_eq!(normalize_category("US immigration crackdown"), "Immigration Policy");
        // input contained in an alias ("elections & political figures")
        assert_eq!(normalize_category("figures"), "Elections & Voting");
    }

    #[test]
    fn first_alias_wins_on_overlap() {
        // contains both "executive" and "order"; the scan stops at the first hit
        assert_eq!(normalize_category("executive order tracker"), "Presidential Politics");
    }

    #[test]
    fn unknown_and_empty_fall_back() {
        assert_eq!(normalize_category("sports"), "General Politics");
        assert_eq!(normalize_category(""), "General Politics");
        assert_eq!(normalize_category("   "), "General Politics");
    }

    #[test]
    fn canonical_label_is_exact_but_case_blind() {
        assert_eq!(canonical_label("economic policy"), Some("Economic Policy"));
        assert_eq!(canonical_label("  Civil Rights "), Some("Civil Rights"));
        // aliases do not count here
        assert_eq!(canonical_label("economy"), None);
        assert_eq!(canonical_label(""), None);
    }

    #[test]
    fn every_category_has_distinct_id() {
        let mut ids: Vec<&str> = CATEGORIES.iter().map(|m| m.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), CATEGORIES.len());
    }
}
