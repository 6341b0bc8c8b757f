//! Political-relevance classifier for the 18-29 U.S. cohort. Keyword tiers
//! run over scrubbed, space-padded text so matches are whole-word.

use crate::text::{scrub_padded, word_in};

/// Unambiguous U.S. political keywords. One whole-word hit passes.
const STRONG_KEYWORDS: &[&str] = &[
    // administration
    "trump", "white house", "maga", "executive order",
    // congress / legislation
    "congress", "senate", "house of representatives", "filibuster",
    "legislation", "democrat", "republican",
    // federal spending
    "doge", "elon musk", "federal worker", "federal employee",
    "federal budget", "government efficiency", "spending cut",
    // economy
    "tariff", "tariffs", "trade war", "inflation", "unemployment",
    // immigration
    "immigration", "deportation", "ice raid", "daca",
    "undocumented", "migrant",
    // domestic policy
    "healthcare", "medicare", "medicaid", "obamacare", "aca",
    "abortion", "gun control", "gun violence", "second amendment",
    "supreme court", "social security", "student debt",
    "climate change", "climate policy",
    // budget / debt
    "deficit", "debt ceiling", "appropriations",
    // major addresses
    "state of the union", "sotu", "address to congress",
    // figures
    "biden", "kamala", "harris", "rubio", "noem", "hegseth",
    "gabbard", "patel",
    // sanctions
    "sanction", "sanctions",
];

/// Country and region names that need a second signal. A bare mention
/// ("live in china") is travel or culture content, not politics.
const COUNTRY_KEYWORDS: &[&str] = &[
    "ukraine", "russia", "nato", "china", "taiwan", "iran", "israel",
    "gaza", "middle east", "north korea",
];

/// Second-tier signals confirming a country mention is political.
const COUNTRY_CONTEXT_KEYWORDS: &[&str] = &[
    "war", "missile", "military", "soldier", "bomb", "attack",
    "policy", "aid", "deal", "treaty", "alliance", "conflict", "nuclear",
    "diplomat", "minister", "president", "election", "coup", "protest",
    "weapon", "troops", "invasion", "occupied", "ceasefire",
    "parliament", "foreign", "bilateral", "tariff", "tariffs",
    "trade", "sanction", "sanctions",
];

/// Phrases that disqualify an item even when a keyword fires. Catches
/// foreign-political and tabloid content leaking through broad terms
/// like "president", "coup", "parliament". Substring match on raw text.
const BLOCKLIST: &[&str] = &[
    "prince andrew", "prince william", "prince harry", "royal family",
    "buckingham", "king charles",
    "south korea", "yoon suk", "korean president",
    "epstein",
    "blondie in china", "white girl in china",
];

/// Two-tier relevance check on an item's query/topic text.
///
/// Tier 1: any strong keyword as a whole word. Tier 2: a country name
/// counts only when a context word confirms the political angle.
/// The blocklist runs first and wins regardless.
pub fn is_political(raw_text: &str) -> bool {
    let raw = raw_text.to_lowercase();
    if BLOCKLIST.iter().any(|phrase| raw.contains(phrase)) {
        return false;
    }

    let padded = scrub_padded(raw_text);
    if STRONG_KEYWORDS.iter().any(|kw| word_in(kw, &padded)) {
        return true;
    }
    if COUNTRY_KEYWORDS.iter().any(|kw| word_in(kw, &padded)) {
        return COUNTRY_CONTEXT_KEYWORDS.iter().any(|kw| word_in(kw, &padded));
    }
    false
}
