//! Relation-type name normalization.
//!
//! Lookups must treat "Also Bought", "also_bought" and "Also Boughts" as the
//! same relation type. Both the stored name and the requested key are run
//! through [`normalize`] before comparison: lowercase, spaces to underscores,
//! then English pluralization of the string tail. The rule set is the
//! conventional inflection table; relation type names are short noun phrases,
//! so the common rules cover them.

/// Normalize a relation-type name for comparison.
pub fn normalize(name: &str) -> String {
    let key = name.to_lowercase().replace(' ', "_");
    pluralize(&key)
}

/// Words that have no distinct plural form.
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
];

/// Irregular singular → plural pairs.
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
];

/// Pluralize the final word of an underscore-joined phrase.
///
/// Mirrors how the inflection rules behave on compound keys: only the tail of
/// the string changes ("also_bought" → "also_boughts", "accessory" →
/// "accessories"). Words already ending in "s" are left alone, which makes
/// the function idempotent.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let tail_start = word.rfind('_').map(|i| i + 1).unwrap_or(0);
    let (head, tail) = word.split_at(tail_start);

    if tail.is_empty() || UNCOUNTABLE.contains(&tail) {
        return word.to_string();
    }

    for (singular, plural) in IRREGULAR {
        if tail == *singular {
            return format!("{head}{plural}");
        }
        if tail == *plural {
            return word.to_string();
        }
    }

    let pluralized = apply_suffix_rules(tail);
    format!("{head}{pluralized}")
}

fn apply_suffix_rules(tail: &str) -> String {
    // Sibilant endings take "es". Checked before the trailing-"s" rule so
    // "class" still becomes "classes".
    if tail.ends_with("ss")
        || tail.ends_with("sh")
        || tail.ends_with("ch")
        || tail.ends_with('x')
        || tail.ends_with('z')
    {
        return format!("{tail}es");
    }

    if tail.ends_with('s') {
        return tail.to_string();
    }

    // Consonant + y → ies ("accessory" → "accessories"), vowel + y → +s.
    if let Some(stem) = tail.strip_suffix('y') {
        match stem.chars().last() {
            Some(c) if !is_vowel(c) => return format!("{stem}ies"),
            _ => return format!("{tail}s"),
        }
    }

    // knife → knives, shelf → shelves, scarf → scarves.
    if let Some(stem) = tail.strip_suffix("fe") {
        if !stem.ends_with('f') {
            return format!("{stem}ves");
        }
    }
    if let Some(stem) = tail.strip_suffix('f') {
        if stem.ends_with('l') || stem.ends_with('r') {
            return format!("{stem}ves");
        }
    }

    format!("{tail}s")
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}
