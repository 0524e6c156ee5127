//! Identifier sanitisation.
//!
//! CAM tools parse these names back, so every rule here is exact.

use std::collections::HashSet;

/// Maximum length of an entity (layer, step, package) name
pub const MAX_ENTITY_NAME_LEN: usize = 64;

/// Legal entity name: lowercase `[a-z0-9._+-]`, everything else becomes `_`.
///
/// Leading `.`, `-` and `+` are dropped, as is a trailing `.`.
pub fn legal_entity_name(s: &str) -> String {
    let mapped: String = s
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '_' | '+' | '-' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect();

    let mut out = mapped
        .trim_start_matches(['.', '-', '+'])
        .to_string();
    out.truncate(MAX_ENTITY_NAME_LEN);
    while out.ends_with('.') {
        out.pop();
    }
    out
}

/// Net names allow printable ASCII 33..=126 except `;`
pub fn legal_net_name(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '!'..='~' if c != ';' => c,
            _ => '_',
        })
        .collect()
}

/// Component names share the net name character set
pub fn legal_component_name(s: &str) -> String {
    legal_net_name(s)
}

/// Value of a text attribute: printable ASCII, uppercased
pub fn text_attr_value(s: &str) -> String {
    s.chars()
        .filter(|c| (' '..='~').contains(c))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Generic ODB string: uppercased, non-printable characters become `?`
pub fn odb_string(s: &str) -> String {
    s.chars()
        .map(|c| {
            if (' '..='~').contains(&c) {
                c.to_ascii_uppercase()
            } else {
                '?'
            }
        })
        .collect()
}

/// Make `candidate` unique against `taken` by appending `_N`.
///
/// The stem is shortened so that the suffixed name stays within the
/// entity length limit. The returned name is inserted into `taken`.
pub fn unique_name(taken: &mut HashSet<String>, candidate: &str) -> String {
    if taken.insert(candidate.to_string()) {
        return candidate.to_string();
    }

    let mut n = 1usize;
    loop {
        let suffix = format!("_{n}");
        let mut stem = candidate.to_string();
        let room = MAX_ENTITY_NAME_LEN.saturating_sub(suffix.len());
        if stem.len() > room {
            stem.truncate(room);
        }
        let name = format!("{stem}{suffix}");
        if taken.insert(name.clone()) {
            return name;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_names_are_lowercase_and_legal() {
        assert_eq!(legal_entity_name("F.Cu"), "f.cu");
        assert_eq!(legal_entity_name("In1.Cu"), "in1.cu");
        assert_eq!(legal_entity_name("User Drawings"), "user_drawings");
        assert_eq!(legal_entity_name("COMP_+_TOP"), "comp_+_top");
    }

    #[test]
    fn entity_names_drop_leading_and_trailing_marks() {
        assert_eq!(legal_entity_name(".-+abc."), "abc");
        assert_eq!(legal_entity_name("abc..."), "abc");
    }

    #[test]
    fn entity_names_are_truncated() {
        let long = "x".repeat(100);
        assert_eq!(legal_entity_name(&long).len(), MAX_ENTITY_NAME_LEN);
    }

    #[test]
    fn net_names_replace_separators() {
        assert_eq!(legal_net_name("/Power;GND"), "/Power_GND");
        assert_eq!(legal_net_name("NET 1"), "NET_1");
        assert_eq!(legal_net_name("Ω"), "_");
    }

    #[test]
    fn text_values_are_uppercase_printable() {
        assert_eq!(text_attr_value("via_roundD0.6"), "VIA_ROUNDD0.6");
        assert_eq!(text_attr_value("a\tb"), "AB");
        assert_eq!(odb_string("a\tb"), "A?B");
    }

    #[test]
    fn unique_name_appends_suffix_within_limit() {
        let mut taken = HashSet::new();
        assert_eq!(unique_name(&mut taken, "r1"), "r1");
        assert_eq!(unique_name(&mut taken, "r1"), "r1_1");
        assert_eq!(unique_name(&mut taken, "r1"), "r1_2");

        let long = "y".repeat(64);
        assert_eq!(unique_name(&mut taken, &long), long);
        let second = unique_name(&mut taken, &long);
        assert_eq!(second.len(), MAX_ENTITY_NAME_LEN);
        assert!(second.ends_with("_1"));
    }
}
