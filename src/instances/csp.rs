//! Closest string instances.

use std::collections::HashMap;

use super::{malformed, Result};

/// Strings of equal length over a fixed alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspInstance {
    pub alphabet: Vec<char>,
    pub strings: Vec<String>,
}

impl CspInstance {
    pub fn new(alphabet: impl IntoIterator<Item = char>, strings: &[&str]) -> Self {
        Self {
            alphabet: alphabet.into_iter().collect(),
            strings: strings.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet.len()
    }

    pub fn num_strings(&self) -> usize {
        self.strings.len()
    }

    /// Common length L of the strings (0 for an empty collection)
    pub fn string_length(&self) -> usize {
        self.strings.first().map_or(0, |s| s.chars().count())
    }

    /// Position of every symbol in the alphabet
    pub fn symbol_indices(&self) -> HashMap<char, usize> {
        self.alphabet
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.alphabet.is_empty() {
            return malformed("alphabet is empty");
        }
        let symbols = self.symbol_indices();
        if symbols.len() != self.alphabet.len() {
            return malformed("alphabet lists a symbol more than once");
        }
        if self.strings.is_empty() {
            return malformed("no input strings");
        }

        let length = self.string_length();
        if length == 0 {
            return malformed("input strings are empty");
        }
        for (s, string) in self.strings.iter().enumerate() {
            let count = string.chars().count();
            if count != length {
                return malformed(format!(
                    "string {} has length {}, expected {}",
                    s, count, length
                ));
            }
            if let Some(c) = string.chars().find(|c| !symbols.contains_key(c)) {
                return malformed(format!(
                    "string {} uses symbol '{}' outside the alphabet",
                    s, c
                ));
            }
        }
        Ok(())
    }
}

/// Number of positions at which two equal-length strings differ
pub fn hamming_distance(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).filter(|(x, y)| x != y).count()
}
