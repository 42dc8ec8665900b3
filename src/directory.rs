use crate::config::{ExtensionAction, ExtensionEntry};
use anyhow::{bail, Result};
use std::collections::HashSet;

/// Static dial-pad menu loaded from configuration at startup. Entries keep
/// their configuration order so the spoken menu text is deterministic.
pub struct ExtensionDirectory {
    entries: Vec<ExtensionEntry>,
    max_digits: usize,
}

impl ExtensionDirectory {
    /// An empty or inconsistent table is a configuration error and must fail
    /// here, before the first webhook arrives.
    pub fn new(entries: Vec<ExtensionEntry>) -> Result<Self> {
        if entries.is_empty() {
            bail!("no extensions configured, the menu would be empty");
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.digits.is_empty() {
                bail!("extension {:?} has empty digits", entry.name);
            }
            if let Some(c) = entry
                .digits
                .chars()
                .find(|c| !matches!(c, '0'..='9' | '*' | '#'))
            {
                bail!("extension {}: {:?} is not a dial-pad digit", entry.digits, c);
            }
            if !seen.insert(entry.digits.as_str()) {
                bail!("duplicate extension digits {}", entry.digits);
            }
        }
        let max_digits = entries.iter().map(|e| e.digits.len()).max().unwrap_or(0);
        Ok(Self { entries, max_digits })
    }

    /// Exact-match lookup, no prefix matching.
    pub fn lookup(&self, digits: &str) -> Option<&ExtensionEntry> {
        self.entries.iter().find(|e| e.digits == digits)
    }

    /// How many digits the caller is prompted for. The gather is fixed-count,
    /// not terminator-based.
    pub fn max_digits(&self) -> usize {
        self.max_digits
    }

    pub fn entries(&self) -> &[ExtensionEntry] {
        &self.entries
    }

    pub fn has_mail_recipients(&self) -> bool {
        self.entries.iter().any(|e| {
            matches!(
                &e.action,
                ExtensionAction::Voicemail {
                    recipient: Some(_),
                    ..
                }
            )
        })
    }
}
