//! Engine and substitution switches

use crate::config::runtime::ParserPreferences;
use serde::{Deserialize, Serialize};

/// Engine-level switches that change how scripts are scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineFlags {
    /// `#` at command position starts a comment
    pub allow_comments: bool,
    /// Backslash-newline inside a comment continues it onto the next line
    pub comment_continuation: bool,
    /// Non-ASCII alphanumerics are accepted in variable names
    pub unicode_identifiers: bool,
}

impl Default for EngineFlags {
    fn default() -> Self {
        Self {
            allow_comments: true,
            comment_continuation: true,
            unicode_identifiers: true,
        }
    }
}

impl From<&ParserPreferences> for EngineFlags {
    fn from(preferences: &ParserPreferences) -> Self {
        Self {
            allow_comments: preferences.allow_comments,
            ..Self::default()
        }
    }
}

/// Which substitution kinds are recognized
///
/// A disabled kind makes its trigger character (`$`, `[` or `\`) ordinary
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstitutionFlags {
    pub substitute_variables: bool,
    pub substitute_commands: bool,
    pub substitute_backslashes: bool,
}

impl SubstitutionFlags {
    pub fn all() -> Self {
        Self {
            substitute_variables: true,
            substitute_commands: true,
            substitute_backslashes: true,
        }
    }

    pub fn none() -> Self {
        Self {
            substitute_variables: false,
            substitute_commands: false,
            substitute_backslashes: false,
        }
    }

    /// Whether `byte` starts an enabled substitution
    pub fn triggers(&self, byte: u8) -> bool {
        match byte {
            b'$' => self.substitute_variables,
            b'[' => self.substitute_commands,
            b'\\' => self.substitute_backslashes,
            _ => false,
        }
    }
}

impl Default for SubstitutionFlags {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers_follow_flags() {
        let flags = SubstitutionFlags {
            substitute_commands: false,
            ..SubstitutionFlags::all()
        };

        assert!(flags.triggers(b'$'));
        assert!(!flags.triggers(b'['));
        assert!(flags.triggers(b'\\'));
        assert!(!flags.triggers(b'a'));
        assert!(!SubstitutionFlags::none().triggers(b'$'));
    }

    #[test]
    fn test_engine_flags_from_preferences() {
        let preferences = ParserPreferences {
            allow_comments: false,
            ..ParserPreferences::default()
        };
        let flags = EngineFlags::from(&preferences);

        assert!(!flags.allow_comments);
        assert!(flags.comment_continuation);
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let flags: SubstitutionFlags =
            serde_json::from_str(r#"{"substitute_commands":false}"#).unwrap();
        assert_eq!(
            flags,
            SubstitutionFlags {
                substitute_commands: false,
                ..SubstitutionFlags::all()
            }
        );
    }
}
