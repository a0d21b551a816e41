use std::borrow::Cow;
use std::fmt::{self, Display};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static FIELD_NAME_PARSER: LazyLock<FieldNameParser> = LazyLock::new(FieldNameParser::init);

/// Compiled field-name grammar.
///
/// A field name starts with an ASCII letter or `_` and continues with ASCII
/// letters, digits or `_`. Numeric segments and `*` are reserved for
/// sequence indices and wildcards in attribute paths, so they can never be
/// field names.
pub struct FieldNameParser(Regex);

impl FieldNameParser {
    /// Initialize the parser. This compiles a regex, so keep it out of hot paths.
    pub fn init() -> Self {
        Self(Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap())
    }

    pub fn parse(&self, s: &str) -> Result<FieldName, FieldNameError> {
        let Some(matches) = self.0.find(s) else {
            return match s.chars().next() {
                Some(c) => Err(FieldNameError::InvalidChar {
                    at: 0,
                    invalid_char: c,
                }),
                None => Err(FieldNameError::Empty),
            };
        };
        if matches.len() == s.len() {
            return Ok(FieldName(Cow::Owned(s.to_string())));
        }
        let at = matches.as_str().chars().count();
        match s[matches.end()..].chars().next() {
            Some(invalid_char) => Err(FieldNameError::InvalidChar { at, invalid_char }),
            None => Err(FieldNameError::Empty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldName(Cow<'static, str>);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldNameError {
    #[error("empty field name")]
    Empty,
    #[error("invalid character for field name: {invalid_char:?} at {at}")]
    InvalidChar {
        /// Character index of the offending character.
        at: usize,
        invalid_char: char,
    },
}

impl FieldName {
    /// Creates a field name without validation, for compile-time constants.
    pub const fn new_unchecked(s: &'static str) -> Self {
        FieldName(Cow::Borrowed(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0.into()
    }
}

impl core::str::FromStr for FieldName {
    type Err = FieldNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FIELD_NAME_PARSER.parse(s)
    }
}

impl TryFrom<&str> for FieldName {
    type Error = FieldNameError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for FieldName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for FieldName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;

    use super::*;

    #[test]
    fn test_field_name() {
        assert_eq!(
            FieldName::from_str("userLabel"),
            Ok(FieldName(Cow::Owned("userLabel".to_string())))
        );
        assert_eq!(FieldName::from_str("_private_2").unwrap(), "_private_2");
    }

    #[test]
    fn test_field_name_unchecked_equals_parsed() {
        const ROOT: FieldName = FieldName::new_unchecked("root");
        assert_eq!(ROOT, FieldName::from_str("root").unwrap());
        assert_eq!(ROOT.as_str(), "root");
    }

    #[test]
    fn test_field_name_rejects_index() {
        assert_eq!(
            FieldName::from_str("0"),
            Err(FieldNameError::InvalidChar {
                at: 0,
                invalid_char: '0',
            })
        );
    }

    #[test]
    fn test_field_name_rejects_wildcard() {
        assert_eq!(
            FieldName::from_str("*"),
            Err(FieldNameError::InvalidChar {
                at: 0,
                invalid_char: '*',
            })
        );
    }

    #[test]
    fn test_field_name_rejects_dot() {
        assert_eq!(
            FieldName::from_str("a.b"),
            Err(FieldNameError::InvalidChar {
                at: 1,
                invalid_char: '.',
            })
        );
    }

    #[test]
    fn test_field_name_error_empty() {
        assert_eq!(FieldName::from_str(""), Err(FieldNameError::Empty));
    }
}
