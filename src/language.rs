use std::fmt;

use thiserror::Error;
use unic_langid::LanguageIdentifier;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LanguageError {
    #[error("malformed language tag {0:?}")]
    Malformed(String),

    #[error("unknown language {0:?}")]
    Unknown(String),
}

/// ISO 639-3 codes that name no actual language
const SPECIAL_CODES: &[&str] = &["mis", "mul", "und", "zxx"];

/// A validated BCP 47 language tag such as `en`, `fr` or `pt-BR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag(LanguageIdentifier);

impl LanguageTag {
    /// Parse a user-supplied token. The primary subtag must be a registered
    /// ISO 639-1 or ISO 639-3 code, so plain words like "hello" do not count
    /// as languages.
    pub fn parse(token: &str) -> Result<Self, LanguageError> {
        let tag = Self::from_service(token)?;
        let primary = tag.0.language.as_str();
        let known = match primary.len() {
            2 => isolang::Language::from_639_1(primary).is_some(),
            3 => {
                !SPECIAL_CODES.contains(&primary)
                    && isolang::Language::from_639_3(primary).is_some()
            }
            _ => false,
        };
        if !known {
            return Err(LanguageError::Unknown(token.to_string()));
        }
        Ok(tag)
    }

    /// Accept any syntactically valid tag. Used for languages reported back by
    /// the translation service, which may use codes outside ISO 639-1.
    pub fn from_service(code: &str) -> Result<Self, LanguageError> {
        if code.trim().is_empty() {
            return Err(LanguageError::Malformed(code.to_string()));
        }
        code.parse::<LanguageIdentifier>()
            .map(Self)
            .map_err(|_| LanguageError::Malformed(code.to_string()))
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
