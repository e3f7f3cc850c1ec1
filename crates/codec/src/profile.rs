use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Failed to parse profile: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Profile declares no client tokens")]
    NoClientTokens,
    #[error("Profile field '{0}' must not be empty")]
    EmptyMarker(&'static str),
    #[error("Failed to compile profile pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Fixed markers of one clearing-house file family. Every field has a default
/// matching the MAD transfer files, so a profile file only lists overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub header_code: String,
    pub detail_code: String,
    pub footer_code: String,
    /// Zeros expected right after the header code.
    pub header_filler_length: usize,
    pub currency: String,
    /// Marker in front of detail amounts (currency followed by the sign digit).
    pub amount_marker: String,
    /// Originator tokens, matched case-insensitively.
    pub client_tokens: Vec<String>,
    /// At least one RIB of a detail line must belong to this bank.
    pub bank_code: String,
    pub detail_filler: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            header_code: "10".to_string(),
            detail_code: "04".to_string(),
            footer_code: "11".to_string(),
            header_filler_length: 18,
            currency: "MAD".to_string(),
            amount_marker: "MAD2".to_string(),
            client_tokens: vec!["mcma".to_string(), "mamda".to_string()],
            bank_code: "007".to_string(),
            detail_filler: "00".to_string(),
        }
    }
}

impl Profile {
    pub fn from_toml(toml_content: &str) -> Result<Self, ProfileError> {
        let profile: Profile = toml::from_str(toml_content)?;
        profile.check()?;
        Ok(profile)
    }

    pub fn check(&self) -> Result<(), ProfileError> {
        if self.client_tokens.iter().all(|t| t.trim().is_empty()) {
            return Err(ProfileError::NoClientTokens);
        }
        let markers = [
            ("header_code", &self.header_code),
            ("detail_code", &self.detail_code),
            ("footer_code", &self.footer_code),
            ("currency", &self.currency),
            ("amount_marker", &self.amount_marker),
            ("bank_code", &self.bank_code),
            ("detail_filler", &self.detail_filler),
        ];
        for (name, value) in markers {
            if value.is_empty() {
                return Err(ProfileError::EmptyMarker(name));
            }
        }
        Ok(())
    }

    /// Regex alternation of the escaped client tokens, e.g. `mcma|mamda`.
    pub(crate) fn client_alternation(&self) -> String {
        self.client_tokens
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Compiles a pattern built from this profile's markers.
    pub(crate) fn compile(&self, pattern: &str) -> Result<Regex, ProfileError> {
        Ok(Regex::new(pattern)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_valid() {
        assert!(Profile::default().check().is_ok());
    }

    #[test]
    fn from_toml_overrides_only_listed_fields() {
        let p = Profile::from_toml("currency = \"EUR\"\namount_marker = \"EUR2\"\n").unwrap();
        assert_eq!(p.currency, "EUR");
        assert_eq!(p.amount_marker, "EUR2");
        assert_eq!(p.header_code, "10");
        assert_eq!(p.client_tokens, vec!["mcma", "mamda"]);
    }

    #[test]
    fn from_toml_rejects_empty_tokens() {
        assert!(matches!(
            Profile::from_toml("client_tokens = []\n"),
            Err(ProfileError::NoClientTokens)
        ));
        assert!(matches!(
            Profile::from_toml("client_tokens = [\" \"]\n"),
            Err(ProfileError::NoClientTokens)
        ));
    }

    #[test]
    fn from_toml_rejects_empty_marker() {
        assert!(matches!(
            Profile::from_toml("bank_code = \"\"\n"),
            Err(ProfileError::EmptyMarker("bank_code"))
        ));
    }

    #[test]
    fn client_alternation_escapes_tokens() {
        let p = Profile {
            client_tokens: vec!["a.b".into(), "mcma".into()],
            ..Profile::default()
        };
        assert_eq!(p.client_alternation(), r"a\.b|mcma");
    }
}
