use regex::Regex;
use serde::Serialize;
use simt_core::{RecordKind, Rib, RibError};
use std::fmt;
use thiserror::Error;

use crate::patterns::{re_emission_after_zeros, re_processing_dates, re_reference, re_rib_block};
use crate::profile::{Profile, ProfileError};
use crate::util::{parse_compact_date, parse_compact_datetime};

const TIMESTAMP_LENGTH: usize = 14;

/// Result of the structural checks on one line. Not an error by itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RibRole {
    Originator,
    Beneficiary,
}

impl fmt::Display for RibRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RibRole::Originator => write!(f, "originator"),
            RibRole::Beneficiary => write!(f, "beneficiary"),
        }
    }
}

/// A detail line carries a RIB with a wrong key. Aborts the whole file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {role} RIB {rib}: {source}")]
pub struct ChecksumError {
    pub role: RibRole,
    pub rib: String,
    #[source]
    pub source: RibError,
}

/// Structural checks for header, detail and footer lines.
pub struct RecordValidator {
    profile: Profile,
    client_token: Regex,
    filler: Regex,
    amount: Regex,
    beneficiary_name: Regex,
}

impl RecordValidator {
    pub fn new(profile: &Profile) -> Result<Self, ProfileError> {
        profile.check()?;
        let clients = profile.client_alternation();
        Ok(Self {
            client_token: profile.compile(&format!(r"(?i)\b(?:{clients})\b"))?,
            filler: profile.compile(&format!(r"\b{}\b", regex::escape(&profile.detail_filler)))?,
            amount: profile.compile(&format!(
                r"{}[0-9]{{8,16}}\.[0-9]{{1,2}}",
                regex::escape(&profile.amount_marker)
            ))?,
            beneficiary_name: profile.compile(&format!(
                r"(?i)\b(?:{clients})\s+[A-Z][A-Z\s.&]{{4,34}}\s+[0-9]{{48}}"
            ))?,
            profile: profile.clone(),
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Runs every rule for `kind` and collects the failures. A detail line
    /// whose RIB block fails the key check returns `Err` instead.
    pub fn validate(
        &self,
        line: &str,
        kind: RecordKind,
    ) -> Result<ValidationOutcome, ChecksumError> {
        let errors = match kind {
            RecordKind::Header => self.header_errors(line),
            RecordKind::Detail => self.detail_errors(line)?,
            RecordKind::Footer => self.footer_errors(line),
        };
        Ok(ValidationOutcome::from_errors(errors))
    }

    // ── Header ───────────────────────────────────────────────────────────────

    fn header_errors(&self, line: &str) -> Vec<String> {
        let p = &self.profile;
        let mut errors = Vec::new();

        if !line.starts_with(&p.header_code) {
            errors.push(format!("Header must start with record code '{}'", p.header_code));
        }

        // The zero run after the code must end exactly where the timestamp starts.
        let zeros = line
            .chars()
            .skip(p.header_code.chars().count())
            .take_while(|c| *c == '0')
            .count();
        if zeros != p.header_filler_length {
            errors.push(format!(
                "Header filler must be exactly {} zeros, found {zeros}",
                p.header_filler_length
            ));
        }

        match line.find(&p.currency) {
            None => errors.push(format!("Currency marker '{}' is missing from header", p.currency)),
            Some(pos) => {
                let before: Vec<char> = line[..pos].chars().collect();
                let stamp: String = before[before.len().saturating_sub(TIMESTAMP_LENGTH)..]
                    .iter()
                    .collect();
                if stamp.chars().count() != TIMESTAMP_LENGTH
                    || parse_compact_datetime(&stamp).is_none()
                {
                    errors.push(format!("Header production timestamp is invalid: '{stamp}'"));
                }
            }
        }

        errors
    }

    // ── Detail ───────────────────────────────────────────────────────────────

    fn detail_errors(&self, line: &str) -> Result<Vec<String>, ChecksumError> {
        let p = &self.profile;
        let mut errors = Vec::new();

        if !line.starts_with(&p.detail_code) {
            errors.push(format!("Detail must start with record code '{}'", p.detail_code));
        }

        if !self.client_token.is_match(line) {
            errors.push(format!(
                "Originator name ({}) is missing",
                p.client_tokens.join(" or ")
            ));
        }

        if !self.filler.is_match(line) {
            errors.push(format!("Mandatory filler '{}' is missing", p.detail_filler));
        }

        if !self.amount.is_match(line) {
            errors.push(format!(
                "Amount after '{}' is missing or malformed",
                p.amount_marker
            ));
        }

        match re_rib_block().captures(line) {
            None => errors.push("48-digit block holding both RIBs is missing".to_string()),
            Some(c) => {
                let block = &c[1];
                let (originator, beneficiary) = block.split_at(24);
                check_rib(originator, RibRole::Originator)?;
                check_rib(beneficiary, RibRole::Beneficiary)?;
                if !originator.starts_with(&p.bank_code) && !beneficiary.starts_with(&p.bank_code) {
                    errors.push(format!(
                        "Neither RIB starts with bank code '{}'",
                        p.bank_code
                    ));
                }
            }
        }

        if !self.beneficiary_name.is_match(line) {
            errors.push("Beneficiary name is missing or malformed".to_string());
        }

        if !re_reference().is_match(line) {
            errors.push("Transfer reference (NNN-NNNNNN) is missing".to_string());
        }

        match re_emission_after_zeros().captures(line) {
            None => errors.push("Emission date not found".to_string()),
            Some(c) if parse_compact_date(&c[1]).is_none() => {
                errors.push(format!("Emission date is invalid: '{}'", &c[1]));
            }
            Some(_) => {}
        }

        match re_processing_dates().captures(line) {
            None => {
                errors.push("Processing date not found".to_string());
                errors.push("Execution date not found".to_string());
            }
            Some(c) => {
                if parse_compact_date(&c[1]).is_none() {
                    errors.push(format!("Processing date is invalid: '{}'", &c[1]));
                }
                match c.get(2) {
                    None => errors.push("Execution date not found".to_string()),
                    Some(m) if parse_compact_date(m.as_str()).is_none() => {
                        errors.push(format!("Execution date is invalid: '{}'", m.as_str()));
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(errors)
    }

    // ── Footer ───────────────────────────────────────────────────────────────

    fn footer_errors(&self, line: &str) -> Vec<String> {
        let code = &self.profile.footer_code;
        if line.starts_with(code) {
            Vec::new()
        } else {
            vec![format!("Footer must start with record code '{code}'")]
        }
    }
}

fn check_rib(digits: &str, role: RibRole) -> Result<Rib, ChecksumError> {
    digits.parse::<Rib>().map_err(|source| ChecksumError {
        role,
        rib: digits.to_string(),
        source,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Sample lines shared by the validator, extractor and transcoder tests.

    pub const ORIGINATOR_RIB: &str = "007780000065258741236530";
    pub const BENEFICIARY_RIB: &str = "011640000001248001501808";
    pub const BAD_RIB: &str = "007780000065258741236532";

    pub const HEADER: &str = "1000000000000000000020240722114905MAD20679812";
    pub const FOOTER: &str = "1100004000000000943750.7500004";

    pub fn detail_with(originator: &str, beneficiary: &str, reference: &str) -> String {
        format!(
            "04020007015000000202403070070051000001     MAD20000000250000.002024030820240428                     00                                   mcma                               ME BERRADA NAJIB                   {originator}{beneficiary}        Rente invalidité                   {reference}"
        )
    }

    pub fn detail() -> String {
        detail_with(ORIGINATOR_RIB, BENEFICIARY_RIB, "301-541242")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn validator() -> RecordValidator {
        RecordValidator::new(&Profile::default()).unwrap()
    }

    fn errors_of(line: &str, kind: RecordKind) -> Vec<String> {
        validator().validate(line, kind).unwrap().errors
    }

    // ── Header ────────────────────────────────────────────────────────────────

    #[test]
    fn valid_header() {
        let outcome = validator().validate(HEADER, RecordKind::Header).unwrap();
        assert!(outcome.valid, "{:?}", outcome.errors);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn header_wrong_code() {
        let line = HEADER.replacen("10", "11", 1);
        let errors = errors_of(&line, RecordKind::Header);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("record code '10'"));
    }

    #[test]
    fn header_filler_not_zero() {
        let line = "1012345678901234567820240722114905MAD20679812";
        let errors = errors_of(line, RecordKind::Header);
        assert!(errors.iter().any(|e| e.contains("18 zeros")));
    }

    #[test]
    fn header_filler_too_long() {
        // One column shifted right: 19 zeros, timestamp still 14 digits before MAD.
        let line = "10000000000000000000020240722114905MAD20679812";
        let errors = errors_of(line, RecordKind::Header);
        assert_eq!(errors, vec!["Header filler must be exactly 18 zeros, found 19".to_string()]);
    }

    #[test]
    fn header_filler_too_short() {
        let line = "100000000000000000020240722114905MAD20679812";
        let errors = errors_of(line, RecordKind::Header);
        assert!(errors.iter().any(|e| e.contains("found 17")));
    }

    #[test]
    fn header_twelve_digit_timestamp_is_rejected() {
        let line = "10000000000000000000202407221149MAD20679812";
        let errors = errors_of(line, RecordKind::Header);
        assert!(errors.iter().any(|e| e.contains("production timestamp")));
    }

    #[test]
    fn header_impossible_timestamp() {
        let line = HEADER.replace("20240722114905", "20249999114905");
        let errors = errors_of(&line, RecordKind::Header);
        assert!(errors.iter().any(|e| e.contains("production timestamp")));
    }

    #[test]
    fn header_without_currency() {
        let errors = errors_of("1000000000000000000020240722114905", RecordKind::Header);
        assert!(errors.iter().any(|e| e.contains("Currency marker 'MAD'")));
    }

    // ── Detail ────────────────────────────────────────────────────────────────

    #[test]
    fn valid_detail() {
        let outcome = validator().validate(&detail(), RecordKind::Detail).unwrap();
        assert!(outcome.valid, "{:?}", outcome.errors);
    }

    #[test]
    fn detail_wrong_code() {
        let line = detail().replacen("04", "03", 1);
        let errors = errors_of(&line, RecordKind::Detail);
        assert!(errors.iter().any(|e| e.contains("record code '04'")));
    }

    #[test]
    fn detail_without_client_token() {
        let line = detail().replace("mcma", "    ");
        let errors = errors_of(&line, RecordKind::Detail);
        assert!(errors.iter().any(|e| e.contains("Originator name")));
        // The name pattern is anchored on the token too.
        assert!(errors.iter().any(|e| e.contains("Beneficiary name")));
    }

    #[test]
    fn client_token_is_case_insensitive() {
        let line = detail().replace("mcma", "MAMDA");
        assert!(validator().validate(&line, RecordKind::Detail).unwrap().valid);
    }

    #[test]
    fn detail_without_rib_block() {
        let line = detail().replace(&format!("{ORIGINATOR_RIB}{BENEFICIARY_RIB}"), &" ".repeat(48));
        let errors = errors_of(&line, RecordKind::Detail);
        assert!(errors.iter().any(|e| e.contains("48-digit block")));
    }

    #[test]
    fn detail_without_reference() {
        let line = detail_with(ORIGINATOR_RIB, BENEFICIARY_RIB, "");
        let errors = errors_of(&line, RecordKind::Detail);
        assert_eq!(errors, vec!["Transfer reference (NNN-NNNNNN) is missing".to_string()]);
    }

    #[test]
    fn detail_bank_code_rule() {
        // Both RIBs valid but neither from the expected bank.
        let line = detail_with(BENEFICIARY_RIB, BENEFICIARY_RIB, "301-541242");
        let errors = errors_of(&line, RecordKind::Detail);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("bank code '007'"));
    }

    #[test]
    fn detail_bad_originator_rib_is_fatal() {
        let line = detail_with(BAD_RIB, BENEFICIARY_RIB, "301-541242");
        let err = validator().validate(&line, RecordKind::Detail).unwrap_err();
        assert_eq!(err.role, RibRole::Originator);
        assert_eq!(err.rib, BAD_RIB);
        assert_eq!(err.source, RibError::BadKey { expected: 30, found: 32 });
    }

    #[test]
    fn detail_bad_beneficiary_rib_is_fatal() {
        let line = detail_with(ORIGINATOR_RIB, "011640000001248001501809", "");
        let err = validator().validate(&line, RecordKind::Detail).unwrap_err();
        assert_eq!(err.role, RibRole::Beneficiary);
        assert!(err.to_string().contains("beneficiary RIB 011640000001248001501809"));
    }

    #[test]
    fn detail_invalid_dates() {
        let line = detail().replace("2024030820240428", "2024133020241345");
        let errors = errors_of(&line, RecordKind::Detail);
        assert!(errors.iter().any(|e| e.contains("Processing date is invalid: '20241330'")));
        assert!(errors.iter().any(|e| e.contains("Execution date is invalid: '20241345'")));

        let line = detail().replacen("20240307", "20240399", 1);
        let errors = errors_of(&line, RecordKind::Detail);
        assert_eq!(errors, vec!["Emission date is invalid: '20240399'".to_string()]);
    }

    #[test]
    fn detail_amount_rule() {
        let line = detail().replace("MAD20000000250000.00", "MAD2xxxxxxx250000.00");
        let errors = errors_of(&line, RecordKind::Detail);
        assert!(errors.iter().any(|e| e.contains("Amount after 'MAD2'")));
    }

    #[test]
    fn garbage_detail_collects_errors_without_panicking() {
        let outcome = validator().validate("garbage", RecordKind::Detail).unwrap();
        assert!(!outcome.valid);
        assert!(outcome.errors.len() >= 8);
    }

    // ── Footer ────────────────────────────────────────────────────────────────

    #[test]
    fn footer_code() {
        assert!(validator().validate(FOOTER, RecordKind::Footer).unwrap().valid);
        let errors = errors_of("1000004000000000943750.7500004", RecordKind::Footer);
        assert_eq!(errors, vec!["Footer must start with record code '11'".to_string()]);
    }

    #[test]
    fn custom_profile_codes() {
        let profile = Profile {
            footer_code: "99".into(),
            ..Profile::default()
        };
        let v = RecordValidator::new(&profile).unwrap();
        assert!(v.validate("99000", RecordKind::Footer).unwrap().valid);
        assert!(!v.validate(FOOTER, RecordKind::Footer).unwrap().valid);
    }
}
