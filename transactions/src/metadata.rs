//! Structured ISO 20022 payment metadata.
//!
//! Only the fields banking policies inspect are carried: the purpose code
//! (`Purp/Cd`) and the debtor/creditor agent BICs. Message formatting is
//! handled outside the core.

use serde::{Deserialize, Serialize};

use crate::error::TransactionError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub purpose_code: Option<String>,
    pub debtor_bic: Option<String>,
    pub creditor_bic: Option<String>,
    pub remittance_info: Option<String>,
}

impl PaymentMetadata {
    pub fn with_purpose(code: impl Into<String>) -> Self {
        Self {
            purpose_code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn has_purpose_code(&self) -> bool {
        self.purpose_code.as_deref().is_some_and(|c| !c.is_empty())
    }

    pub fn validate(&self) -> Result<(), TransactionError> {
        if let Some(code) = &self.purpose_code {
            if !is_valid_purpose_code(code) {
                return Err(TransactionError::Metadata(format!(
                    "purpose code {code:?} must be 4 uppercase alphanumerics"
                )));
            }
        }
        for (role, bic) in [("debtor", &self.debtor_bic), ("creditor", &self.creditor_bic)] {
            if let Some(bic) = bic {
                if !is_valid_bic(bic) {
                    return Err(TransactionError::Metadata(format!(
                        "{role} BIC {bic:?} is malformed"
                    )));
                }
            }
        }
        Ok(())
    }
}

pub fn is_valid_purpose_code(code: &str) -> bool {
    code.len() == 4
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// BIC layout: 4-letter institution, 2-letter country, 2-char location,
/// optional 3-char branch.
pub fn is_valid_bic(bic: &str) -> bool {
    let b = bic.as_bytes();
    if b.len() != 8 && b.len() != 11 {
        return false;
    }
    let upper_alnum = |c: &u8| c.is_ascii_uppercase() || c.is_ascii_digit();
    b[..6].iter().all(u8::is_ascii_uppercase) && b[6..].iter().all(upper_alnum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bic_lengths() {
        assert!(is_valid_bic("DEUTDEFF"));
        assert!(is_valid_bic("DEUTDEFF500"));
        assert!(!is_valid_bic("DEUTDEF"));
        assert!(!is_valid_bic("DEUTDEFF50"));
    }

    #[test]
    fn bic_rejects_digits_in_institution_or_country() {
        assert!(!is_valid_bic("D3UTDEFF"));
        assert!(!is_valid_bic("DEUTD1FF"));
        assert!(!is_valid_bic("deutdeff"));
    }

    #[test]
    fn purpose_code_shape() {
        assert!(is_valid_purpose_code("SALA"));
        assert!(is_valid_purpose_code("TRD1"));
        assert!(!is_valid_purpose_code("sala"));
        assert!(!is_valid_purpose_code("SAL"));
    }

    #[test]
    fn validate_reports_bad_creditor() {
        let meta = PaymentMetadata {
            purpose_code: Some("SUPP".into()),
            debtor_bic: Some("DEUTDEFF".into()),
            creditor_bic: Some("BAD".into()),
            remittance_info: None,
        };
        let err = meta.validate().unwrap_err();
        assert!(err.to_string().contains("creditor"));
    }

    #[test]
    fn missing_fields_are_valid_but_not_purposeful() {
        let meta = PaymentMetadata::default();
        assert!(meta.validate().is_ok());
        assert!(!meta.has_purpose_code());
        assert!(PaymentMetadata::with_purpose("SALA").has_purpose_code());
    }
}
