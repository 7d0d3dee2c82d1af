//! Banking-policy script interpreter.
//!
//! A script is a semicolon-separated list of instructions:
//!
//! | Instruction | Fails when |
//! |---|---|
//! | `REQUIRE_KYC <level>` | `level` exceeds the attestable KYC ceiling |
//! | `LIMIT_MAX <amount>` | the transaction amount exceeds `amount` |
//! | `CHECK_SANCTIONS` | the sender is sanctioned |
//! | `REQUIRE_ISO20022` | payment metadata or its purpose code is absent |
//!
//! Unknown instructions are ignored. Evaluation stops at the first failure
//! and has no side effects.

use dualnet_transactions::{PaymentMetadata, Transaction};
use dualnet_types::{Amount, PublicKey};

use crate::{ComplianceManager, PolicyViolation};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    RequireKyc(u8),
    LimitMax(Amount),
    CheckSanctions,
    RequireIso20022,
    Unknown(String),
}

impl Instruction {
    pub fn parse(text: &str) -> Result<Self, PolicyViolation> {
        let mut parts = text.split_whitespace();
        let op = parts.next().unwrap_or_default();
        let operand = parts.next();
        let instruction = match op {
            "REQUIRE_KYC" => Self::RequireKyc(parse_operand(text, operand)?),
            "LIMIT_MAX" => Self::LimitMax(Amount::new(parse_operand(text, operand)?)),
            "CHECK_SANCTIONS" => Self::CheckSanctions,
            "REQUIRE_ISO20022" => Self::RequireIso20022,
            _ => Self::Unknown(text.to_string()),
        };
        Ok(instruction)
    }
}

fn parse_operand<T: std::str::FromStr>(text: &str, operand: Option<&str>) -> Result<T, PolicyViolation> {
    operand
        .and_then(|o| o.parse().ok())
        .ok_or_else(|| PolicyViolation::MalformedInstruction(text.to_string()))
}

/// What an instruction may inspect.
pub struct PolicyContext<'a> {
    pub sender: &'a PublicKey,
    pub amount: Amount,
    pub metadata: Option<&'a PaymentMetadata>,
    pub kyc_ceiling: u8,
    pub compliance: &'a dyn ComplianceManager,
}

impl<'a> PolicyContext<'a> {
    pub fn for_transaction(
        tx: &'a Transaction,
        compliance: &'a dyn ComplianceManager,
        kyc_ceiling: u8,
    ) -> Self {
        Self {
            sender: &tx.sender,
            amount: tx.amount,
            metadata: tx.metadata.as_ref(),
            kyc_ceiling,
            compliance,
        }
    }

    fn check(&self, instruction: &Instruction) -> Result<(), PolicyViolation> {
        match instruction {
            Instruction::RequireKyc(level) => {
                if *level > self.kyc_ceiling {
                    return Err(PolicyViolation::KycCeilingExceeded {
                        required: *level,
                        ceiling: self.kyc_ceiling,
                    });
                }
            }
            Instruction::LimitMax(limit) => {
                if self.amount > *limit {
                    return Err(PolicyViolation::LimitExceeded {
                        amount: self.amount,
                        limit: *limit,
                    });
                }
            }
            Instruction::CheckSanctions => {
                if self.compliance.is_sanctioned(self.sender) {
                    return Err(PolicyViolation::SenderSanctioned);
                }
            }
            Instruction::RequireIso20022 => {
                if !self.metadata.is_some_and(PaymentMetadata::has_purpose_code) {
                    return Err(PolicyViolation::MissingIso20022);
                }
            }
            Instruction::Unknown(_) => {}
        }
        Ok(())
    }
}

/// Evaluate `script` left to right, stopping at the first violation.
pub fn evaluate_script(script: &str, ctx: &PolicyContext<'_>) -> Result<(), PolicyViolation> {
    for text in script.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let instruction = Instruction::parse(text)?;
        ctx.check(&instruction)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ComplianceRegistry;
    use dualnet_types::SignatureAlgorithm;

    fn key(b: u8) -> PublicKey {
        PublicKey::new(SignatureAlgorithm::Ed25519, [b; 32])
    }

    fn run(script: &str, amount: u128, metadata: Option<&PaymentMetadata>, registry: &ComplianceRegistry) -> Result<(), PolicyViolation> {
        let sender = key(1);
        let ctx = PolicyContext {
            sender: &sender,
            amount: Amount::new(amount),
            metadata,
            kyc_ceiling: 3,
            compliance: registry,
        };
        evaluate_script(script, &ctx)
    }

    #[test]
    fn empty_script_passes() {
        assert!(run("", 10, None, &ComplianceRegistry::default()).is_ok());
        assert!(run(" ; ;", 10, None, &ComplianceRegistry::default()).is_ok());
    }

    #[test]
    fn kyc_ceiling() {
        let reg = ComplianceRegistry::default();
        assert!(run("REQUIRE_KYC 3", 10, None, &reg).is_ok());
        assert_eq!(
            run("REQUIRE_KYC 4", 10, None, &reg),
            Err(PolicyViolation::KycCeilingExceeded { required: 4, ceiling: 3 })
        );
    }

    #[test]
    fn limit_is_inclusive() {
        let reg = ComplianceRegistry::default();
        assert!(run("LIMIT_MAX 1000", 1000, None, &reg).is_ok());
        assert!(matches!(
            run("LIMIT_MAX 1000", 1001, None, &reg),
            Err(PolicyViolation::LimitExceeded { .. })
        ));
    }

    #[test]
    fn sanctions_checked_only_when_asked() {
        let reg = ComplianceRegistry::default();
        reg.add_sanction(key(1));
        assert!(run("LIMIT_MAX 50", 10, None, &reg).is_ok());
        assert_eq!(run("CHECK_SANCTIONS", 10, None, &reg), Err(PolicyViolation::SenderSanctioned));
    }

    #[test]
    fn iso20022_requires_purpose_code() {
        let reg = ComplianceRegistry::default();
        let without = PaymentMetadata::default();
        let with = PaymentMetadata::with_purpose("SALA");
        assert_eq!(run("REQUIRE_ISO20022", 1, None, &reg), Err(PolicyViolation::MissingIso20022));
        assert_eq!(run("REQUIRE_ISO20022", 1, Some(&without), &reg), Err(PolicyViolation::MissingIso20022));
        assert!(run("REQUIRE_ISO20022", 1, Some(&with), &reg).is_ok());
    }

    #[test]
    fn unknown_instructions_ignored() {
        let reg = ComplianceRegistry::default();
        assert!(run("NOTIFY_REGULATOR; REQUIRE_KYC 1", 1, None, &reg).is_ok());
    }

    #[test]
    fn first_failure_wins() {
        let reg = ComplianceRegistry::default();
        reg.add_sanction(key(1));
        let err = run("LIMIT_MAX 5; CHECK_SANCTIONS", 10, None, &reg).unwrap_err();
        assert!(matches!(err, PolicyViolation::LimitExceeded { .. }));
    }

    #[test]
    fn malformed_operand_is_violation() {
        let reg = ComplianceRegistry::default();
        assert!(matches!(
            run("LIMIT_MAX abc", 1, None, &reg),
            Err(PolicyViolation::MalformedInstruction(_))
        ));
        assert!(matches!(
            run("REQUIRE_KYC", 1, None, &reg),
            Err(PolicyViolation::MalformedInstruction(_))
        ));
    }

    #[test]
    fn parse_variants() {
        assert_eq!(Instruction::parse("REQUIRE_KYC 2").unwrap(), Instruction::RequireKyc(2));
        assert_eq!(Instruction::parse("CHECK_SANCTIONS").unwrap(), Instruction::CheckSanctions);
        assert!(matches!(Instruction::parse("FOO 1").unwrap(), Instruction::Unknown(_)));
    }
}
