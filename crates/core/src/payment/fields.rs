//! Payment-method field rules.
//!
//! Which bank fields a payment must or must not carry depends on its kind
//! and method. The rules are a lookup table rather than nested branches so
//! each combination can be read (and tested) on its own.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::{FieldViolation, PaymentError};
use super::types::{PaymentKind, PaymentMethod};

use BankField::{BankAccount, BankHolder, BankName, BankNumber, GiroNumber};

/// Decimal places an amount column holds.
pub const AMOUNT_SCALE: u32 = 4;

/// Integer digits an amount column holds (`NUMERIC(19, 4)`).
pub const AMOUNT_INTEGER_DIGITS: u32 = 15;

/// A bank-related field on a payment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankField {
    /// Account or card number.
    BankNumber,
    /// Bank name.
    BankName,
    /// Account holder name.
    BankHolder,
    /// Giro slip number (expense only).
    GiroNumber,
    /// Selected receiving bank account (revenue only).
    BankAccount,
}

impl BankField {
    /// Request field name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankNumber => "bank_number",
            Self::BankName => "bank_name",
            Self::BankHolder => "bank_holder",
            Self::GiroNumber => "giro_number",
            Self::BankAccount => "bank_account_id",
        }
    }
}

/// Required and forbidden fields for one (kind, method) combination.
#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    /// Fields that must be present and non-blank.
    pub required: &'static [BankField],
    /// Fields that must be absent or blank.
    pub forbidden: &'static [BankField],
}

/// Looks up the field rules for a payment kind and method.
#[must_use]
pub fn rules_for(kind: PaymentKind, method: PaymentMethod) -> FieldRules {
    match (kind, method) {
        (PaymentKind::Expense, PaymentMethod::Cash) => FieldRules {
            required: &[],
            forbidden: &[BankNumber, BankName, BankHolder, GiroNumber, BankAccount],
        },
        (PaymentKind::Expense, PaymentMethod::DebitCard | PaymentMethod::CreditCard) => {
            FieldRules {
                required: &[BankNumber, BankName, BankHolder],
                forbidden: &[GiroNumber, BankAccount],
            }
        }
        (PaymentKind::Expense, PaymentMethod::Giro) => FieldRules {
            required: &[GiroNumber],
            forbidden: &[BankNumber, BankName, BankHolder, BankAccount],
        },
        (PaymentKind::Revenue, PaymentMethod::Cash) => FieldRules {
            required: &[],
            forbidden: &[BankNumber, BankName, BankHolder, GiroNumber, BankAccount],
        },
        (PaymentKind::Revenue, PaymentMethod::DebitCard) => FieldRules {
            required: &[BankAccount, BankName, BankHolder, BankNumber],
            forbidden: &[GiroNumber],
        },
        (PaymentKind::Revenue, PaymentMethod::CreditCard) => FieldRules {
            required: &[BankAccount, BankName, BankHolder],
            forbidden: &[GiroNumber],
        },
        (PaymentKind::Revenue, PaymentMethod::Giro) => FieldRules {
            required: &[BankNumber],
            forbidden: &[BankName, GiroNumber, BankAccount],
        },
    }
}

/// Bank fields as submitted by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankFieldsInput {
    /// Account or card number.
    pub bank_number: Option<String>,
    /// Bank name.
    pub bank_name: Option<String>,
    /// Account holder name.
    pub bank_holder: Option<String>,
    /// Giro slip number.
    pub giro_number: Option<String>,
    /// Selected receiving bank account.
    pub bank_account_id: Option<Uuid>,
}

impl BankFieldsInput {
    fn is_present(&self, field: BankField) -> bool {
        fn filled(value: Option<&String>) -> bool {
            value.is_some_and(|v| !v.trim().is_empty())
        }

        match field {
            BankField::BankNumber => filled(self.bank_number.as_ref()),
            BankField::BankName => filled(self.bank_name.as_ref()),
            BankField::BankHolder => filled(self.bank_holder.as_ref()),
            BankField::GiroNumber => filled(self.giro_number.as_ref()),
            BankField::BankAccount => self.bank_account_id.is_some(),
        }
    }
}

/// Bank details in their stored shape.
///
/// Giro numbers share the bank-number column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankDetails {
    /// Account, card or giro number.
    pub bank_number: Option<String>,
    /// Bank name.
    pub bank_name: Option<String>,
    /// Account holder name.
    pub bank_holder: Option<String>,
    /// Selected receiving bank account.
    pub bank_account_id: Option<Uuid>,
}

/// Checks method/field agreement and that the amount is storable.
///
/// All violations are collected, not just the first.
#[must_use]
pub fn check_fields(
    kind: PaymentKind,
    method: PaymentMethod,
    fields: &BankFieldsInput,
    amount: Decimal,
) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if let Some(violation) = check_amount(amount) {
        violations.push(violation);
    }

    let rules = rules_for(kind, method);
    for field in rules.required {
        if !fields.is_present(*field) {
            violations.push(FieldViolation::new(
                field.as_str(),
                format!("is required for {method} payments"),
            ));
        }
    }
    for field in rules.forbidden {
        if fields.is_present(*field) {
            violations.push(FieldViolation::new(
                field.as_str(),
                format!("must be empty for {method} payments"),
            ));
        }
    }

    violations
}

/// Rejects amounts that are not positive or would be rounded or overflow
/// when stored.
fn check_amount(amount: Decimal) -> Option<FieldViolation> {
    let max = Decimal::from(10_u64.pow(AMOUNT_INTEGER_DIGITS));

    if amount <= Decimal::ZERO {
        Some(FieldViolation::new("amount", "must be greater than zero"))
    } else if amount.normalize().scale() > AMOUNT_SCALE {
        Some(FieldViolation::new(
            "amount",
            format!("must have at most {AMOUNT_SCALE} decimal places"),
        ))
    } else if amount >= max {
        Some(FieldViolation::new(
            "amount",
            format!("must have at most {AMOUNT_INTEGER_DIGITS} integer digits"),
        ))
    } else {
        None
    }
}

/// Validates the fields and converts them to their stored shape.
pub fn normalize_fields(
    kind: PaymentKind,
    method: PaymentMethod,
    fields: &BankFieldsInput,
    amount: Decimal,
) -> Result<BankDetails, PaymentError> {
    let violations = check_fields(kind, method, fields, amount);
    if !violations.is_empty() {
        return Err(PaymentError::InvalidPaymentFields(violations));
    }

    let clean = |value: &Option<String>| {
        value
            .as_ref()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let details = match (kind, method) {
        (_, PaymentMethod::Cash) => BankDetails::default(),
        (PaymentKind::Expense, PaymentMethod::Giro) => BankDetails {
            bank_number: clean(&fields.giro_number),
            ..BankDetails::default()
        },
        _ => BankDetails {
            bank_number: clean(&fields.bank_number),
            bank_name: clean(&fields.bank_name),
            bank_holder: clean(&fields.bank_holder),
            bank_account_id: fields.bank_account_id,
        },
    };

    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn card_fields() -> BankFieldsInput {
        BankFieldsInput {
            bank_number: Some("1234567890".to_string()),
            bank_name: Some("BCA".to_string()),
            bank_holder: Some("PT Sumber Makmur".to_string()),
            giro_number: None,
            bank_account_id: None,
        }
    }

    fn fields_of(violations: &[FieldViolation]) -> Vec<&str> {
        violations.iter().map(|v| v.field.as_str()).collect()
    }

    #[rstest]
    #[case(PaymentKind::Expense)]
    #[case(PaymentKind::Revenue)]
    fn test_cash_without_bank_fields_is_valid(#[case] kind: PaymentKind) {
        let violations = check_fields(
            kind,
            PaymentMethod::Cash,
            &BankFieldsInput::default(),
            dec!(100),
        );
        assert!(violations.is_empty());
    }

    #[rstest]
    #[case(PaymentKind::Expense)]
    #[case(PaymentKind::Revenue)]
    fn test_cash_rejects_every_bank_field(#[case] kind: PaymentKind) {
        let mut fields = card_fields();
        fields.giro_number = Some("G-1".to_string());
        fields.bank_account_id = Some(Uuid::new_v4());

        let violations = check_fields(kind, PaymentMethod::Cash, &fields, dec!(100));
        assert_eq!(
            fields_of(&violations),
            vec![
                "bank_number",
                "bank_name",
                "bank_holder",
                "giro_number",
                "bank_account_id"
            ]
        );
    }

    #[rstest]
    #[case(PaymentMethod::DebitCard)]
    #[case(PaymentMethod::CreditCard)]
    fn test_expense_card_requires_bank_details(#[case] method: PaymentMethod) {
        assert!(check_fields(PaymentKind::Expense, method, &card_fields(), dec!(1)).is_empty());

        let violations = check_fields(
            PaymentKind::Expense,
            method,
            &BankFieldsInput::default(),
            dec!(1),
        );
        assert_eq!(
            fields_of(&violations),
            vec!["bank_number", "bank_name", "bank_holder"]
        );
    }

    #[test]
    fn test_expense_card_rejects_giro_number() {
        let mut fields = card_fields();
        fields.giro_number = Some("G-77".to_string());

        let violations = check_fields(
            PaymentKind::Expense,
            PaymentMethod::DebitCard,
            &fields,
            dec!(1),
        );
        assert_eq!(fields_of(&violations), vec!["giro_number"]);
    }

    #[test]
    fn test_expense_giro_with_bank_name_rejected() {
        let fields = BankFieldsInput {
            giro_number: Some("G-1001".to_string()),
            bank_name: Some("Mandiri".to_string()),
            ..BankFieldsInput::default()
        };

        let err = normalize_fields(PaymentKind::Expense, PaymentMethod::Giro, &fields, dec!(10))
            .unwrap_err();
        match err {
            PaymentError::InvalidPaymentFields(violations) => {
                assert_eq!(fields_of(&violations), vec!["bank_name"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_expense_giro_number_stored_in_bank_number() {
        let fields = BankFieldsInput {
            giro_number: Some("  G-1001 ".to_string()),
            ..BankFieldsInput::default()
        };

        let details =
            normalize_fields(PaymentKind::Expense, PaymentMethod::Giro, &fields, dec!(10))
                .unwrap();
        assert_eq!(details.bank_number.as_deref(), Some("G-1001"));
        assert_eq!(details.bank_name, None);
        assert_eq!(details.bank_holder, None);
    }

    #[test]
    fn test_revenue_debit_card_requires_account_and_number() {
        let mut fields = card_fields();
        fields.bank_number = None;

        let violations = check_fields(
            PaymentKind::Revenue,
            PaymentMethod::DebitCard,
            &fields,
            dec!(1),
        );
        assert_eq!(fields_of(&violations), vec!["bank_account_id", "bank_number"]);
    }

    #[test]
    fn test_revenue_credit_card_bank_number_optional() {
        let mut fields = card_fields();
        fields.bank_number = None;
        fields.bank_account_id = Some(Uuid::new_v4());

        let violations = check_fields(
            PaymentKind::Revenue,
            PaymentMethod::CreditCard,
            &fields,
            dec!(1),
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn test_revenue_giro_requires_number_forbids_name() {
        let fields = BankFieldsInput {
            bank_name: Some("BNI".to_string()),
            ..BankFieldsInput::default()
        };

        let violations = check_fields(
            PaymentKind::Revenue,
            PaymentMethod::Giro,
            &fields,
            dec!(1),
        );
        assert_eq!(fields_of(&violations), vec!["bank_number", "bank_name"]);
    }

    #[test]
    fn test_expense_rejects_bank_account_reference() {
        let mut fields = card_fields();
        fields.bank_account_id = Some(Uuid::new_v4());

        let violations = check_fields(
            PaymentKind::Expense,
            PaymentMethod::CreditCard,
            &fields,
            dec!(1),
        );
        assert_eq!(fields_of(&violations), vec!["bank_account_id"]);
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-5))]
    fn test_non_positive_amount_rejected(#[case] amount: Decimal) {
        let violations = check_fields(
            PaymentKind::Expense,
            PaymentMethod::Cash,
            &BankFieldsInput::default(),
            amount,
        );
        assert_eq!(fields_of(&violations), vec!["amount"]);
    }

    #[rstest]
    #[case::too_many_decimals(dec!(10.12345))]
    #[case::below_smallest_unit(dec!(0.00001))]
    #[case::too_many_digits(dec!(1000000000000000))]
    #[case::largest_decimal(Decimal::MAX)]
    fn test_unstorable_amount_rejected(#[case] amount: Decimal) {
        let violations = check_fields(
            PaymentKind::Revenue,
            PaymentMethod::Cash,
            &BankFieldsInput::default(),
            amount,
        );
        assert_eq!(fields_of(&violations), vec!["amount"]);
    }

    #[rstest]
    #[case(dec!(0.0001))]
    #[case(dec!(10.10000))]
    #[case(dec!(999999999999999.9999))]
    fn test_storable_amount_accepted(#[case] amount: Decimal) {
        assert!(
            check_fields(
                PaymentKind::Revenue,
                PaymentMethod::Cash,
                &BankFieldsInput::default(),
                amount,
            )
            .is_empty()
        );
    }

    #[test]
    fn test_blank_strings_count_as_absent() {
        let fields = BankFieldsInput {
            bank_name: Some("   ".to_string()),
            giro_number: Some("G-1".to_string()),
            ..BankFieldsInput::default()
        };

        assert!(
            check_fields(PaymentKind::Expense, PaymentMethod::Giro, &fields, dec!(1)).is_empty()
        );
    }

    #[test]
    fn test_multiple_violations_reported_together() {
        let fields = BankFieldsInput {
            bank_name: Some("BCA".to_string()),
            bank_holder: Some("Someone".to_string()),
            ..BankFieldsInput::default()
        };

        let violations = check_fields(
            PaymentKind::Expense,
            PaymentMethod::Giro,
            &fields,
            dec!(0),
        );
        assert_eq!(
            fields_of(&violations),
            vec!["amount", "giro_number", "bank_name", "bank_holder"]
        );
    }
}
