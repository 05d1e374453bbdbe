// src/common/validation.rs

use rust_decimal::Decimal;
use validator::ValidationError;

// Colunas NUMERIC(12, 3) no banco
pub const MAX_DECIMAL_SCALE: u32 = 3;

// ---
// Validações customizadas para Decimal (o validator não tem range para Decimal)
// ---
pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("Cannot be negative.".into());
        return Err(err);
    }
    validate_scale(val)
}

pub fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.add_param("exclusive_min".into(), &0.0);
        err.message = Some("Must be greater than 0.".into());
        return Err(err);
    }
    validate_scale(val)
}

// 0.1000 conta como 0.1
fn validate_scale(val: &Decimal) -> Result<(), ValidationError> {
    if val.normalize().scale() > MAX_DECIMAL_SCALE {
        let mut err = ValidationError::new("scale");
        err.add_param("max".into(), &MAX_DECIMAL_SCALE);
        err.message = Some("At most 3 decimal places.".into());
        return Err(err);
    }
    Ok(())
}

// Texto obrigatório: só espaços não conta
pub fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("This field is required.".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_is_not_positive_but_not_negative() {
        assert!(validate_positive(&dec!(0)).is_err());
        assert!(validate_not_negative(&dec!(0)).is_ok());
    }

    #[test]
    fn negative_values_fail_both() {
        assert!(validate_positive(&dec!(-1.5)).is_err());
        assert!(validate_not_negative(&dec!(-0.01)).is_err());
    }

    #[test]
    fn positive_values_pass_both() {
        assert!(validate_positive(&dec!(8)).is_ok());
        assert!(validate_not_negative(&dec!(0.25)).is_ok());
    }

    #[test]
    fn more_than_three_decimals_is_rejected() {
        let err = validate_positive(&dec!(0.0001)).unwrap_err();
        assert_eq!(err.code, "scale");
        assert!(validate_not_negative(&dec!(1.2345)).is_err());
        assert!(validate_positive(&dec!(0.001)).is_ok());
        // zeros à direita não contam
        assert!(validate_positive(&dec!(2.5000)).is_ok());
    }

    #[test]
    fn whitespace_is_blank() {
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("\t\n").is_err());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" Vanilla ").is_ok());
    }
}
