//! Two linked amount inputs whose values always add up to a total.
//!
//! The user edits one side (the independent field) by typing or by dragging a
//! slider; the other side is derived as `total - independent`. The derived side is
//! allowed to go negative so callers can show an over-allocation and disable their
//! submit action.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::{parse_or_zero, Amount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Field {
    #[default]
    Left,
    Right,
}

impl Field {
    pub fn other(&self) -> Field {
        match self {
            Field::Left => Field::Right,
            Field::Right => Field::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InputType {
    #[default]
    Text,
    Slider,
}

/// What the user last touched and what they entered there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InputState {
    pub independent_field: Field,
    pub typed_value: String,
    pub input_type: InputType,
}

impl InputState {
    pub fn typed(field: Field, value: impl Into<String>) -> Self {
        Self {
            independent_field: field,
            typed_value: value.into(),
            input_type: InputType::Text,
        }
    }

    pub fn slid(field: Field, value: impl Into<String>) -> Self {
        Self {
            independent_field: field,
            typed_value: value.into(),
            input_type: InputType::Slider,
        }
    }

    pub fn dependent_field(&self) -> Field {
        self.independent_field.other()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn compute(&self, total: Amount) -> ParsedAmounts {
        compute(self.independent_field, &self.typed_value, total)
    }
}

/// Both sides of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedAmounts {
    pub left: Amount,
    pub right: Amount,
}

impl ParsedAmounts {
    pub fn get(&self, field: Field) -> Amount {
        match field {
            Field::Left => self.left,
            Field::Right => self.right,
        }
    }

    pub fn sum(&self) -> Decimal {
        self.left.value.saturating_add(self.right.value)
    }
}

/// Derive both fields from the user's input on `independent_field`.
///
/// Never fails: unparsable input reads as zero.
pub fn compute(independent_field: Field, typed_value: &str, total: Amount) -> ParsedAmounts {
    let independent = Amount::new(parse_or_zero(typed_value), total.currency);
    let dependent = total.saturating_sub(independent.value);

    match independent_field {
        Field::Left => ParsedAmounts {
            left: independent,
            right: dependent,
        },
        Field::Right => ParsedAmounts {
            left: dependent,
            right: independent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyKey;
    use rust_decimal_macros::dec;

    fn icx(value: Decimal) -> Amount {
        Amount::new(value, CurrencyKey::Icx)
    }

    #[test]
    fn test_left_independent() {
        let parsed = compute(Field::Left, "10", icx(dec!(15)));
        assert_eq!(parsed.left.value, dec!(10));
        assert_eq!(parsed.right.value, dec!(5));
        assert_eq!(parsed.right.value.to_string(), "5");
    }

    #[test]
    fn test_right_independent() {
        let parsed = compute(Field::Right, "4.5", icx(dec!(15)));
        assert_eq!(parsed.right.value, dec!(4.5));
        assert_eq!(parsed.left.value, dec!(10.5));
    }

    #[test]
    fn test_sum_is_exact_for_many_inputs() {
        let totals = [dec!(0), dec!(15), dec!(0.3), dec!(123456789.123456789)];
        let inputs = ["0", "0.1", "0.2", "7", "99999.999999", "1e2", "", "x"];
        for total in totals {
            for input in inputs {
                for field in [Field::Left, Field::Right] {
                    let parsed = compute(field, input, icx(total));
                    assert_eq!(parsed.sum(), total, "input {:?} field {:?}", input, field);
                }
            }
        }
    }

    #[test]
    fn test_non_numeric_is_zero() {
        for input in ["", "abc", "1.2.3", "--1", " "] {
            let parsed = compute(Field::Left, input, icx(dec!(8)));
            assert_eq!(parsed.left.value, Decimal::ZERO);
            assert_eq!(parsed.right.value, dec!(8));
        }
    }

    #[test]
    fn test_dependent_can_go_negative() {
        let parsed = compute(Field::Left, "20", icx(dec!(15)));
        assert_eq!(parsed.right.value, dec!(-5));
        assert!(parsed.right.is_negative());
    }

    #[test]
    fn test_currency_follows_total() {
        let parsed = compute(Field::Left, "1", Amount::new(dec!(3), CurrencyKey::Sicx));
        assert_eq!(parsed.left.currency, CurrencyKey::Sicx);
        assert_eq!(parsed.right.currency, CurrencyKey::Sicx);
    }

    #[test]
    fn test_input_state_reset() {
        let mut state = InputState::slid(Field::Right, "3");
        assert_eq!(state.dependent_field(), Field::Left);
        state.reset();
        assert_eq!(state, InputState::default());
        assert_eq!(state.independent_field, Field::Left);
        assert_eq!(state.typed_value, "");
        assert_eq!(state.input_type, InputType::Text);
    }
}
