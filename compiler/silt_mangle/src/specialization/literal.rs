use num::{BigInt, One, Zero};
use silt_sil::{InstructionKind, StringEncoding};

use crate::Mangler;

/// Maximum length of a string literal, in bytes, which can be propagated
/// into a specialization.
pub const MAX_STRING_LITERAL_LEN: usize = 32;

/// Indicator for an argument which was replaced by a constant.
pub const CONSTANT_PROP_INDICATOR: &str = "cp";

/// Literal value which is propagated into a specialized function, in place
/// of one of its arguments.
#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub enum LiteralPayload {
    FunctionReference(String),
    GlobalReference(String),
    IntegerLiteral(BigInt),

    /// Raw bit pattern of a floating-point literal, reinterpreted as a signed
    /// integer. Keeps signed zeroes and NaN payloads distinct.
    FloatLiteral(BigInt),

    StringLiteral { encoding: StringEncoding, value: String },
}

impl LiteralPayload {
    /// Creates a payload from the given literal instruction.
    ///
    /// # Panics
    ///
    /// Panics if the instruction is not a literal.
    pub fn from_instruction(kind: &InstructionKind) -> Self {
        match kind {
            InstructionKind::FunctionRef { function } => Self::FunctionReference(function.clone()),
            InstructionKind::GlobalAddr { global } => Self::GlobalReference(global.clone()),
            InstructionKind::IntegerLiteral { value } => Self::IntegerLiteral(value.clone()),
            InstructionKind::FloatLiteral { bits, width } => Self::FloatLiteral(signed_float_bits(*bits, *width)),
            InstructionKind::StringLiteral { value, encoding } => Self::StringLiteral {
                encoding: *encoding,
                value: value.clone(),
            },
            InstructionKind::PartialApply { .. } | InstructionKind::Apply { .. } => {
                panic!("bug!: unknown literal: {kind}")
            }
        }
    }

    /// Mangles the payload as a constant propagated argument.
    ///
    /// # Panics
    ///
    /// Panics if the payload is a string literal longer than
    /// [`MAX_STRING_LITERAL_LEN`] bytes.
    pub fn mangle(&self, mangler: &mut Mangler) {
        mangler.push_str(CONSTANT_PROP_INDICATOR);

        match self {
            Self::FunctionReference(name) => {
                mangler.push_str("fr");
                mangler.mangle_identifier(name);
            }
            Self::GlobalReference(name) => {
                mangler.push_str("g");
                mangler.mangle_identifier(name);
            }
            Self::IntegerLiteral(value) => {
                mangler.push_str("i");
                mangler.push_display(value);
            }
            Self::FloatLiteral(bits) => {
                mangler.push_str("fl");
                mangler.push_display(bits);
            }
            Self::StringLiteral { encoding, value } => {
                assert!(
                    value.len() <= MAX_STRING_LITERAL_LEN,
                    "cannot mangle string literal of length {} (max {MAX_STRING_LITERAL_LEN})",
                    value.len()
                );

                mangler.push_str("se");
                mangler.push_display(*encoding as u8);
                mangler.push('v');
                mangler.mangle_identifier(&format!("u{value}"));
            }
        }
    }
}

/// Interprets the lower `width` bits of `bits` as a two's-complement signed
/// integer.
///
/// # Panics
///
/// Panics if `width` is wider than 128 bits.
pub fn signed_float_bits(bits: u128, width: u8) -> BigInt {
    assert!(width <= 128, "cannot mangle float literal of width {width} (max 128)");

    if width == 0 {
        return BigInt::zero();
    }

    let bits = if width == 128 {
        bits
    } else {
        bits & ((1u128 << width) - 1)
    };

    let value = BigInt::from(bits);

    if (bits >> (width - 1)) & 1 == 1 {
        value - (BigInt::one() << usize::from(width))
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use silt_sil::{Function, FunctionBuilder, Signature, Type};

    use super::*;

    fn mangle(payload: &LiteralPayload) -> String {
        let mut mangler = Mangler::new();
        payload.mangle(&mut mangler);
        mangler.finalize()
    }

    fn string(value: &str) -> LiteralPayload {
        LiteralPayload::StringLiteral {
            encoding: StringEncoding::Utf8,
            value: value.to_string(),
        }
    }

    #[test]
    fn references() {
        assert_snapshot!(mangle(&LiteralPayload::FunctionReference("foo".into())), @"cpfr3foo");
        assert_snapshot!(mangle(&LiteralPayload::GlobalReference("counter".into())), @"cpg7counter");
    }

    #[test]
    fn integers() {
        assert_snapshot!(mangle(&LiteralPayload::IntegerLiteral(BigInt::from(42))), @"cpi42");
        assert_snapshot!(mangle(&LiteralPayload::IntegerLiteral(BigInt::from(-7))), @"cpi-7");
    }

    #[test]
    fn floats_keep_bit_pattern() {
        let positive = LiteralPayload::from_instruction(&InstructionKind::float64(0.0));
        let negative = LiteralPayload::from_instruction(&InstructionKind::float64(-0.0));

        assert_snapshot!(mangle(&positive), @"cpfl0");
        assert_snapshot!(mangle(&negative), @"cpfl-9223372036854775808");
        assert_ne!(mangle(&positive), mangle(&negative));
    }

    #[test]
    fn float32_bits() {
        let one = LiteralPayload::from_instruction(&InstructionKind::float32(1.0));
        let negative_zero = LiteralPayload::from_instruction(&InstructionKind::float32(-0.0));

        assert_snapshot!(mangle(&one), @"cpfl1065353216");
        assert_snapshot!(mangle(&negative_zero), @"cpfl-2147483648");
    }

    #[test]
    fn strings() {
        assert_snapshot!(mangle(&string("hi")), @"cpse0v3uhi");
        assert_snapshot!(
            mangle(&LiteralPayload::StringLiteral {
                encoding: StringEncoding::Utf16,
                value: "hi".into()
            }),
            @"cpse1v3uhi"
        );
    }

    #[test]
    fn string_of_max_length() {
        let value = "a".repeat(MAX_STRING_LITERAL_LEN);

        assert_eq!(mangle(&string(&value)), format!("cpse0v33u{value}"));
    }

    #[test]
    #[should_panic(expected = "cannot mangle string literal of length 33")]
    fn string_exceeding_max_length() {
        let value = "a".repeat(MAX_STRING_LITERAL_LEN + 1);

        let _ = mangle(&string(&value));
    }

    #[test]
    fn from_literal_instructions() {
        let payload = LiteralPayload::from_instruction(&InstructionKind::IntegerLiteral { value: BigInt::from(3) });
        assert_eq!(payload, LiteralPayload::IntegerLiteral(BigInt::from(3)));

        let payload = LiteralPayload::from_instruction(&InstructionKind::FunctionRef {
            function: "callee".into(),
        });
        assert_eq!(payload, LiteralPayload::FunctionReference("callee".into()));
    }

    #[test]
    #[should_panic(expected = "unknown literal")]
    fn from_non_literal_instruction() {
        let callee = Function::declaration("callee", Signature::new(vec![], Type::unit()));
        let mut func = Function::with_body("caller", Signature::new(vec![], Type::unit()));

        let mut builder = FunctionBuilder::new(&mut func);
        let fref = builder.function_ref(&callee);
        let call = builder.apply(fref, Vec::new(), Type::unit());

        let inst = func.defining_instruction(call).unwrap();
        let _ = LiteralPayload::from_instruction(&inst.kind);
    }

    #[test]
    fn sign_extension() {
        assert_eq!(signed_float_bits(0xFF, 8), BigInt::from(-1));
        assert_eq!(signed_float_bits(0x7F, 8), BigInt::from(127));
        assert_eq!(signed_float_bits(u128::from(u64::MAX), 64), BigInt::from(-1));
        assert_eq!(signed_float_bits(u128::MAX, 128), BigInt::from(-1));
    }

    #[test]
    fn float80_sign_is_top_bit() {
        let payload = LiteralPayload::from_instruction(&InstructionKind::FloatLiteral {
            bits: 1 << 63,
            width: 80,
        });

        assert_eq!(payload, LiteralPayload::FloatLiteral(BigInt::from(1u64 << 63)));
        assert_snapshot!(mangle(&payload), @"cpfl9223372036854775808");

        let negative = LiteralPayload::from_instruction(&InstructionKind::FloatLiteral {
            bits: 1 << 79,
            width: 80,
        });

        assert_snapshot!(mangle(&negative), @"cpfl-604462909807314587353088");
    }

    #[test]
    #[should_panic(expected = "cannot mangle float literal of width 129")]
    fn float_wider_than_128_bits() {
        let _ = signed_float_bits(0, 129);
    }
}
