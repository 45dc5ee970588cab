//! String-to-[`Value`] coercion for the command dispatch contract.
//!
//! Per §6: the caller supplies arguments as strings; each is coerced to its
//! declared type, failures are aggregated (never a partial dispatch), and
//! array/struct types are never accepted from a single flat string — a
//! composite argument can only arrive as a failure here, since the dispatch
//! contract has no sub-field syntax for it.

use crate::{
    error::DictionaryError,
    template::ArgSpec,
    value::{IntRepr, Value, ValueType},
};

/// Coerce `args` (positional strings) against `specs` (the template's
/// ordered argument list), returning one [`Value`] per spec in order.
///
/// # Errors
///
/// Returns [`DictionaryError::ArgumentCountMismatch`] if the lengths
/// differ, or [`DictionaryError::ArgumentCoercion`] carrying one message
/// per failing argument if any fail to coerce.
pub fn coerce_args(specs: &[ArgSpec], args: &[String]) -> Result<Vec<Value>, DictionaryError> {
    if specs.len() != args.len() {
        return Err(DictionaryError::ArgumentCountMismatch { expected: specs.len(), actual: args.len() });
    }

    let mut values = Vec::with_capacity(specs.len());
    let mut failures = Vec::new();

    for (spec, raw) in specs.iter().zip(args) {
        match coerce_one(&spec.ty, raw) {
            Ok(value) => values.push(value),
            Err(reason) => failures.push(format!("{}: {reason}", spec.name)),
        }
    }

    if !failures.is_empty() {
        return Err(DictionaryError::ArgumentCoercion(failures));
    }

    Ok(values)
}

fn coerce_one(ty: &ValueType, raw: &str) -> Result<Value, String> {
    match ty {
        ValueType::I8 => raw.parse().map(Value::I8).map_err(|e| e.to_string()),
        ValueType::I16 => raw.parse().map(Value::I16).map_err(|e| e.to_string()),
        ValueType::I32 => raw.parse().map(Value::I32).map_err(|e| e.to_string()),
        ValueType::I64 => raw.parse().map(Value::I64).map_err(|e| e.to_string()),
        ValueType::U8 => raw.parse().map(Value::U8).map_err(|e| e.to_string()),
        ValueType::U16 => raw.parse().map(Value::U16).map_err(|e| e.to_string()),
        ValueType::U32 => raw.parse().map(Value::U32).map_err(|e| e.to_string()),
        ValueType::U64 => raw.parse().map(Value::U64).map_err(|e| e.to_string()),
        ValueType::F32 => raw.parse().map(Value::F32).map_err(|e| e.to_string()),
        ValueType::F64 => raw.parse().map(Value::F64).map_err(|e| e.to_string()),
        ValueType::Bool => coerce_bool(raw),
        ValueType::Str { max_len } => coerce_str(raw, *max_len),
        ValueType::Enum { repr, variants } => coerce_enum(raw, *repr, variants),
        ValueType::Array { .. } | ValueType::Struct { .. } => {
            Err("composite types cannot be coerced from a single argument string".to_string())
        },
    }
}

fn coerce_bool(raw: &str) -> Result<Value, String> {
    match raw {
        "true" | "1" => Ok(Value::Bool(true)),
        "false" | "0" => Ok(Value::Bool(false)),
        other => Err(format!("not a boolean: {other}")),
    }
}

fn coerce_str(raw: &str, max_len: usize) -> Result<Value, String> {
    if raw.len() > max_len {
        return Err(format!("string of {} bytes exceeds max length {max_len}", raw.len()));
    }
    Ok(Value::Str(raw.to_string()))
}

fn coerce_enum(raw: &str, repr: IntRepr, variants: &[(String, i64)]) -> Result<Value, String> {
    if let Some((name, value)) = variants.iter().find(|(name, _)| name == raw) {
        return Ok(Value::Enum { variant: name.clone(), repr: *value });
    }

    if let Ok(as_int) = raw.parse::<i64>()
        && in_repr_range(as_int, repr)
        && let Some((name, value)) = variants.iter().find(|(_, value)| *value == as_int)
    {
        return Ok(Value::Enum { variant: name.clone(), repr: *value });
    }

    Err(format!("not a recognized enum variant or representation value: {raw}"))
}

fn in_repr_range(value: i64, repr: IntRepr) -> bool {
    match repr {
        IntRepr::I8 => i64::from(i8::MIN) <= value && value <= i64::from(i8::MAX),
        IntRepr::I16 => i64::from(i16::MIN) <= value && value <= i64::from(i16::MAX),
        IntRepr::I32 => i64::from(i32::MIN) <= value && value <= i64::from(i32::MAX),
        IntRepr::I64 => true,
        IntRepr::U8 => (0..=i64::from(u8::MAX)).contains(&value),
        IntRepr::U16 => (0..=i64::from(u16::MAX)).contains(&value),
        IntRepr::U32 => (0..=i64::from(u32::MAX)).contains(&value),
        IntRepr::U64 => value >= 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, ty: ValueType) -> ArgSpec {
        ArgSpec { name: name.to_string(), description: String::new(), ty }
    }

    #[test]
    fn coerces_every_scalar_type() {
        let specs = vec![
            spec("a", ValueType::U8),
            spec("b", ValueType::F64),
            spec("c", ValueType::Bool),
            spec("d", ValueType::Str { max_len: 8 }),
        ];
        let args = vec!["7".to_string(), "3.5".to_string(), "true".to_string(), "ok".to_string()];
        let values = coerce_args(&specs, &args).unwrap();
        assert_eq!(values[0], Value::U8(7));
        assert_eq!(values[1], Value::F64(3.5));
        assert_eq!(values[2], Value::Bool(true));
        assert_eq!(values[3], Value::Str("ok".to_string()));
    }

    #[test]
    fn string_over_max_len_is_rejected() {
        let specs = vec![spec("s", ValueType::Str { max_len: 2 })];
        let err = coerce_args(&specs, &["abc".to_string()]).unwrap_err();
        assert!(matches!(err, DictionaryError::ArgumentCoercion(_)));
    }

    #[test]
    fn enum_accepts_name_or_representation() {
        let ty = ValueType::Enum {
            repr: IntRepr::U8,
            variants: vec![("OFF".to_string(), 0), ("ON".to_string(), 1)],
        };
        let specs = vec![spec("mode", ty)];
        let by_name = coerce_args(&specs, &["ON".to_string()]).unwrap();
        let by_repr = coerce_args(&specs, &["1".to_string()]).unwrap();
        assert_eq!(by_name[0], Value::Enum { variant: "ON".to_string(), repr: 1 });
        assert_eq!(by_repr[0], Value::Enum { variant: "ON".to_string(), repr: 1 });
    }

    #[test]
    fn unrecognized_enum_value_is_rejected() {
        let ty = ValueType::Enum { repr: IntRepr::U8, variants: vec![("ON".to_string(), 1)] };
        let specs = vec![spec("mode", ty)];
        assert!(coerce_args(&specs, &["OFF".to_string()]).is_err());
    }

    #[test]
    fn composite_types_always_fail_coercion() {
        let ty = ValueType::Array { element: Box::new(ValueType::U8), len: 3 };
        let specs = vec![spec("arr", ty)];
        assert!(coerce_args(&specs, &["1,2,3".to_string()]).is_err());
    }

    #[test]
    fn multiple_bad_arguments_are_aggregated_not_short_circuited() {
        let specs = vec![spec("a", ValueType::U8), spec("b", ValueType::Bool)];
        let args = vec!["not-a-number".to_string(), "maybe".to_string()];
        match coerce_args(&specs, &args).unwrap_err() {
            DictionaryError::ArgumentCoercion(failures) => assert_eq!(failures.len(), 2),
            other => panic!("expected ArgumentCoercion, got {other:?}"),
        }
    }

    #[test]
    fn argument_count_mismatch_is_reported() {
        let specs = vec![spec("a", ValueType::U8)];
        let err = coerce_args(&specs, &[]).unwrap_err();
        assert_eq!(err, DictionaryError::ArgumentCountMismatch { expected: 1, actual: 0 });
    }
}
