//! Big-endian wire encoding for coerced argument [`Value`]s, used to
//! serialize a dispatched command into the payload bytes the uplinker
//! frames and writes.

use crate::{template::CommandTemplate, value::Value};

/// Encode one value, big-endian, with no type tag (the type is already
/// known from the template the caller coerced against).
#[must_use]
pub fn encode_value(value: &Value) -> Vec<u8> {
    match value {
        Value::I8(v) => v.to_be_bytes().to_vec(),
        Value::I16(v) => v.to_be_bytes().to_vec(),
        Value::I32(v) => v.to_be_bytes().to_vec(),
        Value::I64(v) => v.to_be_bytes().to_vec(),
        Value::U8(v) => v.to_be_bytes().to_vec(),
        Value::U16(v) => v.to_be_bytes().to_vec(),
        Value::U32(v) => v.to_be_bytes().to_vec(),
        Value::U64(v) => v.to_be_bytes().to_vec(),
        Value::F32(v) => v.to_be_bytes().to_vec(),
        Value::F64(v) => v.to_be_bytes().to_vec(),
        Value::Bool(v) => vec![u8::from(*v)],
        Value::Str(s) => {
            let mut out = (s.len() as u16).to_be_bytes().to_vec();
            out.extend_from_slice(s.as_bytes());
            out
        },
        Value::Enum { repr, .. } => repr.to_be_bytes().to_vec(),
        Value::Array(values) => values.iter().flat_map(|v| encode_value(v)).collect(),
        Value::Struct(members) => members.iter().flat_map(|(_, v)| encode_value(v)).collect(),
    }
}

/// Encode a fully coerced command invocation: the command's opcode
/// followed by each argument value in declared order.
///
/// Does not prepend the payload descriptor (`gds_proto::descriptor`); the
/// caller adds that, since this crate does not depend on `gds-proto`.
#[must_use]
pub fn encode_command(template: &CommandTemplate, values: &[Value]) -> Vec<u8> {
    let mut out = template.opcode.to_be_bytes().to_vec();
    for value in values {
        out.extend_from_slice(&encode_value(value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ArgSpec;
    use crate::value::ValueType;

    #[test]
    fn encodes_opcode_then_each_argument_in_order() {
        let template = CommandTemplate {
            opcode: 0x0000_002A,
            name: "cdh.SetMode".to_string(),
            args: vec![ArgSpec { name: "mode".to_string(), description: String::new(), ty: ValueType::U8 }],
        };
        let encoded = encode_command(&template, &[Value::U8(3)]);
        assert_eq!(encoded, vec![0x00, 0x00, 0x00, 0x2A, 0x03]);
    }

    #[test]
    fn string_argument_is_length_prefixed() {
        let encoded = encode_value(&Value::Str("hi".to_string()));
        assert_eq!(encoded, vec![0x00, 0x02, b'h', b'i']);
    }
}
