//! Command dispatch contract (§6): name + string arguments in, a framed
//! command payload out, ready to hand to a ground client's `send`.
//!
//! Lookup failures and coercion failures are both returned to the caller as
//! structured errors; the uplinker is never invoked for either.

use bytes::Bytes;
use gds_dictionary::{Dictionary, DictionaryError, coerce_args, wire};
use gds_proto::descriptor::Descriptor;

/// Looks up, coerces, and serializes command-dispatch requests against one
/// [`Dictionary`].
pub struct Dispatcher<'d> {
    dictionary: &'d Dictionary,
}

impl<'d> Dispatcher<'d> {
    /// Build a dispatcher over `dictionary`.
    #[must_use]
    pub fn new(dictionary: &'d Dictionary) -> Self {
        Self { dictionary }
    }

    /// Look up `name`, coerce `args` against its declared argument list,
    /// and serialize the result as a command payload: the [`Descriptor::Command`]
    /// prefix, the opcode, then each argument in order.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::UnknownCommand`] if `name` is not in the
    /// dictionary, or [`DictionaryError::ArgumentCoercion`] /
    /// [`DictionaryError::ArgumentCountMismatch`] aggregating every
    /// argument failure. Never partially dispatches: on any error, nothing
    /// is returned and nothing would be sent.
    pub fn dispatch(&self, name: &str, args: &[String]) -> Result<Bytes, DictionaryError> {
        let template = self.dictionary.command_by_name(name)?;
        let values = coerce_args(&template.args, args)?;

        let mut payload = Descriptor::Command.to_u32().to_be_bytes().to_vec();
        payload.extend_from_slice(&wire::encode_command(template, &values));
        Ok(Bytes::from(payload))
    }
}

#[cfg(test)]
mod tests {
    use gds_dictionary::{ArgSpec, CommandTemplate, ValueType};

    use super::*;

    fn dict() -> Dictionary {
        Dictionary::new(
            vec![CommandTemplate {
                opcode: 5,
                name: "cdh.NoOp".to_string(),
                args: vec![ArgSpec { name: "n".to_string(), description: String::new(), ty: ValueType::U8 }],
            }],
            vec![],
            vec![],
        )
    }

    #[test]
    fn dispatch_prefixes_the_command_descriptor() {
        let dict = dict();
        let dispatcher = Dispatcher::new(&dict);
        let payload = dispatcher.dispatch("cdh.NoOp", &["7".to_string()]).unwrap();
        assert_eq!(&payload[0..4], &Descriptor::Command.to_u32().to_be_bytes());
        assert_eq!(&payload[4..8], &5u32.to_be_bytes());
        assert_eq!(payload[8], 7);
    }

    #[test]
    fn unknown_command_never_reaches_coercion() {
        let dict = dict();
        let dispatcher = Dispatcher::new(&dict);
        let err = dispatcher.dispatch("nope", &[]).unwrap_err();
        assert!(matches!(err, DictionaryError::UnknownCommand(_)));
    }

    #[test]
    fn bad_argument_is_reported_not_partially_dispatched() {
        let dict = dict();
        let dispatcher = Dispatcher::new(&dict);
        let err = dispatcher.dispatch("cdh.NoOp", &["not-a-number".to_string()]).unwrap_err();
        assert!(matches!(err, DictionaryError::ArgumentCoercion(_)));
    }
}
