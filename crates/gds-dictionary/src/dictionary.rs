//! The dictionary container: typed templates indexed for lookup by name or
//! numeric id. Construction (from a parsed JSON/XML schema) is out of
//! scope; this type only holds and indexes already-typed templates.

use std::collections::HashMap;

use crate::{
    error::DictionaryError,
    template::{ChannelTemplate, CommandTemplate, EventTemplate},
};

/// A fully loaded dictionary: commands, events, and channels for one
/// deployment, indexed for O(1) lookup by qualified name or numeric id.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    commands_by_name: HashMap<String, CommandTemplate>,
    commands_by_opcode: HashMap<u32, String>,
    events_by_name: HashMap<String, EventTemplate>,
    events_by_id: HashMap<u32, String>,
    channels_by_name: HashMap<String, ChannelTemplate>,
    channels_by_id: HashMap<u32, String>,
}

impl Dictionary {
    /// Build a dictionary from already-typed templates.
    #[must_use]
    pub fn new(
        commands: Vec<CommandTemplate>,
        events: Vec<EventTemplate>,
        channels: Vec<ChannelTemplate>,
    ) -> Self {
        let mut dict = Self::default();
        for cmd in commands {
            dict.commands_by_opcode.insert(cmd.opcode, cmd.name.clone());
            dict.commands_by_name.insert(cmd.name.clone(), cmd);
        }
        for evt in events {
            dict.events_by_id.insert(evt.id, evt.name.clone());
            dict.events_by_name.insert(evt.name.clone(), evt);
        }
        for chan in channels {
            dict.channels_by_id.insert(chan.id, chan.name.clone());
            dict.channels_by_name.insert(chan.name.clone(), chan);
        }
        dict
    }

    /// Look up a command by its qualified name.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::UnknownCommand`] if no command with that
    /// name is present.
    pub fn command_by_name(&self, name: &str) -> Result<&CommandTemplate, DictionaryError> {
        self.commands_by_name.get(name).ok_or_else(|| DictionaryError::UnknownCommand(name.to_string()))
    }

    /// Look up a command by its numeric opcode.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::UnknownCommand`] if no command with that
    /// opcode is present.
    pub fn command_by_opcode(&self, opcode: u32) -> Result<&CommandTemplate, DictionaryError> {
        let name = self
            .commands_by_opcode
            .get(&opcode)
            .ok_or_else(|| DictionaryError::UnknownCommand(opcode.to_string()))?;
        self.command_by_name(name)
    }

    /// Look up an event by its qualified name.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::UnknownEvent`] if no event with that name
    /// is present.
    pub fn event_by_name(&self, name: &str) -> Result<&EventTemplate, DictionaryError> {
        self.events_by_name.get(name).ok_or_else(|| DictionaryError::UnknownEvent(name.to_string()))
    }

    /// Look up an event by its numeric id.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::UnknownEvent`] if no event with that id is
    /// present.
    pub fn event_by_id(&self, id: u32) -> Result<&EventTemplate, DictionaryError> {
        let name = self.events_by_id.get(&id).ok_or_else(|| DictionaryError::UnknownEvent(id.to_string()))?;
        self.event_by_name(name)
    }

    /// Look up a telemetry channel by its qualified name.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::UnknownChannel`] if no channel with that
    /// name is present.
    pub fn channel_by_name(&self, name: &str) -> Result<&ChannelTemplate, DictionaryError> {
        self.channels_by_name.get(name).ok_or_else(|| DictionaryError::UnknownChannel(name.to_string()))
    }

    /// Look up a telemetry channel by its numeric id.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::UnknownChannel`] if no channel with that
    /// id is present.
    pub fn channel_by_id(&self, id: u32) -> Result<&ChannelTemplate, DictionaryError> {
        let name =
            self.channels_by_id.get(&id).ok_or_else(|| DictionaryError::UnknownChannel(id.to_string()))?;
        self.channel_by_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    fn sample_dict() -> Dictionary {
        Dictionary::new(
            vec![CommandTemplate { opcode: 42, name: "cdh.NoOp".to_string(), args: vec![] }],
            vec![],
            vec![ChannelTemplate {
                id: 7,
                name: "cdh.Uptime".to_string(),
                ty: ValueType::U32,
                limits: None,
            }],
        )
    }

    #[test]
    fn looks_up_command_by_name_and_opcode() {
        let dict = sample_dict();
        assert_eq!(dict.command_by_name("cdh.NoOp").unwrap().opcode, 42);
        assert_eq!(dict.command_by_opcode(42).unwrap().name, "cdh.NoOp");
    }

    #[test]
    fn unknown_command_is_an_error_not_a_panic() {
        let dict = sample_dict();
        assert!(dict.command_by_name("nonexistent").is_err());
        assert!(dict.command_by_opcode(999).is_err());
    }

    #[test]
    fn looks_up_channel_by_name_and_id() {
        let dict = sample_dict();
        assert_eq!(dict.channel_by_id(7).unwrap().name, "cdh.Uptime");
        assert_eq!(dict.channel_by_name("cdh.Uptime").unwrap().id, 7);
    }
}
