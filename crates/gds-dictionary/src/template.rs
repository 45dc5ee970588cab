//! Typed templates: the shape of a dictionary entry for a command, event, or
//! telemetry channel.

use crate::value::ValueType;

/// One named, typed, described argument in a command or event template.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    /// Argument name, as it appears in the dictionary.
    pub name: String,
    /// Human-readable description, surfaced by ground tooling.
    pub description: String,
    /// Declared type.
    pub ty: ValueType,
}

/// A command's dictionary entry: numeric opcode, qualified name, and
/// ordered argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandTemplate {
    /// Numeric opcode used on the wire.
    pub opcode: u32,
    /// Qualified name (e.g. `cdh.NoOp`).
    pub name: String,
    /// Ordered argument list.
    pub args: Vec<ArgSpec>,
}

/// Event severity, mirroring the closed set used by F´-style EVR dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Routine diagnostic output.
    Diagnostic,
    /// Low-priority activity record.
    ActivityLo,
    /// High-priority activity record.
    ActivityHi,
    /// Low-priority warning.
    WarningLo,
    /// High-priority warning.
    WarningHi,
    /// Unrecoverable/fatal condition.
    Fatal,
}

/// An event's dictionary entry: id, qualified name, severity, format
/// string, and ordered argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct EventTemplate {
    /// Numeric event id.
    pub id: u32,
    /// Qualified name.
    pub name: String,
    /// Severity.
    pub severity: Severity,
    /// Format string the args are interpolated into for display.
    pub format: String,
    /// Ordered argument list.
    pub args: Vec<ArgSpec>,
}

/// Limit thresholds for a telemetry channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    /// Low-red (critically low) threshold.
    pub low_red: Option<f64>,
    /// Low-yellow (cautionary low) threshold.
    pub low_yellow: Option<f64>,
    /// High-yellow (cautionary high) threshold.
    pub high_yellow: Option<f64>,
    /// High-red (critically high) threshold.
    pub high_red: Option<f64>,
}

/// A telemetry channel's dictionary entry: id, qualified name, typed value,
/// and optional limits.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTemplate {
    /// Numeric channel id.
    pub id: u32,
    /// Qualified name.
    pub name: String,
    /// Declared value type.
    pub ty: ValueType,
    /// Optional limit thresholds; `None` if the channel has none.
    pub limits: Option<Limits>,
}
