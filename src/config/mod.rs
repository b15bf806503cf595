//! Configuration file loader contract (spec §6's "Configuration file
//! surface (external collaborator; contract only)"), grounded on
//! `original_source/src/config.c`'s `config_process_yaml_event` state
//! machine. The original drives a hand-rolled `YRS_*` state enum off
//! libyaml's push-parser events to build a tree of `fluid_object_t`
//! containers; this module keeps that exact state machine shape but
//! replaces libyaml with `yaml_rust2`'s `Parser`/`Event` push API, the
//! ecosystem's event-driven YAML parser.
//!
//! This loader is never invoked by the block lexer, token stage,
//! preprocessor, or parse-tree builder — spec §1 lists it among the
//! "out of scope (external collaborators)" and spec §6 calls it out
//! explicitly as "contract only". It exists so a future host of this
//! library can load a configuration file (filter allow-lists, include
//! search paths, ...) through the same state-machine discipline the
//! original used, not so the CLI wires it in today.

use std::collections::BTreeMap;
use std::fmt;

use yaml_rust2::parser::{Event as YamlEvent, EventReceiver, Parser as YamlParser};
use yaml_rust2::ScanError;

use crate::error::FluidError;

/// The event vocabulary [`ConfigReader`] consumes, mirroring libyaml's
/// `YAML_*_EVENT` set as `config.c` switches on it. Scalar and alias
/// carry the data the original read out of `yaml_event_t.data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    MappingStart,
    MappingEnd,
    SequenceStart,
    SequenceEnd,
    Scalar(String),
    Alias,
}

/// The reader's state, mirroring `enum yaml_reader_state_e` in
/// `config.c` (`YRS_START`, `YRS_OBJ_NEW`, `YRS_OBJ_KEY`, `YRS_OBJ_VAL`,
/// `YRS_STOP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Start,
    ObjectNew,
    ObjectKey,
    ObjectValue,
    Stop,
}

impl fmt::Display for ReaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReaderState::Start => "START",
            ReaderState::ObjectNew => "OBJ_NEW",
            ReaderState::ObjectKey => "OBJ_KEY",
            ReaderState::ObjectValue => "OBJ_VAL",
            ReaderState::Stop => "STOP",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ConfigEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigEvent::StreamStart => "STREAM_START_EVENT",
            ConfigEvent::StreamEnd => "STREAM_END_EVENT",
            ConfigEvent::DocumentStart => "DOCUMENT_START_EVENT",
            ConfigEvent::DocumentEnd => "DOCUMENT_END_EVENT",
            ConfigEvent::MappingStart => "MAPPING_START_EVENT",
            ConfigEvent::MappingEnd => "MAPPING_END_EVENT",
            ConfigEvent::SequenceStart => "SEQUENCE_START_EVENT",
            ConfigEvent::SequenceEnd => "SEQUENCE_END_EVENT",
            ConfigEvent::Scalar(_) => "SCALAR_EVENT",
            ConfigEvent::Alias => "ALIAS_EVENT",
        };
        f.write_str(name)
    }
}

/// A loaded configuration value, the Rust shape of `fluid_object_t`'s
/// primitive/list/container union (`objects.h`). Maps use `BTreeMap`
/// rather than an insertion-ordered map, matching [`crate::value::Value`]'s
/// own "insertion-insensitive key→Value" map (spec §3) instead of
/// introducing a dependency the teacher/pack stack doesn't carry.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Nil,
    Scalar(String),
    List(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
}

/// One container nesting level. `key` is the map key this frame will be
/// nested under once it closes, when its parent container is a map;
/// `None` both for the implicit document root and for an element of a
/// parent *list* (list elements have no key). `is_root` disambiguates
/// those two `None` cases when the frame closes.
#[derive(Debug)]
struct Frame {
    key: Option<String>,
    is_root: bool,
    container: ConfigContainer,
}

#[derive(Debug)]
enum ConfigContainer {
    Map(BTreeMap<String, ConfigValue>),
    List(Vec<ConfigValue>),
}

/// Push-parser state machine building a [`ConfigValue`] tree from a
/// stream of [`ConfigEvent`]s, a direct translation of `config.c`'s
/// `config_process_yaml_event` switch. Only mapping-rooted documents are
/// supported, matching the original's grammar comment (`section ::=
/// MAPPING-START (key list) MAPPING-END`).
pub struct ConfigReader {
    state: ReaderState,
    pending_key: Option<String>,
    /// Always has the implicit document-root frame at index 0 once a
    /// document has been entered (`ReaderState::ObjectNew` onward);
    /// `object_descend`/`object_ascend` in the original push/pop this
    /// same stack as mappings and sequences nest.
    stack: Vec<Frame>,
}

impl Default for ConfigReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigReader {
    pub fn new() -> Self {
        Self {
            state: ReaderState::Start,
            pending_key: None,
            stack: Vec::new(),
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    fn unexpected(&self, event: &ConfigEvent) -> FluidError {
        FluidError::ConfigUnexpectedEvent {
            state: self.state.to_string(),
            event: event.to_string(),
        }
    }

    /// Insert `value` into whichever container is on top of the stack,
    /// under `pending_key` for a map or appended for a list — the Rust
    /// equivalent of `fluid_object_nest`. Dispatches purely on the
    /// *current* top frame's container kind, so it works the same
    /// whether that frame was reached via a map key or as a list
    /// element.
    fn nest(&mut self, value: ConfigValue) -> Result<(), FluidError> {
        let frame = self.stack.last_mut().ok_or(FluidError::ConfigInvalidAscend)?;
        match &mut frame.container {
            ConfigContainer::Map(map) => {
                let key = self
                    .pending_key
                    .take()
                    .ok_or_else(|| FluidError::ConfigParser {
                        message: "scalar value with no pending key".to_string(),
                    })?;
                map.insert(key, value);
            }
            ConfigContainer::List(list) => list.push(value),
        }
        Ok(())
    }

    /// Push a frame for a value nested inside whatever container is
    /// currently on top of the stack: a map key (taken from
    /// `pending_key`) when the parent is a map, no key when the parent
    /// is a list (an element has no key of its own).
    fn push_value_frame(&mut self, container: ConfigContainer) -> Result<(), FluidError> {
        let parent_is_map = matches!(
            self.stack.last().map(|f| &f.container),
            Some(ConfigContainer::Map(_))
        );
        let key = if parent_is_map {
            Some(
                self.pending_key
                    .take()
                    .ok_or_else(|| FluidError::ConfigParser {
                        message: "nested container with no pending key".to_string(),
                    })?,
            )
        } else {
            None
        };
        self.stack.push(Frame {
            key,
            is_root: false,
            container,
        });
        Ok(())
    }

    /// Pop the top frame and nest its finished value into its parent
    /// (or, for the document root, leave it as the final result) —
    /// `object_ascend` in the original. Returns whether the frame that
    /// just closed was the implicit document root, so the caller knows
    /// whether to resume expecting sibling keys (`ObjectKey`) or the end
    /// of the document (`ObjectNew`).
    fn ascend(&mut self) -> Result<bool, FluidError> {
        let frame = self.stack.pop().ok_or(FluidError::ConfigInvalidAscend)?;
        let is_root = frame.is_root;
        let value = into_value(frame.container);
        if is_root {
            // The document root frame closed; push it back so
            // `into_map` can still find it after `DOCUMENT_END`.
            self.stack.push(Frame {
                key: None,
                is_root: true,
                container: into_container(value),
            });
            return Ok(true);
        }
        if let Some(key) = frame.key {
            self.pending_key = Some(key);
        }
        self.nest(value)?;
        Ok(false)
    }

    /// The state to resume parsing siblings in, read off whatever
    /// container is now on top of the stack: a map expects another key,
    /// a list expects another element (or its close) without a
    /// key-then-value round trip.
    fn state_for_top(&self) -> ReaderState {
        match self.stack.last().map(|f| &f.container) {
            Some(ConfigContainer::Map(_)) => ReaderState::ObjectKey,
            Some(ConfigContainer::List(_)) => ReaderState::ObjectValue,
            None => ReaderState::ObjectNew,
        }
    }

    /// The state to resume at after a `MappingEnd`/`SequenceEnd` closed
    /// a frame: `ObjectNew` if that frame was the document root (awaiting
    /// `DocumentEnd`), otherwise whatever [`Self::state_for_top`] reads
    /// off the parent container the closed frame just nested into.
    fn state_after_ascend(&self, was_root: bool) -> ReaderState {
        if was_root {
            ReaderState::ObjectNew
        } else {
            self.state_for_top()
        }
    }

    /// Advance the state machine by one [`ConfigEvent`], mirroring
    /// `config_process_yaml_event`'s per-state `switch`.
    pub fn process_event(&mut self, event: ConfigEvent) -> Result<(), FluidError> {
        match (self.state, &event) {
            (ReaderState::Start, ConfigEvent::StreamStart) => Ok(()),
            (ReaderState::Start, ConfigEvent::DocumentStart) => {
                self.state = ReaderState::ObjectNew;
                Ok(())
            }
            (ReaderState::Start, _) => Err(self.unexpected(&event)),

            (ReaderState::ObjectNew, ConfigEvent::MappingStart) => {
                self.stack.push(Frame {
                    key: None,
                    is_root: true,
                    container: ConfigContainer::Map(BTreeMap::new()),
                });
                self.state = ReaderState::ObjectKey;
                Ok(())
            }
            (ReaderState::ObjectNew, ConfigEvent::DocumentEnd)
            | (ReaderState::ObjectNew, ConfigEvent::StreamEnd) => {
                self.state = ReaderState::Stop;
                Ok(())
            }
            (ReaderState::ObjectNew, _) => Err(self.unexpected(&event)),

            (ReaderState::ObjectKey, ConfigEvent::Scalar(key)) => {
                self.pending_key = Some(key.clone());
                self.state = ReaderState::ObjectValue;
                Ok(())
            }
            (ReaderState::ObjectKey, ConfigEvent::MappingEnd) => {
                let was_root = self.ascend()?;
                self.state = self.state_after_ascend(was_root);
                Ok(())
            }
            (ReaderState::ObjectKey, _) => Err(self.unexpected(&event)),

            // A scalar in `ObjectValue` is either a map's value (the
            // container on top is the map awaiting that value) or a
            // list element (the container on top is the list itself,
            // since a list has no separate "awaiting value" state).
            // Either way `nest` already dispatches on that container;
            // the state to resume at afterward is read off the same
            // container, not hardcoded, so scalar list elements don't
            // wrongly flip the reader into expecting a map key next.
            (ReaderState::ObjectValue, ConfigEvent::Scalar(value)) => {
                self.nest(ConfigValue::Scalar(value.clone()))?;
                self.state = self.state_for_top();
                Ok(())
            }
            (ReaderState::ObjectValue, ConfigEvent::MappingStart) => {
                self.push_value_frame(ConfigContainer::Map(BTreeMap::new()))?;
                self.state = ReaderState::ObjectKey;
                Ok(())
            }
            (ReaderState::ObjectValue, ConfigEvent::SequenceStart) => {
                self.push_value_frame(ConfigContainer::List(Vec::new()))?;
                self.state = ReaderState::ObjectValue;
                Ok(())
            }
            (ReaderState::ObjectValue, ConfigEvent::SequenceEnd) => {
                let was_root = self.ascend()?;
                self.state = self.state_after_ascend(was_root);
                Ok(())
            }
            (ReaderState::ObjectValue, _) => Err(self.unexpected(&event)),

            (ReaderState::Stop, _) => Ok(()),
        }
    }

    /// Consume the reader, returning the document root's entries.
    /// Valid only after the state machine has reached
    /// [`ReaderState::Stop`].
    pub fn into_map(mut self) -> BTreeMap<String, ConfigValue> {
        match self.stack.pop().map(|frame| frame.container) {
            Some(ConfigContainer::Map(map)) => map,
            _ => BTreeMap::new(),
        }
    }
}

fn into_value(container: ConfigContainer) -> ConfigValue {
    match container {
        ConfigContainer::Map(map) => ConfigValue::Map(map),
        ConfigContainer::List(list) => ConfigValue::List(list),
    }
}

fn into_container(value: ConfigValue) -> ConfigContainer {
    match value {
        ConfigValue::Map(map) => ConfigContainer::Map(map),
        ConfigValue::List(list) => ConfigContainer::List(list),
        other => ConfigContainer::Map(BTreeMap::from([("_".to_string(), other)])),
    }
}

/// Adapt a `yaml_rust2::parser::Event` into this crate's [`ConfigEvent`],
/// dropping the source mark the way `config.c` never looked at libyaml's
/// `event.start_mark` either.
fn adapt_event(event: YamlEvent) -> Option<ConfigEvent> {
    match event {
        YamlEvent::StreamStart => Some(ConfigEvent::StreamStart),
        YamlEvent::StreamEnd => Some(ConfigEvent::StreamEnd),
        YamlEvent::DocumentStart => Some(ConfigEvent::DocumentStart),
        YamlEvent::DocumentEnd => Some(ConfigEvent::DocumentEnd),
        YamlEvent::MappingStart(..) => Some(ConfigEvent::MappingStart),
        YamlEvent::MappingEnd => Some(ConfigEvent::MappingEnd),
        YamlEvent::SequenceStart(..) => Some(ConfigEvent::SequenceStart),
        YamlEvent::SequenceEnd => Some(ConfigEvent::SequenceEnd),
        YamlEvent::Scalar(value, ..) => Some(ConfigEvent::Scalar(value)),
        YamlEvent::Alias(_) => Some(ConfigEvent::Alias),
        YamlEvent::Nothing => None,
    }
}

/// Bridges `yaml_rust2`'s push-parser callback into [`ConfigReader`],
/// the same role `config_parse_yaml_event`'s direct call played against
/// libyaml's `yaml_parser_parse` loop in the original.
struct ReaderBridge {
    reader: ConfigReader,
    error: Option<FluidError>,
}

impl EventReceiver for ReaderBridge {
    fn on_event(&mut self, event: YamlEvent) {
        if self.error.is_some() {
            return;
        }
        if let Some(mapped) = adapt_event(event) {
            if let Err(err) = self.reader.process_event(mapped) {
                self.error = Some(err);
            }
        }
    }
}

/// Parse a YAML configuration buffer into a [`ConfigValue::Map`],
/// corresponding to `config_parse_yaml_buf` in the original. `yaml_rust2`
/// is the event-driven stream parser standing in for libyaml (spec §6's
/// "external event-driven stream parser for a structured configuration
/// format").
pub fn parse_yaml_buf(input: &str) -> Result<BTreeMap<String, ConfigValue>, FluidError> {
    let mut bridge = ReaderBridge {
        reader: ConfigReader::new(),
        error: None,
    };
    let mut parser = YamlParser::new(input.chars());
    parser
        .load(&mut bridge, false)
        .map_err(|err: ScanError| FluidError::ConfigParser {
            message: err.to_string(),
        })?;
    if let Some(err) = bridge.error {
        return Err(err);
    }
    Ok(bridge.reader.into_map())
}

/// Load and parse a YAML configuration file from disk, corresponding to
/// `config_parse_yaml` in the original.
pub fn parse_yaml_file(path: &std::path::Path) -> Result<BTreeMap<String, ConfigValue>, FluidError> {
    let contents = std::fs::read_to_string(path).map_err(|_| FluidError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    parse_yaml_buf(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_mapping_loads_scalar_values() {
        let map = parse_yaml_buf("name: fluid\nversion: 1\n").unwrap();
        assert_eq!(
            map.get("name"),
            Some(&ConfigValue::Scalar("fluid".to_string()))
        );
        assert_eq!(
            map.get("version"),
            Some(&ConfigValue::Scalar("1".to_string()))
        );
    }

    #[test]
    fn nested_mapping_builds_a_map_value() {
        let map = parse_yaml_buf("server:\n  host: localhost\n  port: 8080\n").unwrap();
        match map.get("server") {
            Some(ConfigValue::Map(nested)) => {
                assert_eq!(
                    nested.get("host"),
                    Some(&ConfigValue::Scalar("localhost".to_string()))
                );
            }
            other => panic!("expected nested map, got {other:?}"),
        }
    }

    #[test]
    fn sequence_values_build_a_list_value() {
        let map = parse_yaml_buf("paths:\n  - a\n  - b\n").unwrap();
        match map.get("paths") {
            Some(ConfigValue::List(items)) => assert_eq!(items.len(), 2),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn sequence_of_mappings_keeps_every_element() {
        let map = parse_yaml_buf("servers:\n  - host: a\n    port: 1\n  - host: b\n    port: 2\n")
            .unwrap();
        match map.get("servers") {
            Some(ConfigValue::List(items)) => {
                assert_eq!(items.len(), 2);
                for item in items {
                    assert!(matches!(item, ConfigValue::Map(_)));
                }
                match &items[0] {
                    ConfigValue::Map(first) => {
                        assert_eq!(first.get("host"), Some(&ConfigValue::Scalar("a".to_string())));
                    }
                    other => panic!("expected map element, got {other:?}"),
                }
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn reader_reaches_stop_state_after_single_document() {
        let mut reader = ConfigReader::new();
        reader.process_event(ConfigEvent::StreamStart).unwrap();
        reader.process_event(ConfigEvent::DocumentStart).unwrap();
        reader.process_event(ConfigEvent::MappingStart).unwrap();
        reader
            .process_event(ConfigEvent::Scalar("k".to_string()))
            .unwrap();
        reader
            .process_event(ConfigEvent::Scalar("v".to_string()))
            .unwrap();
        reader.process_event(ConfigEvent::MappingEnd).unwrap();
        reader.process_event(ConfigEvent::DocumentEnd).unwrap();
        reader.process_event(ConfigEvent::StreamEnd).unwrap();
        assert_eq!(reader.state(), ReaderState::Stop);
    }

    #[test]
    fn unexpected_event_for_state_is_an_error() {
        let mut reader = ConfigReader::new();
        let err = reader.process_event(ConfigEvent::MappingEnd).unwrap_err();
        assert!(matches!(err, FluidError::ConfigUnexpectedEvent { .. }));
    }
}
