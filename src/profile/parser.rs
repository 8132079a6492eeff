//! Streaming parser for lighting configuration XML.
//!
//! The reader keeps a stack of open element names (local names, namespace
//! prefixes dropped) and collects:
//!
//! - device names: `Name` inside `Device` inside `Devices`
//! - colours: every `RzColor` inside `Colors`, from its `Red`/`Green`/`Blue`
//! - effects: `Effect` inside `EffectLayer`, skipping `none`
//! - the profile name: the first `Name` directly under `LightingEffects`
//!
//! Missing sections simply produce empty lists.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, instrument};

use super::LightingEffect;
use super::colour::{Rgb, parse_channel};
use super::error::ProfileError;

const NO_EFFECT: &str = "none";

/// Reads and parses one configuration document.
///
/// # Errors
///
/// Returns `ProfileError::Io` when the file cannot be read and
/// `ProfileError::Xml` when it is not well-formed.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn parse_profile_file(path: &Path) -> Result<LightingEffect, ProfileError> {
    let bytes = std::fs::read(path).map_err(|e| ProfileError::io(path, e))?;
    let text = String::from_utf8_lossy(&bytes);
    let effect = parse_profile_str(&text)?;
    debug!(
        name = %effect.name,
        devices = effect.devices.len(),
        colours = effect.colours.len(),
        effects = effect.effects.len(),
        "parsed profile document"
    );
    Ok(effect)
}

/// Parses a configuration document held in memory.
///
/// # Errors
///
/// Returns `ProfileError::Xml` when the document is not well-formed.
pub fn parse_profile_str(xml: &str) -> Result<LightingEffect, ProfileError> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut collector = Collector::default();

    loop {
        let position = offset(&reader);
        match reader.read_event() {
            Ok(Event::Start(e)) => collector.open(local_name(&e)),
            Ok(Event::Empty(e)) => {
                collector.open(local_name(&e));
                collector.close();
            }
            Ok(Event::End(_)) => collector.close(),
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| ProfileError::xml(position, err.to_string()))?;
                collector.text.push_str(&text);
            }
            Ok(Event::CData(e)) => {
                collector.text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(ProfileError::xml(position, err.to_string())),
            _ => {}
        }
    }

    if let Some(open) = collector.stack.last() {
        return Err(ProfileError::xml(
            offset(&reader),
            format!("unexpected end of document inside <{open}>"),
        ));
    }

    Ok(collector.finish())
}

fn offset(reader: &Reader<&[u8]>) -> u64 {
    u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX)
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

#[derive(Debug, Default)]
struct Collector {
    stack: Vec<String>,
    /// Text gathered since the innermost element opened.
    text: String,
    /// Channels of the `RzColor` currently open, if any.
    colour: Option<Rgb>,
    effect: LightingEffect,
    name_found: bool,
}

impl Collector {
    fn open(&mut self, name: String) {
        if name == "RzColor" && self.has_ancestor("Colors") {
            self.colour = Some(Rgb::default());
        }
        self.stack.push(name);
        self.text.clear();
    }

    fn close(&mut self) {
        let Some(name) = self.stack.pop() else {
            return;
        };
        let text = std::mem::take(&mut self.text);
        let text = text.trim();
        let parent = self.stack.last().map(String::as_str);

        match name.as_str() {
            "Name" => {
                let top_level = self.stack.len() == 1 && parent == Some("LightingEffects");
                if top_level && !self.name_found {
                    self.effect.name = text.to_string();
                    self.name_found = true;
                }
                if self.has_chain(&["Devices", "Device"]) && !text.is_empty() {
                    push_unique(&mut self.effect.devices, text);
                }
            }
            "Red" | "Green" | "Blue" if parent == Some("RzColor") => {
                if let Some(colour) = self.colour.as_mut() {
                    let channel = parse_channel(text);
                    match name.as_str() {
                        "Red" => colour.red = channel,
                        "Green" => colour.green = channel,
                        _ => colour.blue = channel,
                    }
                }
            }
            "RzColor" => {
                if let Some(colour) = self.colour.take() {
                    push_unique(&mut self.effect.colours, &colour.to_hex());
                }
            }
            "Effect" => {
                if self.has_ancestor("EffectLayer") && !text.is_empty() && text != NO_EFFECT {
                    push_unique(&mut self.effect.effects, text);
                }
            }
            _ => {}
        }
    }

    fn has_ancestor(&self, name: &str) -> bool {
        self.stack.iter().any(|open| open == name)
    }

    /// True when the open elements contain `chain` in order (not necessarily adjacent).
    fn has_chain(&self, chain: &[&str]) -> bool {
        let mut wanted = chain.iter().peekable();
        for open in &self.stack {
            if wanted.peek().is_some_and(|w| open == *w) {
                wanted.next();
            }
        }
        wanted.peek().is_none()
    }

    fn finish(self) -> LightingEffect {
        self.effect
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}
