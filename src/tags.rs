//! Raw tag model
//!
//! Decoded metadata as a flat map of tag name to string value, with nested
//! blocks for synthesized sub-sections such as `COMPUTED`. Every lookup
//! returns an `Option`; no tag is ever assumed to be present.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Logical sections of an EXIF block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    /// Primary image file directory (make, model, date)
    Ifd0,
    /// Photographic parameters (exposure, aperture, ISO)
    Exif,
    Gps,
    Interop,
    /// Second IFD describing the embedded thumbnail
    Thumbnail,
    /// Values derived by the decoder rather than read from the file
    Computed,
}

impl Section {
    pub fn name(&self) -> &'static str {
        match self {
            Section::Ifd0 => "IFD0",
            Section::Exif => "EXIF",
            Section::Gps => "GPS",
            Section::Interop => "INTEROP",
            Section::Thumbnail => "THUMBNAIL",
            Section::Computed => "COMPUTED",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single decoded value: text (plain number, rational `"n/d"`, or ASCII)
/// or a nested block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTagValue {
    Text(String),
    Block(RawTagSet),
}

impl RawTagValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawTagValue::Text(s) => Some(s),
            RawTagValue::Block(_) => None,
        }
    }

    pub fn as_block(&self) -> Option<&RawTagSet> {
        match self {
            RawTagValue::Block(b) => Some(b),
            RawTagValue::Text(_) => None,
        }
    }
}

impl From<&str> for RawTagValue {
    fn from(s: &str) -> Self {
        RawTagValue::Text(s.to_string())
    }
}

impl From<String> for RawTagValue {
    fn from(s: String) -> Self {
        RawTagValue::Text(s)
    }
}

impl From<RawTagSet> for RawTagValue {
    fn from(b: RawTagSet) -> Self {
        RawTagValue::Block(b)
    }
}

/// Tag name to raw value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTagSet {
    tags: BTreeMap<String, RawTagValue>,
}

impl RawTagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawTagValue>) {
        self.tags.insert(name.into(), value.into());
    }

    /// Builder-style insert, handy for fixtures
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawTagValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RawTagValue> {
        self.tags.get(name)
    }

    /// Text value of a top-level tag
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(RawTagValue::as_text)
    }

    /// Follow `path` through nested blocks, e.g. `["COMPUTED", "ApertureFNumber"]`.
    ///
    /// Any missing intermediate key, or a text value where a block is
    /// expected, yields `None`.
    pub fn get_path(&self, path: &[&str]) -> Option<&RawTagValue> {
        let (last, parents) = path.split_last()?;
        let mut block = self;
        for key in parents {
            block = block.get(key)?.as_block()?;
        }
        block.get(last)
    }

    pub fn get_path_text(&self, path: &[&str]) -> Option<&str> {
        self.get_path(path).and_then(RawTagValue::as_text)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
