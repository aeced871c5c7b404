//! Metadata decoding backends
//!
//! A [`MetadataDecoder`] turns an image path into a [`RawTagSet`] of
//! string values. Two backends are provided:
//!
//! 1. **ExifDecoder** - pure Rust EXIF parsing via kamadak-exif (JPEG, TIFF,
//!    HEIF and whatever else the crate reads from a container)
//! 2. **StaticDecoder** - pre-decoded tag sets, for callers that already
//!    hold the metadata (sidecars, caches, tests)
//!
//! ## Section filtering
//!
//! Passing a [`Section`] makes it a requirement: if the file has no tag in
//! that section the result is empty, otherwise the complete tag set is
//! returned. `None` returns the complete set unconditionally.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

use crate::error::{DetailsError, Result};
use crate::tags::{RawTagSet, Section};

/// Decoder settings applied to every call made by a `DetailsReader`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Include the thumbnail IFD as a `THUMBNAIL` block
    pub include_thumbnails: bool,
}

/// Source of raw tag sets
///
/// Implementations must be safe to call concurrently for distinct paths if
/// the decoder is shared across threads.
pub trait MetadataDecoder {
    fn decode(
        &self,
        path: &Path,
        section: Option<Section>,
        include_thumbnails: bool,
    ) -> Result<RawTagSet>;
}

impl<T: MetadataDecoder + ?Sized> MetadataDecoder for &T {
    fn decode(
        &self,
        path: &Path,
        section: Option<Section>,
        include_thumbnails: bool,
    ) -> Result<RawTagSet> {
        (**self).decode(path, section, include_thumbnails)
    }
}

// ============================================================================
// kamadak-exif Backend
// ============================================================================

/// Decoder backed by kamadak-exif
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifDecoder;

impl MetadataDecoder for ExifDecoder {
    fn decode(
        &self,
        path: &Path,
        section: Option<Section>,
        include_thumbnails: bool,
    ) -> Result<RawTagSet> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let exif_data = match exif::Reader::new().read_from_container(&mut reader) {
            Ok(data) => data,
            Err(e) => return read_failure(path, e),
        };

        let decoded = convert_exif(&exif_data, include_thumbnails);

        if let Some(required) = section {
            if !decoded.sections.contains(&required) {
                debug!("{} has no {} section", path.display(), required);
                return Ok(RawTagSet::new());
            }
        }

        Ok(decoded.tags)
    }
}

/// Sort a kamadak-exif failure: a container without EXIF is an empty set,
/// I/O stays I/O, and a damaged EXIF block is a decode error
fn read_failure(path: &Path, err: exif::Error) -> Result<RawTagSet> {
    match err {
        exif::Error::Io(e) => Err(DetailsError::Io(e)),
        exif::Error::NotFound(_) | exif::Error::InvalidFormat(_) | exif::Error::NotSupported(_) => {
            debug!("No EXIF in {}: {}", path.display(), err);
            Ok(RawTagSet::new())
        }
        other => Err(DetailsError::Decode(format!("{}: {}", path.display(), other))),
    }
}

struct Decoded {
    tags: RawTagSet,
    sections: HashSet<Section>,
}

fn convert_exif(exif_data: &exif::Exif, include_thumbnails: bool) -> Decoded {
    let mut tags = RawTagSet::new();
    let mut thumbnail = RawTagSet::new();
    let mut sections = HashSet::new();

    for field in exif_data.fields() {
        let Some(section) = section_of(field) else {
            continue;
        };
        let rendered = match (field.tag, &field.value) {
            (exif::Tag::UserComment, exif::Value::Undefined(bytes, _)) => {
                user_comment(bytes, exif_data.little_endian()).map(|(_, text)| text)
            }
            (_, value) => render_value(value),
        };
        let Some(value) = rendered else {
            continue;
        };

        sections.insert(section);
        if section == Section::Thumbnail {
            thumbnail.insert(tag_name(field.tag), value);
        } else {
            tags.insert(tag_name(field.tag), value);
        }
    }

    let computed = computed_block(exif_data);
    if !computed.is_empty() {
        sections.insert(Section::Computed);
        tags.insert(Section::Computed.name(), computed);
    }

    if include_thumbnails && !thumbnail.is_empty() {
        tags.insert(Section::Thumbnail.name(), thumbnail);
    }

    Decoded { tags, sections }
}

fn section_of(field: &exif::Field) -> Option<Section> {
    match field.ifd_num {
        exif::In::PRIMARY => Some(match field.tag.context() {
            exif::Context::Exif => Section::Exif,
            exif::Context::Gps => Section::Gps,
            exif::Context::Interop => Section::Interop,
            _ => Section::Ifd0,
        }),
        exif::In::THUMBNAIL => Some(Section::Thumbnail),
        _ => None,
    }
}

/// Standard EXIF tag name; ISO keeps its EXIF 2.2 name
pub fn tag_name(tag: exif::Tag) -> String {
    if tag == exif::Tag::PhotographicSensitivity {
        "ISOSpeedRatings".to_string()
    } else {
        tag.to_string()
    }
}

/// Render a field value as the string form consumers expect: rationals as
/// `"num/den"`, numbers in decimal, ASCII without NUL padding. Multiple
/// components are joined with `", "`. Binary blobs are dropped.
pub fn render_value(value: &exif::Value) -> Option<String> {
    use exif::Value;

    let rendered = match value {
        Value::Ascii(strings) => join(strings.iter().map(|s| ascii_text(s))),
        Value::Byte(v) => join(v),
        Value::Short(v) => join(v),
        Value::Long(v) => join(v),
        Value::SByte(v) => join(v),
        Value::SShort(v) => join(v),
        Value::SLong(v) => join(v),
        Value::Float(v) => join(v),
        Value::Double(v) => join(v),
        Value::Rational(v) => join(v.iter().map(|r| format!("{}/{}", r.num, r.denom))),
        Value::SRational(v) => join(v.iter().map(|r| format!("{}/{}", r.num, r.denom))),
        Value::Undefined(bytes, _) => {
            let text = ascii_text(bytes);
            if !text.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
                return None;
            }
            text
        }
        _ => return None,
    };

    Some(rendered)
}

/// Decode a `UserComment` value: an 8-byte character code followed by the
/// text. Returns the code name and the text, or `None` for JIS and unknown
/// codes.
pub fn user_comment(bytes: &[u8], little_endian: bool) -> Option<(&'static str, String)> {
    if bytes.len() < 8 {
        return None;
    }
    let (code, body) = bytes.split_at(8);

    let (encoding, text) = match code {
        b"ASCII\0\0\0" => ("ASCII", String::from_utf8_lossy(body).into_owned()),
        b"UNICODE\0" => {
            let units: Vec<u16> = body
                .chunks_exact(2)
                .map(|c| {
                    if little_endian {
                        u16::from_le_bytes([c[0], c[1]])
                    } else {
                        u16::from_be_bytes([c[0], c[1]])
                    }
                })
                .collect();
            ("UNICODE", String::from_utf16_lossy(&units))
        }
        [0, 0, 0, 0, 0, 0, 0, 0] => ("UNDEFINED", String::from_utf8_lossy(body).into_owned()),
        _ => return None,
    };

    let text = text.trim_end_matches(|c: char| c == '\0' || c == ' ').to_string();
    Some((encoding, text))
}

fn join<T: Display>(items: impl IntoIterator<Item = T>) -> String {
    items.into_iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

fn ascii_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string()
}

/// Values derived from several fields, exposed under `COMPUTED`
fn computed_block(exif_data: &exif::Exif) -> RawTagSet {
    let mut computed = RawTagSet::new();
    if exif_data.fields().next().is_none() {
        return computed;
    }

    let primary = |tag: exif::Tag| exif_data.get_field(tag, exif::In::PRIMARY);
    let get_uint = |tag: exif::Tag| primary(tag).and_then(|f| f.value.get_uint(0));

    let width = get_uint(exif::Tag::PixelXDimension).or(get_uint(exif::Tag::ImageWidth));
    let height = get_uint(exif::Tag::PixelYDimension).or(get_uint(exif::Tag::ImageLength));
    if let Some(h) = height {
        computed.insert("Height", h.to_string());
    }
    if let Some(w) = width {
        computed.insert("Width", w.to_string());
    }

    computed.insert("ByteOrderMotorola", if exif_data.little_endian() { "0" } else { "1" });

    // FNumber first, then the APEX aperture tags
    let first_rational = |tag: exif::Tag| {
        primary(tag)
            .and_then(|f| match f.value {
                exif::Value::Rational(ref v) if !v.is_empty() => Some(v[0].to_f64()),
                _ => None,
            })
            .filter(|n| n.is_finite())
    };
    let apex_fnumber = |apex: f64| 2f64.powf(apex / 2.0);
    let fnumber = first_rational(exif::Tag::FNumber)
        .or_else(|| first_rational(exif::Tag::ApertureValue).map(apex_fnumber))
        .or_else(|| first_rational(exif::Tag::MaxApertureValue).map(apex_fnumber));
    if let Some(n) = fnumber {
        computed.insert("ApertureFNumber", format!("f/{:.1}", n));
    }

    let comment = primary(exif::Tag::UserComment).and_then(|f| match f.value {
        exif::Value::Undefined(ref bytes, _) => user_comment(bytes, exif_data.little_endian()),
        _ => None,
    });
    if let Some((encoding, text)) = comment {
        computed.insert("UserComment", text);
        computed.insert("UserCommentEncoding", encoding);
    }

    if exif_data
        .get_field(exif::Tag::JPEGInterchangeFormat, exif::In::THUMBNAIL)
        .is_some()
    {
        computed.insert("Thumbnail.FileType", "2");
        computed.insert("Thumbnail.MimeType", "image/jpeg");
    }

    computed
}

// ============================================================================
// Static Backend
// ============================================================================

/// Decoder that serves pre-decoded tag sets
///
/// A filtered request returns the set registered for that section (empty if
/// none); an unfiltered request returns the full set.
#[derive(Debug, Clone, Default)]
pub struct StaticDecoder {
    sections: HashMap<Section, RawTagSet>,
    full: RawTagSet,
}

impl StaticDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, section: Section, tags: RawTagSet) -> Self {
        self.sections.insert(section, tags);
        self
    }

    pub fn full(mut self, tags: RawTagSet) -> Self {
        self.full = tags;
        self
    }
}

impl MetadataDecoder for StaticDecoder {
    fn decode(
        &self,
        _path: &Path,
        section: Option<Section>,
        _include_thumbnails: bool,
    ) -> Result<RawTagSet> {
        Ok(match section {
            Some(s) => self.sections.get(&s).cloned().unwrap_or_default(),
            None => self.full.clone(),
        })
    }
}
