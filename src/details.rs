//! Camera details assembly
//!
//! Looks up the direct fields in the IFD0 and EXIF sections, substituting
//! [`UNKNOWN`] for absent tags, and merges in the APEX-derived values.
//!
//! ## Example
//!
//! ```rust,no_run
//! use exif_details::{DetailsReader, Detail};
//! use std::path::Path;
//!
//! let reader = DetailsReader::new();
//! let details = reader.get_details(Path::new("photo.jpg"))?;
//! if let Detail::Known(shutter) = &details.shutter_speed {
//!     println!("Shutter: {}", shutter);
//! }
//! # Ok::<(), exif_details::DetailsError>(())
//! ```

use rayon::prelude::*;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::apex;
use crate::decoder::{DecodeOptions, ExifDecoder, MetadataDecoder};
use crate::error::{DetailsError, Result};
use crate::tags::{RawTagSet, Section};

/// Sentinel for a direct-lookup tag missing from the source metadata
pub const UNKNOWN: &str = "Unknown";

// ============================================================================
// Detail
// ============================================================================

/// One field of a [`DetailsRecord`]
///
/// `Unknown` means the tag was absent from the file. `NotDerivable` means a
/// derived field could not be computed (missing APEX tag, or a value that
/// degenerates to zero). They serialize differently: `"Unknown"` and `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detail {
    Known(String),
    Unknown,
    NotDerivable,
}

impl Detail {
    /// Direct lookup result: the text if present, `Unknown` otherwise
    pub fn lookup(value: Option<&str>) -> Self {
        match value {
            Some(v) => Detail::Known(v.to_string()),
            None => Detail::Unknown,
        }
    }
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detail::Known(v) => f.write_str(v),
            Detail::Unknown => f.write_str(UNKNOWN),
            Detail::NotDerivable => f.write_str("-"),
        }
    }
}

impl Serialize for Detail {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Detail::Known(v) => serializer.serialize_str(v),
            Detail::Unknown => serializer.serialize_str(UNKNOWN),
            Detail::NotDerivable => serializer.serialize_bool(false),
        }
    }
}

impl<'de> Deserialize<'de> for Detail {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Flag(false) => Ok(Detail::NotDerivable),
            Repr::Flag(true) => Err(de::Error::custom("expected a string or `false`")),
            Repr::Text(s) if s == UNKNOWN => Ok(Detail::Unknown),
            Repr::Text(s) => Ok(Detail::Known(s)),
        }
    }
}

// ============================================================================
// DetailsRecord
// ============================================================================

/// Human-readable camera details for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailsRecord {
    pub make: Detail,
    pub model: Detail,
    /// Whole millimeters, e.g. `35 mm`
    pub focal_length: Detail,
    /// Raw `ExposureTime` value, e.g. `10/500`
    pub exposure: Detail,
    /// Decoder-computed f-number, e.g. `f/1.8`
    pub aperture: Detail,
    /// `1/50s` or `2s`
    pub shutter_speed: Detail,
    pub date_taken: Detail,
    pub iso: Detail,
    /// F-stop from the APEX aperture value, e.g. `f/2.0`
    pub f_stop: Detail,
}

impl DetailsRecord {
    /// Field names in output order
    pub const FIELDS: [&'static str; 9] = [
        "make",
        "model",
        "focal_length",
        "exposure",
        "aperture",
        "shutter_speed",
        "date_taken",
        "iso",
        "f_stop",
    ];

    /// Flat `(name, value)` view in output order
    pub fn fields(&self) -> [(&'static str, &Detail); 9] {
        [
            ("make", &self.make),
            ("model", &self.model),
            ("focal_length", &self.focal_length),
            ("exposure", &self.exposure),
            ("aperture", &self.aperture),
            ("shutter_speed", &self.shutter_speed),
            ("date_taken", &self.date_taken),
            ("iso", &self.iso),
            ("f_stop", &self.f_stop),
        ]
    }

    pub fn get(&self, name: &str) -> Option<&Detail> {
        self.fields().into_iter().find(|(n, _)| *n == name).map(|(_, d)| d)
    }

    /// JSON object keyed by field name; `NotDerivable` fields become `false`
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

// ============================================================================
// DetailsReader
// ============================================================================

/// Reads a [`DetailsRecord`] for image paths through a [`MetadataDecoder`]
///
/// Stateless between calls. Each call blocks on file I/O with no timeout.
pub struct DetailsReader<D = ExifDecoder> {
    decoder: D,
    options: DecodeOptions,
}

impl DetailsReader<ExifDecoder> {
    pub fn new() -> Self {
        Self::with_decoder(ExifDecoder)
    }
}

impl Default for DetailsReader<ExifDecoder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: MetadataDecoder> DetailsReader<D> {
    pub fn with_decoder(decoder: D) -> Self {
        Self {
            decoder,
            options: DecodeOptions::default(),
        }
    }

    pub fn options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Details for the image at `path`
    ///
    /// Fails only when the path is not an existing, readable file. Missing
    /// or unparseable metadata gives a record of `Unknown`/`NotDerivable`
    /// fields instead.
    pub fn get_details(&self, path: &Path) -> Result<DetailsRecord> {
        check_readable(path)?;

        let ifd0 = self.decode_or_empty(path, Some(Section::Ifd0));
        let exif = self.decode_or_empty(path, Some(Section::Exif));
        let full = self.decode_or_empty(path, None);

        debug!(
            "Decoded {}: ifd0={} exif={} full={} tags",
            path.display(),
            ifd0.len(),
            exif.len(),
            full.len()
        );

        Ok(assemble(&ifd0, &exif, &full))
    }

    /// Details for many independent paths, evaluated in parallel.
    /// Results are in input order.
    pub fn get_details_many<P>(&self, paths: &[P]) -> Vec<Result<DetailsRecord>>
    where
        P: AsRef<Path> + Sync,
        D: Sync,
    {
        paths
            .par_iter()
            .map(|p| self.get_details(p.as_ref()))
            .collect()
    }

    fn decode_or_empty(&self, path: &Path, section: Option<Section>) -> RawTagSet {
        match self.decoder.decode(path, section, self.options.include_thumbnails) {
            Ok(tags) => tags,
            Err(e) => {
                let name = section.map(|s| s.name()).unwrap_or("full");
                warn!("Decoding {} section of {} failed: {}", name, path.display(), e);
                RawTagSet::new()
            }
        }
    }
}

/// Assemble a record from already-decoded tag sets
///
/// `ifd0` feeds make, model, exposure, date and the computed aperture;
/// `exif` feeds ISO; `full` feeds the three derived fields.
pub fn assemble(ifd0: &RawTagSet, exif: &RawTagSet, full: &RawTagSet) -> DetailsRecord {
    DetailsRecord {
        make: Detail::lookup(ifd0.get_text("Make")),
        model: Detail::lookup(ifd0.get_text("Model")),
        focal_length: apex::focal_length(full),
        exposure: Detail::lookup(ifd0.get_text("ExposureTime")),
        aperture: Detail::lookup(
            ifd0.get_path_text(&[Section::Computed.name(), "ApertureFNumber"]),
        ),
        shutter_speed: apex::shutter_speed(full),
        date_taken: Detail::lookup(ifd0.get_text("DateTime")),
        iso: Detail::lookup(exif.get_text("ISOSpeedRatings")),
        f_stop: apex::f_stop(full),
    }
}

fn check_readable(path: &Path) -> Result<()> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DetailsError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(DetailsError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    if !metadata.is_file() {
        return Err(DetailsError::FileNotFound(path.to_path_buf()));
    }

    std::fs::File::open(path).map_err(|source| DetailsError::Unreadable {
        path: PathBuf::from(path),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::StaticDecoder;
    use std::io::Write;

    fn known(s: &str) -> Detail {
        Detail::Known(s.to_string())
    }

    fn nikon_ifd0() -> RawTagSet {
        RawTagSet::new()
            .with("Make", "NIKON CORPORATION")
            .with("Model", "NIKON D7000")
            .with("ExposureTime", "10/500")
            .with("DateTime", "2013:01:01 10:00:09")
            .with("COMPUTED", RawTagSet::new().with("ApertureFNumber", "f/1.8"))
    }

    fn nikon_exif() -> RawTagSet {
        RawTagSet::new().with("ISOSpeedRatings", "500")
    }

    fn nikon_full() -> RawTagSet {
        RawTagSet::new()
            .with("ShutterSpeedValue", "5643856/1000000")
            .with("ApertureValue", "170/100")
            .with("FocalLength", "350/10")
    }

    #[test]
    fn test_assemble_full_record() {
        let record = assemble(&nikon_ifd0(), &nikon_exif(), &nikon_full());

        assert_eq!(record.make, known("NIKON CORPORATION"));
        assert_eq!(record.model, known("NIKON D7000"));
        assert_eq!(record.focal_length, known("35 mm"));
        assert_eq!(record.exposure, known("10/500"));
        assert_eq!(record.aperture, known("f/1.8"));
        assert_eq!(record.shutter_speed, known("1/50s"));
        assert_eq!(record.date_taken, known("2013:01:01 10:00:09"));
        assert_eq!(record.iso, known("500"));
        assert_eq!(record.f_stop, known("f/1.8"));
    }

    #[test]
    fn test_missing_make_model_are_unknown() {
        let ifd0 = RawTagSet::new()
            .with("ExposureTime", "1/125")
            .with("DateTime", "2020:05:05 12:00:00")
            .with("COMPUTED", RawTagSet::new().with("ApertureFNumber", "f/4.0"));
        let record = assemble(&ifd0, &nikon_exif(), &nikon_full());

        assert_eq!(record.make, Detail::Unknown);
        assert_eq!(record.model, Detail::Unknown);
        assert_eq!(record.exposure, known("1/125"));
        assert_eq!(record.aperture, known("f/4.0"));
        assert_eq!(record.iso, known("500"));
        assert_eq!(record.shutter_speed, known("1/50s"));
    }

    #[test]
    fn test_missing_shutter_is_not_derivable() {
        let full = RawTagSet::new().with("ApertureValue", "2").with("FocalLength", "350/10");
        let record = assemble(&nikon_ifd0(), &nikon_exif(), &full);

        assert_eq!(record.shutter_speed, Detail::NotDerivable);
        assert_ne!(record.shutter_speed, Detail::Unknown);
        assert_eq!(record.f_stop, known("f/2.0"));
    }

    #[test]
    fn test_missing_computed_block_is_unknown() {
        let ifd0 = RawTagSet::new().with("Make", "Canon");
        let record = assemble(&ifd0, &RawTagSet::new(), &RawTagSet::new());

        assert_eq!(record.aperture, Detail::Unknown);
        assert_eq!(record.iso, Detail::Unknown);
        assert_eq!(record.focal_length, Detail::NotDerivable);
        assert_eq!(record.f_stop, Detail::NotDerivable);
    }

    #[test]
    fn test_iso_read_from_exif_section_only() {
        let ifd0 = nikon_ifd0().with("ISOSpeedRatings", "100");
        let record = assemble(&ifd0, &RawTagSet::new(), &nikon_full());
        assert_eq!(record.iso, Detail::Unknown);
    }

    #[test]
    fn test_get_details_missing_file() {
        let reader = DetailsReader::with_decoder(StaticDecoder::new());
        let err = reader.get_details(Path::new("/nonexistent/photo.jpg")).unwrap_err();
        assert!(matches!(err, DetailsError::FileNotFound(_)));
        assert!(err.is_missing_file());
    }

    #[test]
    fn test_get_details_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let reader = DetailsReader::with_decoder(StaticDecoder::new());
        assert!(reader.get_details(dir.path()).is_err());
    }

    #[test]
    fn test_get_details_through_decoder() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not really an image").unwrap();

        let decoder = StaticDecoder::new()
            .section(Section::Ifd0, nikon_ifd0())
            .section(Section::Exif, nikon_exif())
            .full(nikon_full());
        let reader = DetailsReader::with_decoder(decoder);

        let first = reader.get_details(file.path()).unwrap();
        let second = reader.get_details(file.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.make, known("NIKON CORPORATION"));
        assert_eq!(first.shutter_speed, known("1/50s"));
    }

    struct BrokenDecoder;

    impl MetadataDecoder for BrokenDecoder {
        fn decode(
            &self,
            path: &Path,
            _section: Option<Section>,
            _include_thumbnails: bool,
        ) -> Result<RawTagSet> {
            Err(DetailsError::Decode(format!("{}: Exif data too big", path.display())))
        }
    }

    #[test]
    fn test_decode_errors_degrade_to_empty_sets() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let reader = DetailsReader::with_decoder(BrokenDecoder);

        let record = reader.get_details(file.path()).unwrap();
        assert_eq!(record.make, Detail::Unknown);
        assert_eq!(record.iso, Detail::Unknown);
        assert_eq!(record.aperture, Detail::Unknown);
        assert_eq!(record.shutter_speed, Detail::NotDerivable);
        assert_eq!(record.focal_length, Detail::NotDerivable);
    }

    #[test]
    fn test_json_markers() {
        let record = assemble(&RawTagSet::new(), &RawTagSet::new(), &RawTagSet::new());
        let json = record.to_json().unwrap();

        assert_eq!(json["make"], "Unknown");
        assert_eq!(json["shutter_speed"], false);
        assert_eq!(json.as_object().unwrap().len(), DetailsRecord::FIELDS.len());
    }

    #[test]
    fn test_detail_deserialize() {
        let record: DetailsRecord = serde_json::from_value(serde_json::json!({
            "make": "Canon",
            "model": "Unknown",
            "focal_length": false,
            "exposure": "1/60",
            "aperture": "f/2.8",
            "shutter_speed": "1/60s",
            "date_taken": "2021:07:04 18:30:00",
            "iso": "200",
            "f_stop": false
        }))
        .unwrap();

        assert_eq!(record.make, known("Canon"));
        assert_eq!(record.model, Detail::Unknown);
        assert_eq!(record.focal_length, Detail::NotDerivable);
        assert!(serde_json::from_value::<Detail>(serde_json::json!(true)).is_err());
    }

    #[test]
    fn test_field_lookup_by_name() {
        let record = assemble(&nikon_ifd0(), &nikon_exif(), &nikon_full());
        assert_eq!(record.get("iso"), Some(&known("500")));
        assert_eq!(record.get("lens"), None);
        assert_eq!(record.fields().map(|(n, _)| n), DetailsRecord::FIELDS);
    }
}
