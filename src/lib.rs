//! exif_details - human-readable camera details from EXIF metadata
//!
//! Reads an image's embedded EXIF block and produces nine display-ready
//! fields: make, model, focal length, exposure, aperture, shutter speed,
//! date taken, ISO and f-stop. Shutter speed and f-stop are derived from
//! the APEX-encoded `ShutterSpeedValue` / `ApertureValue` tags.
//!
//! ## Example
//!
//! ```rust,no_run
//! use exif_details::get_details;
//! use std::path::Path;
//!
//! let details = get_details(Path::new("photo.jpg"))?;
//! for (name, value) in details.fields() {
//!     println!("{}: {}", name, value);
//! }
//! # Ok::<(), exif_details::DetailsError>(())
//! ```

use std::path::Path;

pub mod apex;
pub mod decoder;
pub mod details;
pub mod error;
pub mod rational;
pub mod tags;

pub use decoder::{DecodeOptions, ExifDecoder, MetadataDecoder, StaticDecoder};
pub use details::{assemble, Detail, DetailsReader, DetailsRecord, UNKNOWN};
pub use error::{DetailsError, Result};
pub use rational::parse_rational;
pub use tags::{RawTagSet, RawTagValue, Section};

/// Camera details for the image at `path`, using the kamadak-exif decoder
///
/// Returns `DetailsError::FileNotFound` when `path` is not an existing file.
pub fn get_details(path: &Path) -> Result<DetailsRecord> {
    DetailsReader::new().get_details(path)
}
