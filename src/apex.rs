//! APEX and rational derivations
//!
//! EXIF stores shutter speed and aperture in APEX units (base-2 logarithms)
//! and focal length as a rational. These turn the raw strings from the full
//! tag set into the values a photographer reads off a camera.
//!
//! A missing source tag or a degenerate intermediate (zero, infinite, or
//! non-numeric) gives `Detail::NotDerivable`, never `Detail::Unknown`.

use tracing::debug;

use crate::details::Detail;
use crate::rational::parse_rational;
use crate::tags::RawTagSet;

pub const SHUTTER_SPEED_TAG: &str = "ShutterSpeedValue";
pub const APERTURE_TAG: &str = "ApertureValue";
pub const FOCAL_LENGTH_TAG: &str = "FocalLength";

/// Shutter speed from the APEX `ShutterSpeedValue` tag: `"1/50s"`, `"2s"`
pub fn shutter_speed(tags: &RawTagSet) -> Detail {
    let Some(raw) = tags.get_text(SHUTTER_SPEED_TAG) else {
        return Detail::NotDerivable;
    };

    let apex = parse_rational(raw);
    let shutter = 2f64.powf(-apex);
    if shutter == 0.0 || !shutter.is_finite() {
        debug!("Shutter speed not derivable from {:?}", raw);
        return Detail::NotDerivable;
    }

    if shutter >= 1.0 {
        Detail::Known(format!("{:.0}s", shutter.round()))
    } else {
        Detail::Known(format!("1/{:.0}s", (1.0 / shutter).round()))
    }
}

/// F-stop from the APEX `ApertureValue` tag: `"f/1.8"`
pub fn f_stop(tags: &RawTagSet) -> Detail {
    let Some(raw) = tags.get_text(APERTURE_TAG) else {
        return Detail::NotDerivable;
    };

    let apex = parse_rational(raw);
    let fstop = 2f64.powf(apex / 2.0);
    if fstop == 0.0 || !fstop.is_finite() {
        debug!("F-stop not derivable from {:?}", raw);
        return Detail::NotDerivable;
    }

    Detail::Known(format!("f/{:.1}", (fstop * 10.0).round() / 10.0))
}

/// Focal length in whole millimeters from the rational `FocalLength` tag: `"35 mm"`
pub fn focal_length(tags: &RawTagSet) -> Detail {
    let Some(raw) = tags.get_text(FOCAL_LENGTH_TAG) else {
        return Detail::NotDerivable;
    };

    let focal = parse_rational(raw);
    if !focal.is_finite() {
        debug!("Focal length not derivable from {:?}", raw);
        return Detail::NotDerivable;
    }

    Detail::Known(format!("{:.0} mm", focal.round()))
}
