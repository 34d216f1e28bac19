//! Nominal touch panel profiles
//!
//! Each profile describes a panel's display resolution and the raw ADC range
//! its controller reports edge to edge. The nominal matrix derived from it is
//! a usable default until the panel has been calibrated.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::calibrate::{compute_matrix, CalibrationSample};
use crate::error::CalibrationError;
use crate::matrix::Matrix;
use crate::point::Point;

/// Touch panel description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelProfile {
    /// Panel name
    pub name: &'static str,
    /// Short identifier (e.g., "xpt2046")
    pub id: &'static str,
    pub description: &'static str,
    /// Display width in pixels
    pub width: u16,
    /// Display height in pixels
    pub height: u16,
    /// Raw reading at the left edge
    pub raw_x_min: i32,
    /// Raw reading at the right edge
    pub raw_x_max: i32,
    /// Raw reading at the top edge
    pub raw_y_min: i32,
    /// Raw reading at the bottom edge
    pub raw_y_max: i32,
    /// Controller reports display X on its Y channel and vice versa
    pub swap_axes: bool,
}

impl PanelProfile {
    /// Three corner samples mapping the raw range onto the display
    pub fn nominal_samples(&self) -> [CalibrationSample; 3] {
        let right = self.width as i32;
        let bottom = self.height as i32;

        let raw = |x: i32, y: i32| {
            if self.swap_axes {
                Point::new(y, x)
            } else {
                Point::new(x, y)
            }
        };

        [
            CalibrationSample::new(raw(self.raw_x_min, self.raw_y_min), Point::new(0, 0)),
            CalibrationSample::new(raw(self.raw_x_max, self.raw_y_min), Point::new(right, 0)),
            CalibrationSample::new(raw(self.raw_x_min, self.raw_y_max), Point::new(0, bottom)),
        ]
    }

    /// Default matrix for this panel
    pub fn nominal_matrix(&self) -> Result<Matrix, CalibrationError> {
        compute_matrix(&self.nominal_samples())
    }
}

/// XPT2046 / ADS7843 resistive controller on a 320x240 ILI9341 module
pub static XPT2046_PROFILE: Lazy<PanelProfile> = Lazy::new(|| PanelProfile {
    name: "XPT2046 320x240",
    id: "xpt2046",
    description: "XPT2046 12-bit resistive controller on a 2.8\" 320x240 SPI TFT",
    width: 320,
    height: 240,
    raw_x_min: 200,
    raw_x_max: 3800,
    raw_y_min: 200,
    raw_y_max: 3800,
    swap_axes: false,
});

/// XPT2046 on a 480x320 ILI9488 module mounted in portrait orientation
pub static XPT2046_480_PROFILE: Lazy<PanelProfile> = Lazy::new(|| PanelProfile {
    name: "XPT2046 480x320",
    id: "xpt2046-480",
    description: "XPT2046 on a 3.5\" 480x320 SPI TFT, controller axes rotated",
    width: 480,
    height: 320,
    raw_x_min: 150,
    raw_x_max: 3900,
    raw_y_min: 250,
    raw_y_max: 3850,
    swap_axes: true,
});

/// STMPE610 resistive controller on a 320x240 display
pub static STMPE610_PROFILE: Lazy<PanelProfile> = Lazy::new(|| PanelProfile {
    name: "STMPE610 320x240",
    id: "stmpe610",
    description: "STMPE610 12-bit resistive controller on a 320x240 TFT",
    width: 320,
    height: 240,
    raw_x_min: 150,
    raw_x_max: 3800,
    raw_y_min: 130,
    raw_y_max: 4000,
    swap_axes: false,
});

/// Registry of built-in panel profiles
pub static PANEL_PROFILES: Lazy<HashMap<&'static str, &'static PanelProfile>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("xpt2046", &*XPT2046_PROFILE);
    m.insert("ads7843", &*XPT2046_PROFILE);
    m.insert("xpt2046-480", &*XPT2046_480_PROFILE);
    m.insert("stmpe610", &*STMPE610_PROFILE);
    m
});

/// Get a panel profile by name
pub fn get_profile(name: &str) -> Option<&'static PanelProfile> {
    PANEL_PROFILES.get(name.to_lowercase().as_str()).copied()
}

/// Profile names, one per profile (aliases dropped)
pub fn profile_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = PANEL_PROFILES.values().map(|p| p.id).collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(get_profile("XPT2046").unwrap().id, "xpt2046");
        assert_eq!(get_profile("ads7843").unwrap().id, "xpt2046");
        assert!(get_profile("unknown").is_none());

        for name in profile_names() {
            assert_eq!(get_profile(name).unwrap().id, name);
        }
    }

    #[test]
    fn test_profile_names_follow_registry() {
        let names = profile_names();
        assert_eq!(names, vec!["stmpe610", "xpt2046", "xpt2046-480"]);
        assert!(!names.contains(&"ads7843"));

        for profile in PANEL_PROFILES.values() {
            assert!(names.contains(&profile.id), "{}", profile.id);
        }
    }

    #[test]
    fn test_nominal_matrix_maps_raw_range() {
        let profile = get_profile("xpt2046").unwrap();
        let m = profile.nominal_matrix().unwrap();

        assert_eq!(m.transform(Point::new(200, 200)), Point::new(0, 0));
        assert_eq!(m.transform(Point::new(3800, 3800)), Point::new(320, 240));
        assert_eq!(m.transform(Point::new(2000, 2000)), Point::new(160, 120));
    }

    #[test]
    fn test_swapped_axes() {
        let profile = get_profile("xpt2046-480").unwrap();
        let m = profile.nominal_matrix().unwrap();

        // Raw Y spans the display width, raw X the height
        assert_eq!(m.transform(Point::new(250, 150)), Point::new(0, 0));
        assert_eq!(m.transform(Point::new(250, 3900)), Point::new(480, 0));
        assert_eq!(m.transform(Point::new(3850, 150)), Point::new(0, 320));
    }

    #[test]
    fn test_all_profiles_calibrate() {
        for name in profile_names() {
            let profile = get_profile(name).unwrap();
            assert!(profile.nominal_matrix().is_ok(), "{}", name);
        }
    }
}
