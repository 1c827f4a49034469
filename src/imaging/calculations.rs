//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid image size {0:?}: expected \"W,H\", \"N%\", \"Nh\" or \"Nw\"")]
pub struct InvalidSize(pub String);

/// A target size as written in `comic_info.ini`.
///
/// | Text | Meaning |
/// |---|---|
/// | `"300,200"` | exactly 300x200 |
/// | `"50%"` | both edges scaled by 0.5 |
/// | `"300h"` | height 300, width keeps the aspect ratio |
/// | `"300w"` | width 300, height keeps the aspect ratio |
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeSpec {
    Exact { width: u32, height: u32 },
    Percent(f64),
    Height(u32),
    Width(u32),
}

impl FromStr for ResizeSpec {
    type Err = InvalidSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidSize(s.to_string());
        let number = |text: &str| text.trim().parse::<u32>().map_err(|_| invalid());

        if let Some((w, h)) = s.split_once(',') {
            return Ok(Self::Exact {
                width: number(w)?,
                height: number(h)?,
            });
        }
        let s_trimmed = s.trim();
        if let Some(pct) = s_trimmed.strip_suffix('%') {
            let pct: f64 = pct.trim().parse().map_err(|_| invalid())?;
            return Ok(Self::Percent(pct / 100.0));
        }
        if let Some(h) = s_trimmed.strip_suffix('h') {
            return Ok(Self::Height(number(h)?));
        }
        if let Some(w) = s_trimmed.strip_suffix('w') {
            return Ok(Self::Width(number(w)?));
        }
        Err(invalid())
    }
}

impl ResizeSpec {
    /// Output size for a `source` of `(width, height)`.
    ///
    /// Fractions truncate toward zero; neither edge drops below 1.
    pub fn target_dimensions(self, source: (u32, u32)) -> (u32, u32) {
        let (src_w, src_h) = (source.0 as f64, source.1 as f64);
        let (w, h) = match self {
            Self::Exact { width, height } => (width as f64, height as f64),
            Self::Percent(factor) => (src_w * factor, src_h * factor),
            Self::Height(h) => (src_w / src_h * h as f64, h as f64),
            Self::Width(w) => (w as f64, src_h / src_w * w as f64),
        };
        (truncate(w), truncate(h))
    }
}

fn truncate(v: f64) -> u32 {
    if v.is_finite() {
        (v.trunc() as u32).max(1)
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(s: &str) -> ResizeSpec {
        s.parse().unwrap()
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn parses_every_form() {
        assert_eq!(spec("300,200"), ResizeSpec::Exact { width: 300, height: 200 });
        assert_eq!(spec(" 300 , 200 "), ResizeSpec::Exact { width: 300, height: 200 });
        assert_eq!(spec("50%"), ResizeSpec::Percent(0.5));
        assert_eq!(spec("300h"), ResizeSpec::Height(300));
        assert_eq!(spec("120w"), ResizeSpec::Width(120));
    }

    #[test]
    fn rejects_unknown_forms() {
        for bad in ["", "300", "abc", "300x200", "h", "12.5h", "a,b"] {
            assert!(bad.parse::<ResizeSpec>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn error_names_the_value() {
        let err = "big".parse::<ResizeSpec>().unwrap_err();
        assert!(err.to_string().contains("\"big\""));
    }

    // =========================================================================
    // Dimensions
    // =========================================================================

    #[test]
    fn percent_scales_both_edges() {
        assert_eq!(spec("50%").target_dimensions((200, 100)), (100, 50));
    }

    #[test]
    fn height_keeps_aspect() {
        assert_eq!(spec("300h").target_dimensions((200, 100)), (600, 300));
    }

    #[test]
    fn width_keeps_aspect() {
        assert_eq!(spec("100w").target_dimensions((200, 100)), (100, 50));
    }

    #[test]
    fn exact_ignores_source() {
        assert_eq!(spec("10,20").target_dimensions((200, 100)), (10, 20));
    }

    #[test]
    fn fractions_truncate() {
        // 333 * 0.5 = 166.5
        assert_eq!(spec("50%").target_dimensions((333, 101)), (166, 50));
        // 100 / 300 * 200 = 66.67
        assert_eq!(spec("200h").target_dimensions((100, 300)), (66, 200));
    }

    #[test]
    fn never_below_one_pixel() {
        assert_eq!(spec("1%").target_dimensions((10, 10)), (1, 1));
        assert_eq!(spec("0,0").target_dimensions((10, 10)), (1, 1));
    }
}
