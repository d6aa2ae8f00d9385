use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SegmentationConfig;

/// Binary in-band map: 255 for in-band pixels, 0 otherwise
pub type Mask = GrayImage;

const MIN_SENSITIVITY: u8 = 100;

/// HSV sample using the 8-bit convention: hue in 0..=180, saturation and value in 0..=255
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }

    pub fn from_rgb(pixel: &Rgb<u8>) -> Self {
        let [r, g, b] = pixel.0.map(|c| c as f32);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let s = if max > 0.0 { delta / max * 255.0 } else { 0.0 };

        let mut h = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * (g - b) / delta
        } else if max == g {
            120.0 + 60.0 * (b - r) / delta
        } else {
            240.0 + 60.0 * (r - g) / delta
        };
        if h < 0.0 {
            h += 360.0;
        }

        Self {
            h: (h / 2.0).round() as u8,
            s: s.round() as u8,
            v: max as u8,
        }
    }
}

/// Inclusive HSV range a pixel must fall in to be segmented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorBand {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl ColorBand {
    /// Near-white light: any hue, low saturation, value at or above `sensitivity`
    pub fn bright_spot(sensitivity: u8, saturation_ceiling: u8) -> Self {
        Self {
            lower: Hsv::new(0, 0, sensitivity),
            upper: Hsv::new(180, saturation_ceiling, 255),
        }
    }

    pub fn contains(&self, hsv: &Hsv) -> bool {
        (self.lower.h..=self.upper.h).contains(&hsv.h)
            && (self.lower.s..=self.upper.s).contains(&hsv.s)
            && (self.lower.v..=self.upper.v).contains(&hsv.v)
    }
}

/// Map every pixel inside `band` to 255
pub fn threshold_band(frame: &RgbImage, band: &ColorBand) -> Mask {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let hsv = Hsv::from_rgb(frame.get_pixel(x, y));
        if band.contains(&hsv) { Luma([255]) } else { Luma([0]) }
    })
}

/// Erode then dilate with a square element to drop speckle without shrinking blobs
pub fn open_mask(mask: &Mask, passes: u8) -> Mask {
    if passes == 0 {
        return mask.clone();
    }
    let eroded = erode(mask, Norm::LInf, passes);
    dilate(&eroded, Norm::LInf, passes)
}

/// Thresholds frames into masks; the band can be recalibrated while running
#[derive(Debug, Clone)]
pub struct Segmenter {
    band: ColorBand,
    sensitivity: u8,
    saturation_ceiling: u8,
    morphology_passes: u8,
}

impl Segmenter {
    pub fn new(config: &SegmentationConfig) -> Self {
        let sensitivity = config.sensitivity.max(MIN_SENSITIVITY);
        Self {
            band: ColorBand::bright_spot(sensitivity, config.saturation_ceiling),
            sensitivity,
            saturation_ceiling: config.saturation_ceiling,
            morphology_passes: config.morphology_passes,
        }
    }

    pub fn segment(&self, frame: &RgbImage) -> Mask {
        let raw = threshold_band(frame, &self.band);
        open_mask(&raw, self.morphology_passes)
    }

    pub fn band(&self) -> &ColorBand {
        &self.band
    }

    /// Replace the band outright
    pub fn set_band(&mut self, band: ColorBand) {
        info!(?band, "Segmentation band replaced");
        self.sensitivity = band.lower.v;
        self.band = band;
    }

    pub fn sensitivity(&self) -> u8 {
        self.sensitivity
    }

    /// Nudge the brightness floor, clamped to 100..=255, and rebuild the band
    pub fn adjust_sensitivity(&mut self, delta: i16) -> u8 {
        let next = (self.sensitivity as i16 + delta).clamp(MIN_SENSITIVITY as i16, 255) as u8;
        if next != self.sensitivity {
            self.sensitivity = next;
            self.band = ColorBand::bright_spot(next, self.saturation_ceiling);
            info!(sensitivity = next, "Segmentation recalibrated");
        }
        next
    }
}
