use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::BTreeMap;

use crate::models::{Blob, Point};

/// Running first moments of one labelled region
#[derive(Default)]
struct Moments {
    sum_x: u64,
    sum_y: u64,
    count: u32,
}

/// Find blobs in a binary mask using connected components
pub fn find_blobs(mask: &GrayImage, min_area: u32) -> Vec<Blob> {
    let labeled = connected_components(mask, Connectivity::Eight, Luma([0]));

    let mut regions: BTreeMap<u32, Moments> = BTreeMap::new();

    for (x, y, label) in labeled.enumerate_pixels() {
        let label_val = label[0];
        if label_val == 0 {
            continue; // Skip background
        }

        let moments = regions.entry(label_val).or_default();
        moments.sum_x += x as u64;
        moments.sum_y += y as u64;
        moments.count += 1;
    }

    regions
        .into_iter()
        .filter(|(_, m)| m.count >= min_area)
        .map(|(label, m)| Blob {
            label,
            centroid: Point::new(
                m.sum_x as f32 / m.count as f32,
                m.sum_y as f32 / m.count as f32,
            ),
            area: m.count,
        })
        .collect()
}

/// Stateless extractor carrying the noise floor
#[derive(Debug, Clone)]
pub struct BlobExtractor {
    pub min_area: u32,
}

impl BlobExtractor {
    pub fn new(min_area: u32) -> Self {
        Self { min_area }
    }

    pub fn extract(&self, mask: &GrayImage) -> Vec<Blob> {
        find_blobs(mask, self.min_area)
    }
}
