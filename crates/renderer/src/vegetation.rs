//! Vegetation mask derivation by nearest reference color.
//!
//! Each pixel is compared against a small palette of reference colors. The
//! closest entry wins unless it is farther than the rejection threshold, in
//! which case the pixel is non-vegetation and becomes the sentinel color.

use image::RgbImage;
use map_common::{MapError, Rgb};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::style::palette;

/// Distance (0-255 RGB units) beyond which a pixel is rejected.
pub const DEFAULT_REJECTION_THRESHOLD: f32 = 17.0;

/// Color of rejected (non-vegetation) pixels.
pub const NON_VEGETATION: Rgb = Rgb::BLACK;

/// A ground cover class and the color it is written as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VegetationClass {
    pub name: String,
    /// Painted color that maps to this class
    pub reference: Rgb,
    /// Color written to the vegetation raster
    pub class_color: Rgb,
}

impl VegetationClass {
    pub fn new(name: &str, reference: Rgb, class_color: Rgb) -> Self {
        Self {
            name: name.to_string(),
            reference,
            class_color,
        }
    }
}

/// Built-in classes matching the painted grass colors.
pub fn default_classes() -> Vec<VegetationClass> {
    vec![
        VegetationClass::new(
            "dense_trees_dark_grass",
            palette::DARK_GRASS,
            Rgb::new(127, 0, 0),
        ),
        VegetationClass::new("trees_grass", palette::MEDIUM_GRASS, Rgb::new(64, 0, 0)),
        VegetationClass::new("light_long_grass", palette::LIGHT_GRASS, Rgb::new(0, 255, 0)),
    ]
}

/// One reference color of the classifier palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub reference_color: Rgb,
    pub class_id: usize,
}

/// Per-class pixel counts of a classified raster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    /// Indexed like the classifier's classes
    pub per_class: Vec<u64>,
    pub rejected: u64,
}

impl ClassCounts {
    pub fn zeroed(classes: usize) -> Self {
        Self {
            per_class: vec![0; classes],
            rejected: 0,
        }
    }

    /// Sum two sets of counts over the same classes.
    pub fn merge(mut self, other: ClassCounts) -> Self {
        for (a, b) in self.per_class.iter_mut().zip(other.per_class) {
            *a += b;
        }
        self.rejected += other.rejected;
        self
    }

    pub fn total(&self) -> u64 {
        self.per_class.iter().sum::<u64>() + self.rejected
    }
}

/// Nearest-color vegetation classifier.
///
/// The palette holds every class reference plus every class color, so a
/// raster that is already classified maps onto itself.
#[derive(Debug, Clone)]
pub struct VegetationClassifier {
    classes: Vec<VegetationClass>,
    palette: Vec<PaletteEntry>,
    threshold: f32,
    threshold_sq: f64,
}

impl Default for VegetationClassifier {
    fn default() -> Self {
        Self::build(default_classes(), DEFAULT_REJECTION_THRESHOLD)
    }
}

impl VegetationClassifier {
    /// Default classes with a custom rejection threshold.
    pub fn new(threshold: f32) -> Result<Self, MapError> {
        Self::with_classes(default_classes(), threshold)
    }

    pub fn with_classes(classes: Vec<VegetationClass>, threshold: f32) -> Result<Self, MapError> {
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(MapError::invalid_config(
                "rejection_threshold",
                format!("must be a finite value >= 0, got {}", threshold),
            ));
        }
        if classes.is_empty() {
            return Err(MapError::invalid_config(
                "vegetation.classes",
                "at least one class is required",
            ));
        }
        Ok(Self::build(classes, threshold))
    }

    fn build(classes: Vec<VegetationClass>, threshold: f32) -> Self {
        let references = classes.iter().enumerate().map(|(i, c)| PaletteEntry {
            reference_color: c.reference,
            class_id: i,
        });
        let fixed_points = classes.iter().enumerate().map(|(i, c)| PaletteEntry {
            reference_color: c.class_color,
            class_id: i,
        });
        let palette = references.chain(fixed_points).collect();

        Self {
            classes,
            palette,
            threshold,
            threshold_sq: (threshold as f64) * (threshold as f64),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn classes(&self) -> &[VegetationClass] {
        &self.classes
    }

    pub fn palette(&self) -> &[PaletteEntry] {
        &self.palette
    }

    /// Class index of a pixel, `None` when rejected.
    ///
    /// Ties go to the earliest palette entry.
    pub fn class_of(&self, rgb: Rgb) -> Option<usize> {
        let mut best: Option<(u32, usize)> = None;
        for entry in &self.palette {
            let d = rgb.distance_sq(&entry.reference_color);
            if best.map(|(bd, _)| d < bd).unwrap_or(true) {
                best = Some((d, entry.class_id));
            }
        }

        best.filter(|(d, _)| (*d as f64) <= self.threshold_sq)
            .map(|(_, class_id)| class_id)
    }

    /// Output color of a pixel.
    pub fn classify(&self, rgb: Rgb) -> Rgb {
        self.class_of(rgb)
            .map(|i| self.classes[i].class_color)
            .unwrap_or(NON_VEGETATION)
    }

    /// Classify every pixel of `image`.
    pub fn classify_image(&self, image: &RgbImage) -> RgbImage {
        self.classify_image_counted(image).0
    }

    /// Classify every pixel of `image`, rows in parallel, counting classes.
    pub fn classify_image_counted(&self, image: &RgbImage) -> (RgbImage, ClassCounts) {
        let (width, height) = image.dimensions();
        let row_len = width as usize * 3;
        let mut out = RgbImage::new(width, height);
        if row_len == 0 || height == 0 {
            return (out, ClassCounts::zeroed(self.classes.len()));
        }

        let n = self.classes.len();
        let counts = out
            .par_chunks_mut(row_len)
            .zip(image.as_raw().par_chunks(row_len))
            .map(|(dst, src)| {
                let mut counts = ClassCounts::zeroed(n);
                // painted rasters have long runs of one color
                let mut last: Option<(Rgb, Option<usize>)> = None;
                for (d, s) in dst.chunks_exact_mut(3).zip(src.chunks_exact(3)) {
                    let rgb = Rgb(s[0], s[1], s[2]);
                    let class = match last {
                        Some((prev, class)) if prev == rgb => class,
                        _ => {
                            let class = self.class_of(rgb);
                            last = Some((rgb, class));
                            class
                        }
                    };
                    let color = match class {
                        Some(i) => {
                            counts.per_class[i] += 1;
                            self.classes[i].class_color
                        }
                        None => {
                            counts.rejected += 1;
                            NON_VEGETATION
                        }
                    };
                    d.copy_from_slice(&color.channels());
                }
                counts
            })
            .reduce(|| ClassCounts::zeroed(n), ClassCounts::merge);

        (out, counts)
    }
}
