//! Canvas backgrounds: a template image when one is configured and loadable,
//! otherwise a procedural gradient with a speckle texture.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Canvas size when no template is used.
pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 630;

/// Seed of the speckle texture.
pub const NOISE_SEED: u64 = 42;
/// One speckle per this many pixels.
pub const NOISE_DENSITY: u32 = 50;

/// Cache of decoded template images keyed by path.
#[derive(Default)]
pub struct AssetCache {
    images: Mutex<HashMap<PathBuf, Arc<RgbImage>>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the image at `path` as RGB8, caching successful loads.
    pub fn load(&self, path: &Path) -> Option<Arc<RgbImage>> {
        let mut images = self.images.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(img) = images.get(path) {
            return Some(Arc::clone(img));
        }
        let img = match image::open(path) {
            Ok(img) => Arc::new(img.to_rgb8()),
            Err(e) => {
                warn!(
                    "Failed to load background template {}: {}; using generated background",
                    path.display(),
                    e
                );
                return None;
            }
        };
        if img.width() == 0 || img.height() == 0 {
            warn!("Background template {} is empty; using generated background", path.display());
            return None;
        }
        images.insert(path.to_path_buf(), Arc::clone(&img));
        Some(img)
    }

    pub fn len(&self) -> usize {
        self.images.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The base layer for a render.
///
/// Returns a copy of the cached template when `template` loads, otherwise the
/// procedural background at the default size.
pub fn base_canvas(cache: &AssetCache, template: Option<&Path>) -> RgbImage {
    if let Some(path) = template {
        if let Some(img) = cache.load(path) {
            debug!(
                "Using background template {} ({}x{})",
                path.display(),
                img.width(),
                img.height()
            );
            return (*img).clone();
        }
    }
    procedural_background(DEFAULT_WIDTH, DEFAULT_HEIGHT, NOISE_SEED)
}

/// Gradient color at horizontal position `ratio` in `[0, 1)`.
///
/// Three segments across four anchors: #00BFFF → #1E90FF over the first
/// quarter, → #6A5ACD over the middle half, → #8B5CF6 over the last quarter.
pub fn gradient_color(ratio: f32) -> Rgb<u8> {
    let (r, g, b) = if ratio < 0.25 {
        let t = ratio / 0.25;
        (30.0 * t, 191.0 - 47.0 * t, 255.0)
    } else if ratio < 0.75 {
        let t = (ratio - 0.25) / 0.5;
        (30.0 + 76.0 * t, 144.0 - 54.0 * t, 255.0 - 50.0 * t)
    } else {
        let t = (ratio - 0.75) / 0.25;
        (106.0 + 33.0 * t, 90.0 + 2.0 * t, 205.0 + 41.0 * t)
    };
    Rgb([r as u8, g as u8, b as u8])
}

/// Horizontal gradient plus `width·height / 50` speckles, each shifting one
/// pixel's channels by a value in `[-15, 5]`. The same seed always produces
/// the same pixels.
pub fn procedural_background(width: u32, height: u32, seed: u64) -> RgbImage {
    let columns: Vec<Rgb<u8>> = (0..width)
        .map(|x| gradient_color(x as f32 / width as f32))
        .collect();
    let mut img = RgbImage::from_fn(width, height, |x, _| columns[x as usize]);

    if width == 0 || height == 0 {
        return img;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let speckles = (width as u64 * height as u64 / NOISE_DENSITY as u64) as usize;
    for _ in 0..speckles {
        let x = rng.gen_range(0..width);
        let y = rng.gen_range(0..height);
        let shift: i16 = rng.gen_range(-15..=5);
        let px = img.get_pixel_mut(x, y);
        for c in px.0.iter_mut() {
            *c = (*c as i16 + shift).clamp(0, 255) as u8;
        }
    }
    img
}
