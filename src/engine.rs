//! The raster engine: background, composition, rasterization and encoding.

use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use crate::rendering::background::{base_canvas, AssetCache};
use crate::rendering::compositor::Compositor;
use crate::rendering::fonts::FontCache;
use crate::rendering::raster;
use crate::{
    AnnouncementContent, AnnouncementLayout, AnnouncementRenderer, RenderOptions, RenderOutput,
    Result, StyleConfig,
};

/// Renders announcements without any external process.
///
/// Font faces and background templates are loaded once and shared by every
/// render performed through this engine (and its clones).
#[derive(Clone, Default)]
pub struct RasterEngine {
    options: RenderOptions,
    fonts: Arc<FontCache>,
    assets: Arc<AssetCache>,
}

impl RasterEngine {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            fonts: Arc::new(FontCache::new()),
            assets: Arc::new(AssetCache::new()),
        }
    }

    /// Engine sharing caches with other engines.
    pub fn with_caches(
        options: RenderOptions,
        fonts: Arc<FontCache>,
        assets: Arc<AssetCache>,
    ) -> Self {
        Self {
            options,
            fonts,
            assets,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn font_cache(&self) -> &FontCache {
        &self.fonts
    }

    pub fn asset_cache(&self) -> &AssetCache {
        &self.assets
    }
}

impl AnnouncementRenderer for RasterEngine {
    fn render(
        &self,
        content: &AnnouncementContent,
        layout: &AnnouncementLayout,
        style: &StyleConfig,
        background: Option<&Path>,
    ) -> Result<RenderOutput> {
        let mut canvas = base_canvas(&self.assets, background);
        let (width, height) = canvas.dimensions();
        raster::check_dimensions(width, height)?;
        debug!("Canvas {}x{}", width, height);

        let fonts = self.fonts.font_set(style);
        let list = Compositor::new(&fonts, width, height).compose(content, layout, style);
        raster::execute(&mut canvas, &list, &fonts);

        let bytes = raster::encode(&canvas, self.options.format)?;
        info!(
            "Rendered announcement {}x{} as {}{}",
            width,
            height,
            self.options.format.extension(),
            if list.truncated { " (body truncated)" } else { "" }
        );
        Ok(RenderOutput {
            bytes,
            width,
            height,
            format: self.options.format,
            truncated: list.truncated,
        })
    }

    fn name(&self) -> &'static str {
        "raster"
    }
}
