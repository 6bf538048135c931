//! Screenshot renderer backed by headless Chrome (Chrome DevTools Protocol)

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, info};

use crate::preview::{preview_html, PREVIEW_HEIGHT, PREVIEW_WIDTH};
use crate::{
    AnnouncementContent, AnnouncementLayout, AnnouncementRenderer, Error, OutputFormat,
    RenderOptions, RenderOutput, Result, StyleConfig,
};

static PREVIEW_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Renders the HTML preview of an announcement and screenshots it.
///
/// Launches one headless Chrome instance with a single tab sized to the
/// preview viewport. Each render is one navigation plus one screenshot, with
/// no retries.
pub struct CdpRenderer {
    // kept alive for as long as the tab is in use
    _browser: Browser,
    tab: Arc<Tab>,
    options: RenderOptions,
}

impl CdpRenderer {
    pub fn new(options: RenderOptions) -> Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((PREVIEW_WIDTH, PREVIEW_HEIGHT)))
            .build()
            .map_err(|e| {
                Error::InitializationError(format!("Failed to build launch options: {}", e))
            })?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;

        info!("Headless Chrome ready for screenshot renders");
        Ok(Self {
            _browser: browser,
            tab,
            options,
        })
    }

    fn preview_path() -> PathBuf {
        let n = PREVIEW_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "announce-raster-preview-{}-{}.html",
            std::process::id(),
            n
        ))
    }

    fn screenshot(&self, page: &Path) -> Result<Vec<u8>> {
        let url = format!("file://{}", page.display());
        self.tab
            .navigate_to(&url)
            .map_err(|e| Error::CdpError(format!("Navigation failed: {}", e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::CdpError(format!("Wait for navigation failed: {}", e)))?;

        let (format, quality) = match self.options.format {
            OutputFormat::Png => (Page::CaptureScreenshotFormatOption::Png, None),
            OutputFormat::Jpeg => (Page::CaptureScreenshotFormatOption::Jpeg, Some(95)),
        };
        self.tab
            .capture_screenshot(format, quality, None, true)
            .map_err(|e| Error::CdpError(format!("Screenshot failed: {}", e)))
    }
}

impl AnnouncementRenderer for CdpRenderer {
    fn render(
        &self,
        content: &AnnouncementContent,
        layout: &AnnouncementLayout,
        style: &StyleConfig,
        background: Option<&Path>,
    ) -> Result<RenderOutput> {
        let html = preview_html(content, layout, style, background);
        let page = Self::preview_path();
        std::fs::write(&page, html)?;
        debug!("Wrote preview to {}", page.display());

        let shot = self.screenshot(&page);
        let _ = std::fs::remove_file(&page);
        let bytes = shot?;

        Ok(RenderOutput {
            bytes,
            width: PREVIEW_WIDTH,
            height: PREVIEW_HEIGHT,
            format: self.options.format,
            truncated: false,
        })
    }

    fn name(&self) -> &'static str {
        "screenshot"
    }
}
