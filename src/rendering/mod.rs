//! Rendering pipeline
//!
//! markup -> runs -> layout (wrapping, alignment, panel) -> compositor ->
//! paint commands -> raster. The background module supplies the canvas the
//! commands are executed on.

pub mod background;
pub mod compositor;
pub mod fonts;
pub mod layout;
pub mod markup;
pub mod paint;
pub mod raster;
pub mod runs;

pub use background::AssetCache;
pub use compositor::Compositor;
pub use fonts::{FontCache, FontSet, TextMeasurer};
pub use layout::WrappedLine;
pub use paint::{DisplayList, PaintCommand};
pub use runs::{FormattingRun, RunStyle};
