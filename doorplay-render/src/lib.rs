pub mod images;
pub mod render;

pub use images::{ImageCache, rgba_to_pixmap};
pub use render::{FrameStats, SkiaRenderer, load_font, render_text_pixmap};
