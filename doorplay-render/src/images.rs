use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use doorplay_core::existing_asset;
use tiny_skia::{IntSize, Pixmap};

/// Decoded images keyed by path. Missing or broken files are remembered as
/// absent so they are reported once.
#[derive(Default)]
pub struct ImageCache {
    map: HashMap<PathBuf, Option<Arc<Pixmap>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, path: &Path) -> Option<Arc<Pixmap>> {
        if let Some(cached) = self.map.get(path) {
            return cached.clone();
        }
        let loaded = existing_asset(path).and_then(load_pixmap).map(Arc::new);
        self.map.insert(path.to_path_buf(), loaded.clone());
        loaded
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn load_pixmap(path: &Path) -> Option<Pixmap> {
    match image::open(path) {
        Ok(img) => rgba_to_pixmap(img.into_rgba8()),
        Err(err) => {
            log::warn!("image {} could not be decoded: {err}", path.display());
            None
        }
    }
}

/// Converts straight RGBA into tiny-skia's premultiplied layout.
pub fn rgba_to_pixmap(img: image::RgbaImage) -> Option<Pixmap> {
    let (width, height) = img.dimensions();
    let mut data = img.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u32;
        px[0] = ((px[0] as u32 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u32 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u32 * a + 127) / 255) as u8;
    }
    Pixmap::from_vec(data, IntSize::from_wh(width, height)?)
}
