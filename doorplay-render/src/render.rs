use ab_glyph::{Font, FontArc, Glyph, PxScale, ScaleFont, point};
use anyhow::{Result, bail};
use bytemuck::{cast_slice, cast_slice_mut};
use doorplay_core::{DoorStage, DoorState, DoorView, Screen, existing_asset};
use doorplay_timing::Timer;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use string_cache::DefaultAtom as Atom;
use tiny_skia::{
    Color, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8,
    Rect, Transform,
};

use crate::images::ImageCache;

const BACKGROUND: [u8; 4] = [0, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];
const GREY: [u8; 4] = [160, 160, 160, 255];
const GREEN: [u8; 4] = [60, 200, 90, 255];
const RED: [u8; 4] = [220, 60, 60, 255];
const AMBER: [u8; 4] = [230, 180, 40, 255];
const DOOR_WOOD: [u8; 4] = [120, 72, 36, 255];
const DOOR_HANDLE: [u8; 4] = [212, 175, 55, 255];

/// Height of a placeholder door relative to its width.
const DOOR_ASPECT: f32 = 1.6;

/// Loads a TTF/OTF font, warning and returning `None` when unavailable.
pub fn load_font(path: &Path) -> Option<FontArc> {
    let path = existing_asset(path)?;
    match std::fs::read(path).map(FontArc::try_from_vec) {
        Ok(Ok(font)) => Some(font),
        Ok(Err(err)) => {
            log::warn!("font {} is invalid: {err}", path.display());
            None
        }
        Err(err) => {
            log::warn!("font {} could not be read: {err}", path.display());
            None
        }
    }
}

type TextKey = (Atom, u32, [u8; 4]);

struct TextCache {
    font: FontArc,
    map: HashMap<TextKey, Arc<Pixmap>>,
}

impl TextCache {
    fn new(font: FontArc) -> Self {
        Self {
            font,
            map: HashMap::new(),
        }
    }

    fn get_or_render(&mut self, text: &str, size_px: f32, color: [u8; 4]) -> Arc<Pixmap> {
        let key = (Atom::from(text), size_px.to_bits(), color);
        if let Some(p) = self.map.get(&key) {
            return Arc::clone(p);
        }
        let pm = Arc::new(render_text_pixmap(
            text,
            size_px,
            &self.font,
            Color::from_rgba8(color[0], color[1], color[2], color[3]),
        ));
        self.map.insert(key, Arc::clone(&pm));
        pm
    }
}

/// Rasterizes one line of text into a tightly cropped premultiplied pixmap.
pub fn render_text_pixmap(text: &str, font_size: f32, font: &FontArc, color: Color) -> Pixmap {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // Layout with baseline at ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    let outlines: Vec<_> = glyphs
        .iter()
        .filter_map(|g| font.outline_glyph(g.clone()))
        .collect();
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    let empty = || Pixmap::new(1, 1).unwrap_or_else(|| unreachable!("1x1 pixmap is valid"));
    if outlines.is_empty() {
        return empty();
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let Some(mut pm) = Pixmap::new(w, h) else {
        return empty();
    };

    let stride = pm.width() as usize;
    let dst = pm.pixels_mut();
    let cu = [
        (color.red() * 255.0) as u8,
        (color.green() * 255.0) as u8,
        (color.blue() * 255.0) as u8,
        (color.alpha() * 255.0) as u8,
    ];

    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // Premultiply source by coverage, then Porter-Duff over
            let a_lin = (cov * cu[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a_lin * 255.0) as u8;
            let inv = 1.0 - a_lin;
            let bg = dst[i];
            let mix = |s: u8, d: u8| ((s as f32 * a_lin) as u8).saturating_add((d as f32 * inv) as u8);
            let r = mix(cu[0], bg.red());
            let g = mix(cu[1], bg.green());
            let bl = mix(cu[2], bg.blue());
            let a = sa.saturating_add((bg.alpha() as f32 * inv) as u8);
            if let Some(px) = PremultipliedColorU8::from_rgba(r.min(a), g.min(a), bl.min(a), a) {
                dst[i] = px;
            }
        });
    }

    pm
}

pub struct FrameStats {
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
}

/// Draws session screens into an offscreen canvas.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    center: (f32, f32),
    text_cache: Option<TextCache>,
    images: ImageCache,
    warned_videos: HashSet<PathBuf>,
    canvas: Pixmap,
}

impl SkiaRenderer {
    /// Without a font, screens are drawn without text.
    pub fn new(width: u32, height: u32, font: Option<FontArc>) -> Result<Self> {
        let Some(canvas) = Pixmap::new(width.max(1), height.max(1)) else {
            bail!("cannot allocate a {width}x{height} canvas");
        };
        if font.is_none() {
            log::warn!("no font loaded, text will not be drawn");
        }
        Ok(Self {
            width: canvas.width(),
            height: canvas.height(),
            center: (canvas.width() as f32 / 2.0, canvas.height() as f32 / 2.0),
            text_cache: font.map(TextCache::new),
            images: ImageCache::new(),
            warned_videos: HashSet::new(),
            canvas,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        let Some(canvas) = Pixmap::new(new_width.max(1), new_height.max(1)) else {
            bail!("cannot allocate a {new_width}x{new_height} canvas");
        };
        self.width = canvas.width();
        self.height = canvas.height();
        self.center = (self.width as f32 / 2.0, self.height as f32 / 2.0);
        self.canvas = canvas;
        Ok(())
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    /// Renders `screen` and copies the canvas into an RGBA frame buffer.
    pub fn render_frame<T>(
        &mut self,
        screen: &Screen,
        frame_buffer: &mut [u8],
        timer: &T,
    ) -> Result<FrameStats>
    where
        T: Timer<Timestamp = u64>,
    {
        if frame_buffer.len() != self.canvas.data().len() {
            bail!(
                "frame buffer holds {} bytes, canvas needs {}",
                frame_buffer.len(),
                self.canvas.data().len()
            );
        }

        let t = timer.now();
        self.render_screen(screen);
        let draw = timer.elapsed(t);

        let t = timer.now();
        frame_buffer.copy_from_slice(self.canvas.data());
        let copy = timer.elapsed(t);

        Ok(FrameStats {
            draw,
            copy,
            total: draw + copy,
        })
    }

    pub fn render_screen(&mut self, screen: &Screen) {
        self.canvas.fill(rgba(BACKGROUND));

        match screen {
            Screen::Instructions { image, caption } => {
                let bottom = self.draw_full_width_image(image);
                self.draw_text(caption, 22.0, GREY, (self.center.0, bottom + 24.0));
                self.draw_controls(screen);
            }
            Screen::Message { text, .. } => {
                self.draw_lines(text, 32.0, WHITE, self.center);
                self.draw_controls(screen);
            }
            Screen::Door(view) => self.draw_door_screen(view),
            Screen::Wheel { video, award } => {
                if !video.exists() && self.warned_videos.insert(video.clone()) {
                    log::warn!(
                        "wheel video {} not found, showing the award only",
                        video.display()
                    );
                }
                self.draw_text("Prize wheel", 32.0, WHITE, (self.center.0, self.center.1 - 40.0));
                self.draw_text(
                    &format!("{award} coins"),
                    48.0,
                    AMBER,
                    (self.center.0, self.center.1 + 20.0),
                );
                self.draw_controls(screen);
            }
            Screen::Blank | Screen::Finished => {}
        }
    }

    fn draw_door_screen(&mut self, view: &DoorView) {
        self.draw_text(
            &format!("Coins: {}", view.total_coins),
            24.0,
            WHITE,
            (self.width as f32 - 120.0, 30.0),
        );
        if let Some((current, total)) = view.progress {
            self.draw_text(&format!("Trial: {current}/{total}"), 24.0, GREY, (90.0, 30.0));
        }
        if view.practice {
            self.draw_text("PRACTICE MODE", 24.0, AMBER, (self.center.0, 30.0));
        }

        match view.stage {
            DoorStage::Iti { fraction } => {
                self.draw_text(
                    "Inter-trial interval (ITI) phase...",
                    28.0,
                    GREY,
                    (self.center.0, self.center.1 - 40.0),
                );
                self.draw_progress_bar(fraction, self.center.1);
            }
            stage => {
                let bottom = self.draw_door(view);
                self.draw_text(&view.caption, 22.0, GREY, (self.center.0, bottom + 22.0));
                self.draw_distance_bar(view.distance);
                if let Some(banner) = stage.banner() {
                    let color = match stage {
                        DoorStage::Revealed {
                            state: DoorState::Rewarded,
                            ..
                        } => GREEN,
                        DoorStage::Revealed {
                            state: DoorState::Punished,
                            ..
                        } => RED,
                        _ => AMBER,
                    };
                    self.draw_text(&banner, 36.0, color, (self.center.0, 80.0));
                }
                self.draw_controls(&Screen::Door(view.clone()));
            }
        }
    }

    /// Draws the door image, or a plain door when the image is missing.
    /// Returns the y coordinate of the door's bottom edge.
    fn draw_door(&mut self, view: &DoorView) -> f32 {
        let width = view.width_px() as f32;
        if let Some(img) = self.images.get(&view.image) {
            let s = width / img.width() as f32;
            let h = img.height() as f32 * s;
            let x = self.center.0 - width / 2.0;
            let y = self.center.1 - h / 2.0;
            self.blit_scaled(&img, x, y, s);
            return y + h;
        }

        let h = width * DOOR_ASPECT;
        let x = self.center.0 - width / 2.0;
        let y = self.center.1 - h / 2.0;
        self.fill_rect(x, y, width, h, DOOR_WOOD);
        self.fill_circle(x + width * 0.82, self.center.1, width * 0.05, DOOR_HANDLE);
        y + h
    }

    /// Fits an image to the canvas width. Returns its bottom edge.
    fn draw_full_width_image(&mut self, path: &Path) -> f32 {
        let Some(img) = self.images.get(path) else {
            return self.center.1;
        };
        let s = (self.width as f32 / img.width() as f32)
            .min((self.height as f32 - 100.0).max(1.0) / img.height() as f32);
        let w = img.width() as f32 * s;
        let h = img.height() as f32 * s;
        let x = self.center.0 - w / 2.0;
        let y = (self.center.1 - h / 2.0 - 30.0).max(0.0);
        self.blit_scaled(&img, x, y, s);
        y + h
    }

    fn draw_distance_bar(&mut self, distance: u8) {
        let w = self.width as f32 * 0.5;
        let x = self.center.0 - w / 2.0;
        let y = self.height as f32 - 90.0;
        self.fill_rect(x, y, w, 8.0, [60, 60, 60, 255]);
        self.fill_rect(x, y, w * f32::from(distance.min(100)) / 100.0, 8.0, GREY);
    }

    fn draw_progress_bar(&mut self, fraction: f32, y: f32) {
        let w = self.width as f32 * 0.6;
        let x = self.center.0 - w / 2.0;
        self.fill_rect(x, y, w, 16.0, [60, 60, 60, 255]);
        self.fill_rect(x, y, w * fraction.clamp(0.0, 1.0), 16.0, WHITE);
    }

    fn draw_controls(&mut self, screen: &Screen) {
        let labels = screen.controls();
        if labels.is_empty() {
            return;
        }
        let hint = labels.join("   |   ");
        self.draw_text(&hint, 22.0, GREY, (self.center.0, self.height as f32 - 40.0));
    }

    fn draw_lines(&mut self, text: &str, size: f32, color: [u8; 4], center: (f32, f32)) {
        let lines: Vec<&str> = text.lines().collect();
        let line_height = size * 1.4;
        let top = center.1 - line_height * (lines.len() as f32 - 1.0) / 2.0;
        for (i, line) in lines.iter().enumerate() {
            let line = line.trim();
            if !line.is_empty() {
                self.draw_text(line, size, color, (center.0, top + i as f32 * line_height));
            }
        }
    }

    fn draw_text(&mut self, text: &str, size: f32, color: [u8; 4], pos: (f32, f32)) {
        let Some(cache) = self.text_cache.as_mut() else {
            return;
        };
        let pm = cache.get_or_render(text, size, color);
        self.blit_centered(&pm, pos);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [u8; 4]) {
        let Some(rect) = Rect::from_xywh(x, y, w, h) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(rgba(color));
        self.canvas.fill_rect(rect, &paint, Transform::identity(), None);
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: [u8; 4]) {
        let mut pb = PathBuilder::new();
        pb.push_circle(cx, cy, r.max(1.0));
        let Some(path) = pb.finish() else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(rgba(color));
        self.canvas
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    fn blit_scaled(&mut self, img: &Pixmap, x: f32, y: f32, s: f32) {
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.canvas.draw_pixmap(
            0,
            0,
            img.as_ref(),
            &paint,
            Transform::from_row(s, 0.0, 0.0, s, x, y),
            None,
        );
    }

    /// Blends a premultiplied pixmap centered on `pos`, clipped to the canvas.
    fn blit_centered(&mut self, pm: &Pixmap, pos: (f32, f32)) {
        let (w, h) = (pm.width() as i32, pm.height() as i32);
        let (cw, ch) = (self.width as i32, self.height as i32);
        let x = (pos.0 - w as f32 * 0.5) as i32;
        let y = (pos.1 - h as f32 * 0.5) as i32;

        if x + w <= 0 || y + h <= 0 || x >= cw || y >= ch {
            return;
        }

        let dst_x = x.max(0) as usize;
        let dst_y = y.max(0) as usize;
        let src_x = (-x).max(0) as usize;
        let src_y = (-y).max(0) as usize;
        let copy_w = (w as usize - src_x).min(cw as usize - dst_x);
        let copy_h = (h as usize - src_y).min(ch as usize - dst_y);

        let src: &[u32] = cast_slice(pm.data());
        let dst: &mut [u32] = cast_slice_mut(self.canvas.data_mut());
        let src_stride = pm.width() as usize;
        let dst_stride = self.width as usize;

        for row in 0..copy_h {
            let s_row = (src_y + row) * src_stride + src_x;
            let d_row = (dst_y + row) * dst_stride + dst_x;
            for i in 0..copy_w {
                let s = src[s_row + i];
                let sa = s >> 24;
                if sa == 0 {
                    continue;
                }
                if sa == 255 {
                    dst[d_row + i] = s;
                    continue;
                }
                let d = dst[d_row + i];
                let inv = 255 - sa;
                let blend = |shift: u32| {
                    let sc = (s >> shift) & 0xFF;
                    let dc = (d >> shift) & 0xFF;
                    (sc + (dc * inv + 127) / 255).min(255) << shift
                };
                dst[d_row + i] = blend(0) | blend(8) | blend(16) | blend(24);
            }
        }
    }
}

fn rgba(c: [u8; 4]) -> Color {
    Color::from_rgba8(c[0], c[1], c[2], c[3])
}
