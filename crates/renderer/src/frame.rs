//! Single-frame layout: title, color-mapped raster, border and colorbar.
//!
//! Frames have no axis ticks; only the map border is drawn.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};

use raster_cache::RasterLayer;

use crate::gradient::{colorize, format_tick, Color, ColorMap, Normalization};

/// Embedded font data - DejaVu Sans
const FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

const TICK_COUNT: usize = 5;

fn rgba(color: Color) -> Rgba<u8> {
    Rgba(color.to_rgba())
}

/// Pixel rectangle inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Area {
    fn rect(&self) -> Rect {
        Rect::at(self.x as i32, self.y as i32).of_size(self.width.max(1), self.height.max(1))
    }
}

/// Fixed geometry of a frame, derived from its pixel size.
#[derive(Debug, Clone, Copy)]
pub struct FrameLayout {
    pub width: u32,
    pub height: u32,
    pub title_height: u32,
    pub margin: u32,
    pub colorbar_width: u32,
    /// Area available to the map; the raster is fit inside it.
    pub map_area: Area,
}

impl FrameLayout {
    pub fn for_size(width: u32, height: u32) -> Self {
        let title_height = (height as f32 * 0.09) as u32;
        let margin = (width as f32 * 0.04) as u32;
        let colorbar_width = ((width as f32 * 0.025) as u32).max(4);
        let label_width = (width as f32 * 0.14) as u32;
        let map_area = Area {
            x: margin,
            y: title_height,
            width: width.saturating_sub(2 * margin + colorbar_width + label_width),
            height: height.saturating_sub(title_height + margin),
        };
        Self {
            width,
            height,
            title_height,
            margin,
            colorbar_width,
            map_area,
        }
    }

    /// Where a `raster_width` x `raster_height` grid lands, keeping square
    /// cells and centring in the map area.
    pub fn fit(&self, raster_width: usize, raster_height: usize) -> Area {
        let area = self.map_area;
        let scale = (area.width as f64 / raster_width.max(1) as f64)
            .min(area.height as f64 / raster_height.max(1) as f64);
        let width = ((raster_width as f64 * scale).round() as u32).clamp(1, area.width.max(1));
        let height = ((raster_height as f64 * scale).round() as u32).clamp(1, area.height.max(1));
        Area {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        }
    }

    fn colorbar(&self, map: &Area) -> Area {
        Area {
            x: self.map_area.x + self.map_area.width + self.margin / 2,
            y: map.y,
            width: self.colorbar_width,
            height: map.height,
        }
    }
}

/// Draws frames of one fixed size.
pub struct FrameRenderer {
    layout: FrameLayout,
    font: Option<Font<'static>>,
    background: Color,
    ink: Color,
}

impl FrameRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        let font = Font::try_from_bytes(FONT_DATA);
        if font.is_none() {
            tracing::warn!("Failed to load font for frame titles; rendering without text");
        }
        Self {
            layout: FrameLayout::for_size(width, height),
            font,
            background: Color::WHITE,
            ink: Color::BLACK,
        }
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// Render one frame for `layer` on a shared normalization.
    pub fn render(
        &self,
        layer: &RasterLayer,
        norm: &Normalization,
        cmap: ColorMap,
        title: &str,
        colorbar_label: &str,
    ) -> RgbaImage {
        let layout = &self.layout;
        let mut img = RgbaImage::from_pixel(layout.width, layout.height, rgba(self.background));

        let map = layout.fit(layer.width(), layer.height());
        self.draw_map(&mut img, layer, norm, cmap, &map);
        self.draw_colorbar(&mut img, norm, cmap, &layout.colorbar(&map), colorbar_label);

        let title_size = (layout.title_height as f32 * 0.45).max(8.0);
        let title_width = self.text_width(title, title_size);
        let title_x = (layout.width as i32 - title_width) / 2;
        let title_y = ((layout.title_height as f32 - title_size) / 2.0) as i32;
        self.draw_text(&mut img, title, title_x.max(0), title_y, title_size);

        img
    }

    fn draw_map(
        &self,
        img: &mut RgbaImage,
        layer: &RasterLayer,
        norm: &Normalization,
        cmap: ColorMap,
        map: &Area,
    ) {
        let (width, height) = layer.dimensions();
        let pixels = colorize(layer.data(), width, norm, cmap, self.background, |v| {
            layer.is_valid(v)
        });
        for py in 0..map.height {
            let sy = ((py as usize * height) / map.height as usize).min(height.saturating_sub(1));
            for px in 0..map.width {
                let sx = ((px as usize * width) / map.width as usize).min(width.saturating_sub(1));
                let i = (sy * width + sx) * 4;
                img.put_pixel(
                    map.x + px,
                    map.y + py,
                    Rgba([pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]),
                );
            }
        }
        let border = Area {
            x: map.x.saturating_sub(1),
            y: map.y.saturating_sub(1),
            width: map.width + 2,
            height: map.height + 2,
        };
        draw_hollow_rect_mut(img, border.rect(), rgba(self.ink));
    }

    fn draw_colorbar(
        &self,
        img: &mut RgbaImage,
        norm: &Normalization,
        cmap: ColorMap,
        bar: &Area,
        label: &str,
    ) {
        let steps = bar.height.saturating_sub(1).max(1) as f32;
        for row in 0..bar.height {
            let color = cmap.sample(1.0 - row as f32 / steps);
            let line = Area {
                x: bar.x,
                y: bar.y + row,
                width: bar.width,
                height: 1,
            };
            draw_filled_rect_mut(img, line.rect(), rgba(color));
        }
        draw_hollow_rect_mut(img, bar.rect(), rgba(self.ink));

        let font_size = (self.layout.height as f32 * 0.02).max(7.0);
        let right = (bar.x + bar.width) as f32;
        for tick in norm.ticks(TICK_COUNT) {
            let t = norm.normalize(tick) as f32;
            let y = bar.y as f32 + (1.0 - t) * steps;
            draw_line_segment_mut(img, (right, y), (right + 4.0, y), rgba(self.ink));
            self.draw_text(
                img,
                &format_tick(tick),
                right as i32 + 6,
                (y - font_size / 2.0) as i32,
                font_size,
            );
        }

        let label_y = bar.y as i32 - (font_size * 1.6) as i32;
        self.draw_text(img, label, bar.x as i32, label_y.max(0), font_size);
    }

    fn text_width(&self, text: &str, size: f32) -> i32 {
        match &self.font {
            Some(font) => text_size(Scale::uniform(size), font, text).0,
            None => 0,
        }
    }

    fn draw_text(&self, img: &mut RgbaImage, text: &str, x: i32, y: i32, size: f32) {
        if let Some(font) = &self.font {
            draw_text_mut(img, rgba(self.ink), x, y, Scale::uniform(size), font, text);
        }
    }
}
