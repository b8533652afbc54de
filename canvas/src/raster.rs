//! Bitmap export: a small software rasterizer over the live object list.
//!
//! Output covers the union bounds of every object plus a margin, on a white
//! background, drawn in layer order. Boxes are filled polygons (rect, ellipse,
//! diamond, star, triangle outlines from [`crate::hit::shape_outline`]); edges
//! are stroked as thick segments. Text content is not rasterized.
//!
//! Rasterizing is a pure read of the store.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use std::f64::consts::PI;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};

use crate::consts::{RASTER_MARGIN, RASTER_MAX_EDGE_PX, RASTER_SCALE_MAX, RASTER_SCALE_MIN};
use crate::doc::{CanvasObject, DocStore, ObjectKind};
use crate::error::ErrorCode;
use crate::geom::{Point, Rect};
use crate::hit::{content_bounds, edge_path, shape_outline};

/// Arrowhead length in world units.
const ARROW_SIZE: f64 = 10.0;

/// Arrowhead half-angle in radians (~30°).
const ARROW_ANGLE: f64 = PI / 6.0;

type Rgb = [u8; 3];

const BACKGROUND: Rgb = [255, 255, 255];
const STICKY_FILL: Rgb = [254, 240, 138];
const SHAPE_FILL: Rgb = [226, 232, 240];
const FRAME_FILL: Rgb = [248, 250, 252];
const FRAME_STROKE: Rgb = [148, 163, 184];
const EDGE_STROKE: Rgb = [51, 65, 85];

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to encode bitmap: {0}")]
    Encode(#[from] image::ImageError),
}

impl ErrorCode for RasterError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Encode(_) => "E_RASTER_ENCODE",
        }
    }
}

/// Parse `#RGB` or `#RRGGBB` values into RGB channels.
#[must_use]
pub fn parse_hex_rgb(raw: &str) -> Option<(u8, u8, u8)> {
    let hex = raw.trim().strip_prefix('#')?;
    let digits: Vec<u32> = hex.chars().map(|c| c.to_digit(16)).collect::<Option<_>>()?;
    let (r, g, b) = match digits.as_slice() {
        [r, g, b] => (r * 17, g * 17, b * 17),
        [r1, r2, g1, g2, b1, b2] => (r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2),
        _ => return None,
    };
    let byte = |v: u32| u8::try_from(v).unwrap_or(u8::MAX);
    Some((byte(r), byte(g), byte(b)))
}

fn color(raw: Option<&str>) -> Option<Rgb> {
    raw.and_then(parse_hex_rgb).map(|(r, g, b)| [r, g, b])
}

/// Effective pixels-per-world-unit and world region for an export at `scale`.
#[must_use]
pub fn export_region(store: &DocStore, scale: f64) -> (Rect, f64) {
    let scale = if scale.is_finite() { scale.clamp(RASTER_SCALE_MIN, RASTER_SCALE_MAX) } else { 1.0 };
    let content = content_bounds(store).unwrap_or_default().inflate(RASTER_MARGIN);
    let longest = content.width.max(content.height);
    let max_edge = f64::from(RASTER_MAX_EDGE_PX);
    let scale = if longest * scale > max_edge { max_edge / longest } else { scale };
    (content, scale)
}

/// Render every object in `store` into an RGBA image at `scale` pixels per world unit.
#[must_use]
pub fn rasterize(store: &DocStore, scale: f64) -> RgbaImage {
    let (region, scale) = export_region(store, scale);
    let width = pixel_len(region.width * scale);
    let height = pixel_len(region.height * scale);
    let [r, g, b] = BACKGROUND;
    let mut canvas = Canvas {
        img: RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255])),
        origin: Point::new(region.x, region.y),
        scale,
    };
    for obj in store.sorted_objects() {
        canvas.draw_object(obj, store);
    }
    tracing::debug!(width, height, scale, objects = store.len(), "rasterized canvas");
    canvas.img
}

/// [`rasterize`] and encode as PNG.
///
/// # Errors
///
/// Returns `Encode` if the PNG encoder fails.
pub fn export_png(store: &DocStore, scale: f64) -> Result<Vec<u8>, RasterError> {
    let img = rasterize(store, scale);
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgba8)?;
    Ok(bytes)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pixel_len(extent: f64) -> u32 {
    extent.ceil().clamp(1.0, f64::from(RASTER_MAX_EDGE_PX)) as u32
}

struct Canvas {
    img: RgbaImage,
    origin: Point,
    scale: f64,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
impl Canvas {
    fn to_px(&self, world: Point) -> Point {
        Point::new((world.x - self.origin.x) * self.scale, (world.y - self.origin.y) * self.scale)
    }

    fn draw_object(&mut self, obj: &CanvasObject, store: &DocStore) {
        let style = obj.style();
        let alpha = style.opacity();
        if alpha <= 0.0 {
            return;
        }

        if let Some(path) = edge_path(obj, store) {
            let stroke = color(style.stroke()).unwrap_or(EDGE_STROKE);
            let width = (style.stroke_width() * self.scale).max(1.0);
            let px: Vec<Point> = path.into_iter().map(|p| self.to_px(p)).collect();
            self.stroke_polyline(&px, width, stroke, alpha, false);
            if matches!(obj.kind, ObjectKind::Arrow(_)) {
                if let [.., from, tip] = px.as_slice() {
                    self.arrowhead(*from, *tip, stroke, alpha);
                }
            }
            return;
        }

        let rect = obj.local_rect();
        let center = rect.center();
        let outline = match obj.kind {
            ObjectKind::Shape { shape } => shape_outline(&rect, shape),
            _ => rect.corners().to_vec(),
        };
        let px: Vec<Point> = outline
            .into_iter()
            .map(|p| self.to_px(p.rotate_around(center, obj.transform.rotation)))
            .collect();

        let fill = color(style.fill()).or(match obj.kind {
            ObjectKind::Sticky => Some(STICKY_FILL),
            ObjectKind::Shape { .. } => Some(SHAPE_FILL),
            ObjectKind::Frame => Some(FRAME_FILL),
            _ => None,
        });
        if let Some(fill) = fill {
            self.fill_polygon(&px, fill, alpha);
        }
        let stroke = color(style.stroke()).or(matches!(obj.kind, ObjectKind::Frame).then_some(FRAME_STROKE));
        if let Some(stroke) = stroke {
            let width = (style.stroke_width() * self.scale).max(1.0);
            self.stroke_polyline(&px, width, stroke, alpha, true);
        }
    }

    fn arrowhead(&mut self, from: Point, tip: Point, rgb: Rgb, alpha: f64) {
        let angle = (tip.y - from.y).atan2(tip.x - from.x);
        let size = ARROW_SIZE * self.scale;
        let left = Point::new(tip.x - size * (angle - ARROW_ANGLE).cos(), tip.y - size * (angle - ARROW_ANGLE).sin());
        let right = Point::new(tip.x - size * (angle + ARROW_ANGLE).cos(), tip.y - size * (angle + ARROW_ANGLE).sin());
        self.fill_polygon(&[tip, left, right], rgb, alpha);
    }

    fn stroke_polyline(&mut self, points: &[Point], width: f64, rgb: Rgb, alpha: f64, closed: bool) {
        let half = width / 2.0;
        let mut segments: Vec<(Point, Point)> = points.windows(2).map(|w| (w[0], w[1])).collect();
        if closed {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                segments.push((*last, *first));
            }
        }
        for (a, b) in segments {
            let len = a.distance(b);
            if len < f64::EPSILON {
                continue;
            }
            let nx = -(b.y - a.y) / len * half;
            let ny = (b.x - a.x) / len * half;
            let quad = [a.offset(nx, ny), b.offset(nx, ny), b.offset(-nx, -ny), a.offset(-nx, -ny)];
            self.fill_polygon(&quad, rgb, alpha);
        }
    }

    /// Even-odd scanline fill, sampling pixel centers.
    fn fill_polygon(&mut self, points: &[Point], rgb: Rgb, alpha: f64) {
        if points.len() < 3 {
            return;
        }
        let width = f64::from(self.img.width());
        let height = f64::from(self.img.height());
        let (min_y, max_y) =
            points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
        if !min_y.is_finite() || !max_y.is_finite() {
            return;
        }
        let first_row = min_y.floor().max(0.0) as i64;
        let last_row = max_y.ceil().min(height) as i64;

        let mut crossings: Vec<f64> = Vec::new();
        for row in first_row..last_row {
            let sy = row as f64 + 0.5;
            crossings.clear();
            for (i, a) in points.iter().enumerate() {
                let b = points[(i + 1) % points.len()];
                if (a.y <= sy) != (b.y <= sy) {
                    crossings.push(a.x + (sy - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
            crossings.sort_by(f64::total_cmp);
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil().max(0.0) as i64;
                let end = (span[1] - 0.5).floor().min(width - 1.0) as i64;
                for col in start..=end {
                    self.blend(col, row, rgb, alpha);
                }
            }
        }
    }

    fn blend(&mut self, x: i64, y: i64, rgb: Rgb, alpha: f64) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        let Some(px) = self.img.get_pixel_mut_checked(x, y) else {
            return;
        };
        for (dst, src) in px.0.iter_mut().zip(rgb) {
            let mixed = f64::from(src).mul_add(alpha, f64::from(*dst) * (1.0 - alpha));
            *dst = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }
}
