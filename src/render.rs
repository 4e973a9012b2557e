use image::imageops;
use image::{GrayImage, Rgb, RgbImage};
use log::info;

use crate::mosaic::Mosaic;

const DIVISION_OUTLINE: Rgb<u8> = Rgb([255, 0, 0]);

/// paint the final mosaic: each cell's assigned template is resampled to
/// the cell footprint (times the output scale), brightness-shifted and
/// blitted into place. the canvas covers exactly the top-level grid, so
/// the dropped border margin never appears in the output.
pub fn render_mosaic(mosaic: &Mosaic, scale: u32) -> GrayImage {
    profiling::scope!("render_mosaic");
    info!("drawing result...");
    let p = &mosaic.partition;
    let w = p.count_x * p.top_cell_size * scale;
    let h = p.count_y * p.top_cell_size * scale;
    let mut canvas = GrayImage::new(w, h);

    let templates = mosaic
        .templates
        .as_ref()
        .expect("render_mosaic requires a template library");
    for a in &mosaic.assignments {
        let side = a.size * scale;
        let tile = templates.templates[a.template_index]
            .image
            .scaled(side, side)
            .apply_brightness(a.brightness);
        imageops::replace(
            &mut canvas,
            tile.as_image(),
            (a.x * scale) as i64,
            (a.y * scale) as i64,
        );
    }
    canvas
}

/// diagnostic rendering: the (scaled) source image with every cell's
/// boundary stroked, showing the partition without running the search
pub fn render_division(mosaic: &Mosaic, scale: u32) -> RgbImage {
    profiling::scope!("render_division");
    info!("drawing division...");
    let p = &mosaic.partition;
    let w = p.count_x * p.top_cell_size * scale;
    let h = p.count_y * p.top_cell_size * scale;

    let base = mosaic.input.crop(0, 0, w / scale, h / scale).scaled(w, h);
    let mut canvas = RgbImage::from_fn(w, h, |x, y| {
        let c = base.get(x, y);
        Rgb([c, c, c])
    });

    for cell in &p.cells {
        stroke_rect(
            &mut canvas,
            cell.x * scale,
            cell.y * scale,
            cell.size * scale,
            DIVISION_OUTLINE,
        );
    }
    canvas
}

/// one-pixel square outline, clipped to the canvas
fn stroke_rect(img: &mut RgbImage, x: u32, y: u32, side: u32, color: Rgb<u8>) {
    if side == 0 || x >= img.width() || y >= img.height() {
        return;
    }
    let x1 = (x + side - 1).min(img.width() - 1);
    let y1 = (y + side - 1).min(img.height() - 1);
    for cx in x..=x1 {
        img.put_pixel(cx, y, color);
        img.put_pixel(cx, y1, color);
    }
    for cy in y..=y1 {
        img.put_pixel(x, cy, color);
        img.put_pixel(x1, cy, color);
    }
}
