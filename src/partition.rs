use log::info;

use crate::error::SetupError;
use crate::gray::GrayMap;

/// one leaf of the quadtree: an axis-aligned square of the source image
/// plus its thumbnail at matching resolution. geometry never changes after
/// partitioning; the template assignment lives in the optimizer.
#[derive(Debug)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
    pub size: u32,
    pub thumbnail: GrayMap,
}

/// flat leaf list plus the top-level grid geometry the renderer needs.
/// border pixels beyond the last whole top-level square are not covered.
#[derive(Debug)]
pub struct Partition {
    pub cells: Vec<Cell>,
    pub top_cell_size: u32,
    pub count_x: u32,
    pub count_y: u32,
}

/// recursively subdivide the source into leaf cells. a square splits into
/// four quadrants while its luminance diversity exceeds `threshold` and
/// another level remains; level 0 always emits a leaf of `cell_size`.
pub fn partition(
    input: &GrayMap,
    detail: Option<&GrayMap>,
    cell_size: u32,
    level_count: u32,
    threshold: f64,
    thumbnail_size: u32,
) -> Result<Partition, SetupError> {
    profiling::scope!("partition");
    info!("generating cells...");

    let top_cell_size = cell_size << (level_count - 1);
    let count_x = input.width() / top_cell_size;
    let count_y = input.height() / top_cell_size;

    let mut cells = Vec::new();
    for y in 0..count_y {
        for x in 0..count_x {
            subdivide(
                input,
                detail,
                x * top_cell_size,
                y * top_cell_size,
                top_cell_size,
                level_count - 1,
                cell_size,
                threshold,
                thumbnail_size,
                &mut cells,
            );
        }
    }

    info!("cells: {}", cells.len());
    if cells.is_empty() {
        return Err(SetupError::NoCells);
    }
    Ok(Partition {
        cells,
        top_cell_size,
        count_x,
        count_y,
    })
}

#[allow(clippy::too_many_arguments)]
fn subdivide(
    input: &GrayMap,
    detail: Option<&GrayMap>,
    x: u32,
    y: u32,
    size: u32,
    level: u32,
    cell_size: u32,
    threshold: f64,
    thumbnail_size: u32,
    cells: &mut Vec<Cell>,
) {
    if level > 0 {
        let small = size / cell_size;
        let piece = input.crop(x, y, size, size).scaled(small, small);
        let detail_piece = detail.map(|d| d.crop(x, y, size, size).scaled(small, small));
        if diversity(&piece, detail_piece.as_ref()) > threshold {
            let half = size / 2;
            subdivide(input, detail, x, y, half, level - 1, cell_size, threshold, thumbnail_size, cells);
            subdivide(input, detail, x + half, y, half, level - 1, cell_size, threshold, thumbnail_size, cells);
            subdivide(input, detail, x, y + half, half, level - 1, cell_size, threshold, thumbnail_size, cells);
            subdivide(input, detail, x + half, y + half, half, level - 1, cell_size, threshold, thumbnail_size, cells);
            return;
        }
    }
    let thumbnail = input
        .crop(x, y, size, size)
        .scaled(thumbnail_size, thumbnail_size);
    cells.push(Cell { x, y, size, thumbnail });
}

/// root-mean-square deviation from the mean luminance, each squared
/// deviation scaled by the matching detail pixel normalized to 0..1.
/// a constant square scores exactly 0.
pub fn diversity(image: &GrayMap, detail: Option<&GrayMap>) -> f64 {
    let mean = image.mean();
    let mut sum = 0.0f64;
    for y in 0..image.height() {
        for x in 0..image.width() {
            let d = (image.get(x, y) as f64 - mean).abs() as i64;
            let k = match detail {
                Some(dm) => dm.get(x, y) as f64 / 255.0,
                None => 1.0,
            };
            sum += (d * d) as f64 * k;
        }
    }
    (sum / (image.width() as u64 * image.height() as u64) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    /// left half dark, right half bright: strongly non-uniform
    fn split_image(w: u32, h: u32) -> GrayMap {
        GrayMap::from_buffer(GrayImage::from_fn(w, h, |x, _| {
            if x < w / 2 {
                image::Luma([10])
            } else {
                image::Luma([240])
            }
        }))
    }

    #[test]
    fn test_uniform_square_diversity_zero() {
        let img = GrayMap::filled(16, 16, 99);
        assert_eq!(diversity(&img, None), 0.0);
    }

    #[test]
    fn test_uniform_image_never_subdivides() {
        let img = GrayMap::filled(80, 80, 128);
        let p = partition(&img, None, 10, 3, 0.1, 10).unwrap();
        // one 40px top-level square per quadrant of the 80px image, no splits
        assert_eq!(p.top_cell_size, 40);
        assert_eq!((p.count_x, p.count_y), (2, 2));
        assert_eq!(p.cells.len(), 4);
        assert!(p.cells.iter().all(|c| c.size == 40));
    }

    #[test]
    fn test_diverse_image_subdivides_to_base_cells() {
        let img = split_image(40, 40);
        let p = partition(&img, None, 10, 3, 5.0, 10).unwrap();
        // every leaf stays within bounds and at least base size
        for c in &p.cells {
            assert!(c.size >= 10);
            assert!(c.x + c.size <= 40 && c.y + c.size <= 40);
        }
        // the contrast edge forces at least one split
        assert!(p.cells.len() > 1);
        // leaves tile the single top-level square exactly
        let area: u64 = p.cells.iter().map(|c| (c.size as u64).pow(2)).sum();
        assert_eq!(area, 40 * 40);
    }

    #[test]
    fn test_leaves_do_not_overlap() {
        let img = split_image(40, 40);
        let p = partition(&img, None, 10, 3, 5.0, 10).unwrap();
        for (i, a) in p.cells.iter().enumerate() {
            for b in p.cells.iter().skip(i + 1) {
                let overlap_x = a.x < b.x + b.size && b.x < a.x + a.size;
                let overlap_y = a.y < b.y + b.size && b.y < a.y + a.size;
                assert!(!(overlap_x && overlap_y), "cells overlap");
            }
        }
    }

    #[test]
    fn test_border_remainder_dropped() {
        // 50x30 image with 20px top-level squares: 2x1 grid, remainder dropped
        let img = GrayMap::filled(50, 30, 60);
        let p = partition(&img, None, 20, 1, 10.0, 20).unwrap();
        assert_eq!((p.count_x, p.count_y), (2, 1));
        assert_eq!(p.cells.len(), 2);
    }

    #[test]
    fn test_too_small_image_is_setup_error() {
        let img = GrayMap::filled(15, 15, 60);
        let err = partition(&img, None, 20, 1, 10.0, 20).unwrap_err();
        assert!(matches!(err, SetupError::NoCells));
    }

    #[test]
    fn test_black_detail_image_suppresses_subdivision() {
        let img = split_image(40, 40);
        let detail = GrayMap::filled(40, 40, 0);
        let p = partition(&img, Some(&detail), 10, 3, 5.0, 10).unwrap();
        // zero detail weight zeroes every deviation, so no square splits
        assert_eq!(p.cells.len(), 1);
        assert_eq!(p.cells[0].size, 40);
    }
}
