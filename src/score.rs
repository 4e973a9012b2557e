use log::info;
use rayon::prelude::*;

use crate::gray::{shift_sample, GrayMap};
use crate::partition::Cell;
use crate::template::TemplateLibrary;

/// precomputed pairing of one cell with one template: the best brightness
/// shift and the pixel-difference cost at that shift. computed once during
/// setup, read-only for the whole optimization phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Substitution {
    /// sum of absolute pixel differences after brightness correction; lower is better
    pub quality: u64,
    /// signed shift in [-variation/3, +variation]
    pub brightness: i32,
}

impl Substitution {
    pub fn score(cell: &GrayMap, template: &GrayMap, variation: i32) -> Self {
        let brightness = best_brightness(cell, template, variation);
        let quality = difference(cell, template, brightness);
        Self { quality, brightness }
    }
}

/// estimate the brightness shift that best maps `template` onto `cell`,
/// averaged per pixel and clamped asymmetrically: darkening a template is
/// visually safer than over-brightening it, so the negative bound is a
/// third of the positive one.
pub fn best_brightness(cell: &GrayMap, template: &GrayMap, variation: i32) -> i32 {
    debug_assert_eq!(cell.samples().len(), template.samples().len());
    let mut sum = 0.0f64;
    for (&c1, &c2) in cell.samples().iter().zip(template.samples()) {
        let c1 = c1 as f64;
        let c2 = c2 as f64;
        if c1 < c2 {
            sum += 255.0 * (c1 - c2) / c2;
        } else if c1 > c2 {
            sum += 255.0 * (c1 - c2) / (255.0 - c2);
        }
    }
    let mut brightness = (sum / cell.samples().len() as f64) as i32;
    let floor = -variation / 3;
    if brightness < floor {
        brightness = floor;
    }
    if brightness > variation {
        brightness = variation;
    }
    brightness
}

/// sum of absolute differences between the cell thumbnail and the
/// brightness-corrected template thumbnail
pub fn difference(cell: &GrayMap, template: &GrayMap, brightness: i32) -> u64 {
    debug_assert_eq!(cell.samples().len(), template.samples().len());
    let mut sum = 0u64;
    for (&c1, &c2) in cell.samples().iter().zip(template.samples()) {
        let corrected = shift_sample(c2, brightness);
        sum += (corrected as i64 - c1 as i64).unsigned_abs();
    }
    sum
}

/// score every (cell, template) pair. this O(cells x templates x thumbArea)
/// pass dominates setup cost; rows are independent, so cells are scored in
/// parallel and the result is indexed [cell][template].
pub fn build_substitutions(
    cells: &[Cell],
    templates: &TemplateLibrary,
    variation: i32,
) -> Vec<Vec<Substitution>> {
    profiling::scope!("build_substitutions");
    info!(
        "scoring {} cells x {} templates...",
        cells.len(),
        templates.len()
    );
    cells
        .par_iter()
        .map(|cell| {
            templates
                .templates
                .iter()
                .map(|t| Substitution::score(&cell.thumbnail, &t.thumbnail, variation))
                .collect()
        })
        .collect()
}
