use std::time::Duration;

use anyhow::Result;
use log::info;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::anneal::Annealer;
use crate::config::Config;
use crate::gray::GrayMap;
use crate::neighbors::build_neighbors;
use crate::partition::{partition, Partition};
use crate::score::build_substitutions;
use crate::template::TemplateLibrary;

/// final decision for one cell: where it sits, which template fills it and
/// how much the template is brightness-shifted. this is the whole result
/// surface a renderer needs.
#[derive(Clone, Copy, Debug)]
pub struct CellAssignment {
    pub x: u32,
    pub y: u32,
    pub size: u32,
    pub template_index: usize,
    pub brightness: i32,
}

/// the generated mosaic: source image, partition geometry and per-cell
/// assignments. in division mode (diagnostic) no templates are loaded and
/// `assignments` stays empty.
#[derive(Debug)]
pub struct Mosaic {
    pub input: GrayMap,
    pub partition: Partition,
    pub templates: Option<TemplateLibrary>,
    pub assignments: Vec<CellAssignment>,
}

impl Mosaic {
    /// run the full pipeline: load inputs, partition, score, build the
    /// neighbor graph, anneal, emit assignments. any setup failure aborts;
    /// past setup the pipeline cannot fail.
    pub fn generate(config: &Config, seed: u64) -> Result<Self> {
        profiling::scope!("Mosaic::generate");
        let input = GrayMap::open(&config.input)?;
        let detail = match &config.detail_image {
            Some(path) => Some(GrayMap::open(path)?),
            None => None,
        };

        if config.show_division {
            let partition = partition(
                &input,
                detail.as_ref(),
                config.cell_size,
                config.level_count,
                config.division_threshold,
                config.thumbnail_size(),
            )?;
            return Ok(Self {
                input,
                partition,
                templates: None,
                assignments: Vec::new(),
            });
        }

        let templates = TemplateLibrary::load(&config.templates_dir, config.thumbnail_size())?;
        let partition = partition(
            &input,
            detail.as_ref(),
            config.cell_size,
            config.level_count,
            config.division_threshold,
            config.thumbnail_size(),
        )?;

        let substitutions =
            build_substitutions(&partition.cells, &templates, config.brightness_variation);
        let neighbors = build_neighbors(&partition.cells, config.duplicate_distance);

        let rng = Pcg32::seed_from_u64(seed);
        let mut annealer = Annealer::new(&substitutions, &neighbors, templates.len(), rng);
        annealer.run(Duration::from_secs(config.generation_time));
        let assignment = annealer.into_assignment();

        let assignments: Vec<CellAssignment> = partition
            .cells
            .iter()
            .zip(&assignment)
            .zip(&substitutions)
            .map(|((cell, &template_index), subs)| CellAssignment {
                x: cell.x,
                y: cell.y,
                size: cell.size,
                template_index,
                brightness: subs[template_index].brightness,
            })
            .collect();

        info!("assigned {} cells", assignments.len());
        Ok(Self {
            input,
            partition,
            templates: Some(templates),
            assignments,
        })
    }
}
