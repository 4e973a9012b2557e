use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;

use crate::error::SetupError;
use crate::gray::GrayMap;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// one candidate tile: the decoded grayscale image plus a square thumbnail
/// at cell resolution. the thumbnail is what scoring compares against;
/// the full image is what the renderer resamples into the output.
#[derive(Debug)]
pub struct Template {
    pub path: PathBuf,
    pub image: GrayMap,
    pub thumbnail: GrayMap,
}

impl Template {
    fn load(path: &Path, thumbnail_size: u32) -> Result<Self, SetupError> {
        let image = GrayMap::open(path)?;
        let thumbnail = image.scaled(thumbnail_size, thumbnail_size);
        Ok(Self {
            path: path.to_path_buf(),
            image,
            thumbnail,
        })
    }
}

/// immutable, stable-order template list. the position in `templates`
/// is the template index the optimizer assigns to cells.
#[derive(Debug)]
pub struct TemplateLibrary {
    pub templates: Vec<Template>,
}

impl TemplateLibrary {
    /// scan `dir` recursively, decode every image file, derive thumbnails.
    /// undecodable files are skipped with a warning; an empty result is fatal.
    pub fn load(dir: &Path, thumbnail_size: u32) -> Result<Self, SetupError> {
        profiling::scope!("TemplateLibrary::load");
        info!("loading templates from {}", dir.display());

        let mut paths = Vec::new();
        collect_image_paths(dir, &mut paths);
        // sorted walk order keeps template indices stable across runs
        paths.sort();

        let templates: Vec<Template> = paths
            .par_iter()
            .filter_map(|path| match Template::load(path, thumbnail_size) {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!("skipping template: {e}");
                    None
                }
            })
            .collect();

        info!("templates: {}", templates.len());
        if templates.is_empty() {
            return Err(SetupError::NoTemplates(dir.to_path_buf()));
        }
        Ok(Self { templates })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn collect_image_paths(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!("cannot read {}: {e}", dir.display());
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_image_paths(&path, out);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        {
            out.push(path);
        }
    }
}
