use std::path::PathBuf;
use thiserror::Error;

/// fatal setup failures. once setup succeeds the pipeline is pure
/// arithmetic and nothing below returns an error.
#[derive(Debug, Error)]
pub enum SetupError {
    /// the template directory yielded no decodable images
    #[error("no usable templates found in {0}")]
    NoTemplates(PathBuf),

    /// partitioning emitted zero cells (image smaller than one top-level square)
    #[error("partitioning produced no cells (image too small for cell_size x 2^(level_count-1))")]
    NoCells,

    /// an input image could not be read or decoded
    #[error("failed to read image {path}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
