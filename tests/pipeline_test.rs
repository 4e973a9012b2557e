use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use image::GrayImage;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use photomosaic::{
    build_neighbors, render_division, render_mosaic, Annealer, Cell, Config, GrayMap, Mosaic,
    SetupError, Substitution,
};

/// a flat grid of cells, a handful of interchangeable
/// templates and a duplicate distance covering only touching cells. with
/// enough budget the annealer must eliminate every same-template pair of
/// touching cells (a proper coloring of the grid exists and is the unique
/// cost-0 state here).
#[test]
fn grid_coloring_removes_adjacent_repetition() {
    let cells: Vec<Cell> = (0..16)
        .map(|i| Cell {
            x: (i % 4) * 10,
            y: (i / 4) * 10,
            size: 10,
            thumbnail: GrayMap::filled(1, 1, 0),
        })
        .collect();
    // distance threshold 1: only gap-0 (touching) cells are linked
    let neighbors = build_neighbors(&cells, 1);

    // four templates; each cell mildly prefers the one a 2x2 block pattern
    // gives it, and that pattern never repeats across touching cells.
    // conflict weight (10000) dominates the preference gap (5000).
    let substitutions: Vec<Vec<Substitution>> = cells
        .iter()
        .map(|c| {
            let preferred = (2 * ((c.y / 10) % 2) + (c.x / 10) % 2) as usize;
            (0..4)
                .map(|t| Substitution {
                    quality: if t == preferred { 0 } else { 5000 },
                    brightness: 0,
                })
                .collect()
        })
        .collect();

    let rng = Pcg32::seed_from_u64(7);
    let mut annealer = Annealer::new(&substitutions, &neighbors, 4, rng);
    annealer.run(Duration::from_millis(500));

    let assignment = annealer.assignment();
    for (i, row) in neighbors.iter().enumerate() {
        for n in row {
            assert_ne!(
                assignment[i], assignment[n.cell],
                "touching cells {i} and {} share a template",
                n.cell
            );
        }
    }
    // bookkeeping stayed exact across the whole run
    assert_eq!(annealer.cost(), annealer.total_cost());
}

fn fresh_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn config_for(dir: &PathBuf) -> Config {
    serde_json::from_str(&format!(
        r#"{{
            "input": "{}/input.png",
            "templates_dir": "{}/tiles",
            "generation_time": 1,
            "cell_size": 10,
            "level_count": 2,
            "division_threshold": 10.0,
            "duplicate_distance": 2
        }}"#,
        dir.display(),
        dir.display()
    ))
    .unwrap()
}

fn write_pipeline_inputs(dir: &PathBuf) {
    // source: half dark, half bright, so some squares subdivide
    GrayImage::from_fn(60, 60, |x, _| {
        if x < 30 {
            image::Luma([40])
        } else {
            image::Luma([220])
        }
    })
    .save(dir.join("input.png"))
    .unwrap();

    let tiles = dir.join("tiles");
    fs::create_dir_all(&tiles).unwrap();
    for (name, value) in [("dark.png", 40u8), ("mid.png", 128), ("bright.png", 220)] {
        GrayImage::from_pixel(24, 24, image::Luma([value]))
            .save(tiles.join(name))
            .unwrap();
    }
}

#[test]
fn end_to_end_generate_and_render() {
    let dir = fresh_dir("photomosaic_e2e");
    write_pipeline_inputs(&dir);
    let config = config_for(&dir);

    let mosaic = Mosaic::generate(&config, 42).unwrap();

    // every cell got exactly one assignment with a valid template index
    // and a brightness shift inside the configured clamp
    assert_eq!(mosaic.assignments.len(), mosaic.partition.cells.len());
    assert!(!mosaic.assignments.is_empty());
    for a in &mosaic.assignments {
        assert!(a.template_index < 3);
        assert!(a.brightness >= -200 / 3 && a.brightness <= 200);
    }

    // 60x60 source, 20px top-level squares: the canvas covers the 3x3 grid
    let out = render_mosaic(&mosaic, 1);
    assert_eq!((out.width(), out.height()), (60, 60));
}

#[test]
fn division_mode_skips_templates_and_search() {
    let dir = fresh_dir("photomosaic_division");
    write_pipeline_inputs(&dir);
    let mut config = config_for(&dir);
    config.show_division = true;
    // division mode must not even look at the template directory
    config.templates_dir = dir.join("does_not_exist");

    let mosaic = Mosaic::generate(&config, 42).unwrap();
    assert!(mosaic.templates.is_none());
    assert!(mosaic.assignments.is_empty());
    assert!(!mosaic.partition.cells.is_empty());

    let out = render_division(&mosaic, 1);
    assert_eq!((out.width(), out.height()), (60, 60));
}

#[test]
fn missing_templates_is_fatal() {
    let dir = fresh_dir("photomosaic_no_templates");
    write_pipeline_inputs(&dir);
    fs::remove_dir_all(dir.join("tiles")).unwrap();
    fs::create_dir_all(dir.join("tiles")).unwrap();
    let config = config_for(&dir);

    let err = Mosaic::generate(&config, 42).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SetupError>(),
        Some(SetupError::NoTemplates(_))
    ));
}

#[test]
fn unreadable_input_is_fatal() {
    let dir = fresh_dir("photomosaic_bad_input");
    write_pipeline_inputs(&dir);
    let mut config = config_for(&dir);
    config.input = dir.join("missing.png");

    let err = Mosaic::generate(&config, 42).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SetupError>(),
        Some(SetupError::Image { .. })
    ));
}
