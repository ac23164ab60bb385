//! Runs against real files in a scratch directory.

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, Rgb, RgbImage};
use sequential_distance_field::files::{create_blank_target, default_target_path, start_file_run};
use sequential_distance_field::prelude::*;


fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sdf-file-host-{}-{}", std::process::id(), name));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// A dark square on a white background.
fn write_square_mask(dir: &Path) -> PathBuf {
    let mask = GrayImage::from_fn(32, 24, |x, y| {
        Luma([if (8..20).contains(&x) && (6..14).contains(&y) { 0 } else { 255 }])
    });

    let path = dir.join("square.png");
    mask.save(&path).unwrap();
    path
}

fn open_run(dir: &Path, config: GeneratorConfig) -> (PipelineRun<FileSource, FileTarget>, PathBuf) {
    let source_path = write_square_mask(dir);
    let target_path = default_target_path(&source_path);
    create_blank_target(&target_path, 32, 24).unwrap();

    let source = FileSource::open(&source_path).unwrap();
    let target = FileTarget::open(&target_path).unwrap();

    let request = GenerationRequest::new(source, target).with_config(config);
    (PipelineRun::start(request).unwrap(), target_path)
}

#[test]
fn generates_distance_file() {
    let dir = scratch_dir("generate");
    let (mut run, target_path) = open_run(&dir, GeneratorConfig::default());

    assert_eq!(run.run_to_end(&mut IgnoreProgress).unwrap(), RunStatus::Completed);
    assert!(!run.source().is_readable(), "source was not readable before the run");

    let field = image::open(&target_path).unwrap().to_luma8();
    assert_eq!(field.dimensions(), (32, 24));
    assert!(field.get_pixel(12, 10)[0] < 128, "center of the square is inside");
    assert!(field.get_pixel(0, 0)[0] > 128, "corner is outside");
    assert!(field.get_pixel(31, 23)[0] > field.get_pixel(21, 15)[0], "distance grows away from the square");

    drop(run);
    assert!(!dir.join("square_distance.png.partial").exists());
    assert!(FileTarget::open(&target_path).is_ok(), "lock is released with the run");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn cancelled_run_leaves_target_untouched() {
    let dir = scratch_dir("cancel");
    let (mut run, target_path) = open_run(&dir, GeneratorConfig::default());
    let blank = fs::read(&target_path).unwrap();

    let mut cancel_in_transform = |progress: &Progress| {
        if progress.phase == Phase::TransformingB { Control::Cancel } else { Control::Continue }
    };

    assert_eq!(run.run_to_end(&mut cancel_in_transform).unwrap(), RunStatus::Cancelled);
    assert_eq!(fs::read(&target_path).unwrap(), blank);

    drop(run);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn target_is_exclusive_while_open() {
    let dir = scratch_dir("exclusive");
    let path = dir.join("target.png");
    create_blank_target(&path, 4, 4).unwrap();

    let first = FileTarget::open(&path).unwrap();
    assert!(matches!(FileTarget::open(&path), Err(AssetError::Busy(_))));

    drop(first);
    assert!(FileTarget::open(&path).is_ok());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_files_are_reported() {
    let dir = scratch_dir("missing");

    assert!(matches!(FileSource::open(dir.join("nope.png")), Err(AssetError::NotFound(_))));
    assert!(matches!(FileTarget::open(dir.join("nope.png")), Err(AssetError::NotFound(_))));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn undecodable_source_is_an_error() {
    let dir = scratch_dir("garbage");
    let path = dir.join("garbage.png");
    fs::write(&path, b"definitely not a png").unwrap();

    assert!(matches!(FileSource::open(&path), Err(AssetError::Decode { .. })));

    fs::remove_dir_all(&dir).unwrap();
}

const LOCK_HOLDER_PATH: &str = "SDF_LOCK_HOLDER_PATH";

/// Runs only as a child process of `lock_of_a_dead_process_is_not_stale`:
/// locks the target and exits without unwinding, so no destructor runs.
#[test]
fn lock_holder_exits_without_cleanup() {
    if let Some(path) = std::env::var_os(LOCK_HOLDER_PATH) {
        let target = FileTarget::open(PathBuf::from(path)).unwrap();
        std::mem::forget(target);
        std::process::exit(0);
    }
}

#[test]
fn lock_of_a_dead_process_is_not_stale() {
    let dir = scratch_dir("dead-holder");
    let path = dir.join("target.png");
    create_blank_target(&path, 4, 4).unwrap();

    let status = std::process::Command::new(std::env::current_exe().unwrap())
        .args(["lock_holder_exits_without_cleanup", "--exact", "--test-threads=1"])
        .env(LOCK_HOLDER_PATH, &path)
        .status().unwrap();

    assert!(status.success());
    assert!(dir.join("target.png.lock").exists(), "the holder never cleaned up");
    assert!(FileTarget::open(&path).is_ok());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn leftover_lock_file_does_not_block() {
    let dir = scratch_dir("leftover");
    let path = dir.join("target.png");
    create_blank_target(&path, 4, 4).unwrap();
    fs::write(dir.join("target.png.lock"), b"").unwrap();

    let target = FileTarget::open(&path).unwrap();
    assert!(matches!(FileTarget::open(&path), Err(AssetError::Busy(_))));

    drop(target);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn colored_masks_are_thresholded_by_ntsc_luma() {
    let dir = scratch_dir("color");
    let source_path = dir.join("orange.png");

    // orange is just above one half in NTSC luma, below it in rec. 709
    let mask = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([255, 100, 0]) } else { Rgb([0, 0, 0]) });
    mask.save(&source_path).unwrap();

    let mut source = FileSource::open(&source_path).unwrap();
    source.set_readable(true).unwrap();
    let pixels = source.pixels().unwrap();
    assert!(pixels.luminance(0, 0) >= 0.5, "luminance was {}", pixels.luminance(0, 0));
    assert!(pixels.luminance(1, 0) < 0.5);
    drop(source);

    let target_path = default_target_path(&source_path);
    let mut run: PipelineRun<_, _> = start_file_run(&source_path, &target_path, GeneratorConfig::default()).unwrap();
    assert_eq!(run.run_to_end(&mut IgnoreProgress).unwrap(), RunStatus::Completed);
    drop(run);

    let field = image::open(&target_path).unwrap().to_luma8();
    assert!(field.get_pixel(0, 0)[0] > 128, "orange is outside the shape");
    assert!(field.get_pixel(1, 0)[0] < 128, "black is inside the shape");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn file_run_creates_missing_target() {
    let dir = scratch_dir("create");
    let source_path = write_square_mask(&dir);
    let target_path = dir.join("fresh.png");

    let mut run: PipelineRun<_, _> = start_file_run(&source_path, &target_path, GeneratorConfig::default()).unwrap();
    assert!(target_path.exists());
    assert_eq!(run.run_to_end(&mut IgnoreProgress).unwrap(), RunStatus::Completed);
    assert_eq!(image::open(&target_path).unwrap().to_luma8().dimensions(), (32, 24));

    drop(run);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn rejected_sources_leave_no_target_behind() {
    let dir = scratch_dir("rejected");
    let wide_path = dir.join("wide.png");
    GrayImage::new(65_536, 1).save(&wide_path).unwrap();

    let target_path = dir.join("wide_distance.png");
    let result: Result<PipelineRun<_, _>, _> = start_file_run(&wide_path, &target_path, GeneratorConfig::default());
    assert!(matches!(result, Err(PipelineError::SourceTooLarge { width: 65_536, height: 1 })));
    assert!(!target_path.exists());

    let result: Result<PipelineRun<_, _>, _> = start_file_run(dir.join("nope.png"), &target_path, GeneratorConfig::default());
    assert!(matches!(result, Err(PipelineError::Asset(AssetError::NotFound(_)))));
    assert!(!target_path.exists());

    fs::remove_dir_all(&dir).unwrap();
}
