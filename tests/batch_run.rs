//! End-to-end batch runs over real files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, Rgb, RgbImage};
use image_downsizer_lib::{
    BatchEvent, BatchProcessor, CancellationToken, ItemStatus, Job, ProcessingConfig, RunOutcome,
    RunSummary, SizeBudget,
};

/// Deterministic high-entropy image: compresses poorly, so budgets bite.
fn noise(width: u32, height: u32, mut seed: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |_, _| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let [r, g, b, _] = seed.to_le_bytes();
        Rgb([r, g, b])
    })
}

fn write_jpeg(path: &Path, image: &RgbImage, quality: u8) {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgb8)
        .unwrap();
    fs::write(path, bytes).unwrap();
}

fn write_small_png(path: &Path) {
    RgbImage::from_pixel(16, 16, Rgb([120, 40, 200])).save(path).unwrap();
}

/// Minimal single-layer-free RGB Photoshop document with a raw composite.
fn write_psd(path: &Path, image: &RgbImage) {
    let (width, height) = image.dimensions();
    let mut bytes = Vec::new();

    // File header
    bytes.extend_from_slice(b"8BPS");
    bytes.extend_from_slice(&1u16.to_be_bytes()); // version
    bytes.extend_from_slice(&[0u8; 6]); // reserved
    bytes.extend_from_slice(&3u16.to_be_bytes()); // channels
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&8u16.to_be_bytes()); // depth
    bytes.extend_from_slice(&3u16.to_be_bytes()); // RGB color mode

    // Color mode data, image resources
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(&0u32.to_be_bytes());

    // Layer and mask information: empty layer info (count 0), empty global mask
    bytes.extend_from_slice(&10u32.to_be_bytes());
    bytes.extend_from_slice(&2u32.to_be_bytes());
    bytes.extend_from_slice(&0i16.to_be_bytes());
    bytes.extend_from_slice(&0u32.to_be_bytes());

    // Image data: raw, planar
    bytes.extend_from_slice(&0u16.to_be_bytes());
    for channel in 0..3 {
        bytes.extend(image.pixels().map(|p| p[channel]));
    }

    fs::write(path, bytes).unwrap();
}

fn run(dir: &Path, budget: SizeBudget) -> (RunSummary, Vec<BatchEvent>) {
    let events = Mutex::new(Vec::new());
    let summary = BatchProcessor::new(ProcessingConfig::default()).run(
        &Job::new(dir, budget),
        &CancellationToken::new(),
        |event| events.lock().unwrap().push(event),
    );
    (summary, events.into_inner().unwrap())
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect();
    files.sort();
    files
}

fn assert_termination_law(summary: &RunSummary, budget: u64) {
    for item in &summary.items {
        match &item.status {
            ItemStatus::Downgraded { quality, attempts, size, within_budget, output_path, .. } => {
                assert!(*attempts <= 16);
                assert_eq!(*within_budget, *size <= budget);
                if quality.is_some() {
                    assert!(*within_budget || *quality == Some(10));
                }
                assert_eq!(fs::metadata(output_path).unwrap().len(), *size);
            }
            ItemStatus::NotDowngraded { size, .. } => assert!(*size <= budget),
            ItemStatus::Failed { error } => panic!("unexpected failure: {error}"),
        }
    }
}

#[test]
fn corrupt_file_fails_alone_and_the_rest_are_copied() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.png", "b.png", "c.png"] {
        write_small_png(&dir.path().join(name));
    }
    fs::write(dir.path().join("d.jpg"), b"\xFF\xD8\xFF\xE0 definitely not a jpeg").unwrap();

    let (summary, events) = run(dir.path(), SizeBudget::from_megabytes(1).unwrap());

    assert_eq!(summary.outcome, RunOutcome::SomeFailed { failed: 1 });
    assert_eq!(summary.succeeded(), 3);
    assert!(summary.items[..3]
        .iter()
        .all(|item| matches!(item.status, ItemStatus::NotDowngraded { .. })));
    assert!(matches!(summary.items[3].status, ItemStatus::Failed { .. }));

    let last_progress = events
        .iter()
        .rev()
        .find_map(|e| match e {
            BatchEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .unwrap();
    assert_eq!(last_progress.percentage, 100);

    let outputs = files_in(&dir.path().join("downsized"));
    assert_eq!(outputs.len(), 3);
    for (output, name) in outputs.iter().zip(["a", "b", "c"]) {
        assert_eq!(output.file_name().unwrap().to_string_lossy(), format!("{name}_downgraded.png"));
        assert_eq!(
            fs::read(output).unwrap(),
            fs::read(dir.path().join(format!("{name}.png"))).unwrap()
        );
    }
}

#[test]
fn nothing_to_process_leaves_no_trace() {
    let empty = tempfile::tempdir().unwrap();
    let (summary, events) = run(empty.path(), SizeBudget::from_megabytes(1).unwrap());
    assert_eq!(summary.outcome, RunOutcome::NothingToProcess);
    assert!(matches!(events.last(), Some(BatchEvent::Completed(_))));
    assert!(!empty.path().join("downsized").exists());

    let unsupported = tempfile::tempdir().unwrap();
    fs::write(unsupported.path().join("notes.txt"), "hello").unwrap();
    fs::write(unsupported.path().join("clip.webp"), "RIFF").unwrap();
    let (summary, _) = run(unsupported.path(), SizeBudget::from_megabytes(1).unwrap());
    assert_eq!(summary.outcome, RunOutcome::NothingToProcess);
    assert!(!unsupported.path().join("downsized").exists());
}

#[test]
fn oversized_jpegs_obey_the_termination_law_and_rerun_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    write_jpeg(&dir.path().join("one.jpg"), &noise(300, 200, 7), 100);
    write_jpeg(&dir.path().join("two.JPEG"), &noise(200, 300, 99), 95);

    let budget = SizeBudget::from_bytes(40_000).unwrap();
    let (summary, _) = run(dir.path(), budget);

    assert_eq!(summary.outcome, RunOutcome::AllSucceeded);
    assert_termination_law(&summary, budget.bytes());
    assert!(summary
        .items
        .iter()
        .all(|item| matches!(item.status, ItemStatus::Downgraded { .. })));

    let outputs = files_in(&dir.path().join("downsized"));
    assert_eq!(outputs.len(), 2);
    assert!(outputs[0].ends_with("one_downgraded.jpg"));
    assert!(outputs[1].ends_with("two_downgraded.JPEG"));

    // Feed the outputs back in as fresh inputs.
    let second = tempfile::tempdir().unwrap();
    for output in &outputs {
        fs::copy(output, second.path().join(output.file_name().unwrap())).unwrap();
    }
    let (rerun, _) = run(second.path(), budget);

    assert_eq!(rerun.failed(), 0);
    assert_eq!(rerun.processed(), 2);
    assert_termination_law(&rerun, budget.bytes());
}

#[test]
fn stop_after_k_items_processes_exactly_k() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..5 {
        write_small_png(&dir.path().join(format!("img{i}.png")));
    }

    let cancel = CancellationToken::new();
    let ui = cancel.clone();
    let k = 3;

    let summary = BatchProcessor::new(ProcessingConfig::default()).run(
        &Job::new(dir.path(), SizeBudget::from_megabytes(1).unwrap()),
        &cancel,
        |event| {
            if let BatchEvent::ItemFinished { index, .. } = event {
                if index + 1 == k {
                    ui.cancel();
                }
            }
        },
    );

    assert_eq!(summary.outcome, RunOutcome::StoppedByUser);
    assert_eq!(summary.processed(), k);
    assert_eq!(files_in(&dir.path().join("downsized")).len(), k);
}

#[test]
fn layered_document_is_flattened_then_reencoded() {
    let dir = tempfile::tempdir().unwrap();
    let psd = dir.path().join("poster.psd");
    write_psd(&psd, &noise(64, 64, 42));
    let original_psd = fs::read(&psd).unwrap();

    let (summary, _) = run(dir.path(), SizeBudget::from_bytes(1_000).unwrap());

    assert_eq!(summary.failed(), 0, "{:?}", summary.items);
    let item = &summary.items[0];
    assert!(item.normalized);
    assert_eq!(item.working_path, dir.path().join("poster.png"));

    // Flattened sibling next to the untouched original.
    assert!(dir.path().join("poster.png").is_file());
    assert_eq!(fs::read(&psd).unwrap(), original_psd);

    let outputs = files_in(&dir.path().join("downsized"));
    assert_eq!(outputs, vec![dir.path().join("downsized").join("poster_downgraded.png")]);
    match &item.status {
        ItemStatus::Downgraded { quality, within_budget, .. } => {
            // PNG has no quality knob: written once, accepted over budget.
            assert_eq!(*quality, None);
            assert!(!within_budget);
        }
        other => panic!("unexpected status: {other:?}"),
    }
}
