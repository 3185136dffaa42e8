use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::core::{
    display_name, BatchEvent, CancellationToken, ImageTask, ItemReport, ItemStatus, Job, LogLevel,
    ProcessingConfig, ProgressState, RunSummary,
};
use crate::processing::normalize::{flattened_path, normalize};
use crate::processing::reencode::{ImageCrateEncoder, QualityEncoder, ReencodeOutcome, Reencoder};
use crate::utils::{list_images, OutputDir};

/// Drives one batch run: enumerate, flatten, re-encode, report.
///
/// Items are handled strictly one after another so only one decoded image is held
/// in memory at a time and progress only ever moves forward.
pub struct BatchProcessor<E = ImageCrateEncoder> {
    reencoder: Reencoder<E>,
    progress: Arc<ProgressState>,
}

impl BatchProcessor<ImageCrateEncoder> {
    pub fn new(config: ProcessingConfig) -> Self {
        Self::with_reencoder(Reencoder::new(config), Arc::new(ProgressState::new()))
    }
}

impl<E: QualityEncoder> BatchProcessor<E> {
    pub fn with_reencoder(reencoder: Reencoder<E>, progress: Arc<ProgressState>) -> Self {
        Self { reencoder, progress }
    }

    /// Shared view of the progress counters.
    pub fn progress(&self) -> Arc<ProgressState> {
        Arc::clone(&self.progress)
    }

    fn config(&self) -> &ProcessingConfig {
        self.reencoder.config()
    }

    /// Processes every supported image in the job's directory.
    ///
    /// `cancel` is checked before each item; a stop request never interrupts the file
    /// in flight. Events go to `emit` in order and [`BatchEvent::Completed`] is always
    /// the last one. Item failures are recorded in the summary, never returned.
    pub fn run(
        &self,
        job: &Job,
        cancel: &CancellationToken,
        emit: impl Fn(BatchEvent),
    ) -> RunSummary {
        let emit: &dyn Fn(BatchEvent) = &emit;

        let images = match list_images(&job.source_directory) {
            Ok(images) => images,
            Err(e) => {
                log_line(emit, LogLevel::Error, e.to_string());
                Vec::new()
            }
        };

        if images.is_empty() {
            log_line(emit, LogLevel::Info, "No images found to process.".to_string());
            return self.finish(RunSummary::nothing_to_process(), cancel, emit);
        }

        let total = images.len();
        self.progress.begin(total);
        emit(BatchEvent::Started { total });
        log_line(emit, LogLevel::Info, format!("Total images to process: {total}"));

        let mut output_dir = OutputDir::new(job.output_directory(self.config()));
        let mut items = Vec::with_capacity(total);
        let mut stopped = false;

        for (index, path) in images.into_iter().enumerate() {
            if cancel.is_cancelled() {
                log_line(emit, LogLevel::Warn, "Process stopped by user.".to_string());
                stopped = true;
                break;
            }

            let report = self.process_item(path, job.budget.bytes(), &mut output_dir, emit);
            emit(BatchEvent::ItemFinished { index, report: report.clone() });
            items.push(report);

            let progress = self.progress.advance();
            debug!("Progress: {}/{} ({}%)", progress.completed, progress.total, progress.percentage);
            emit(BatchEvent::Progress(progress));
        }

        let summary = RunSummary::from_items(total, items, stopped);
        self.finish(summary, cancel, emit)
    }

    /// Flattens and re-encodes one file, turning any failure into a failed report.
    fn process_item(
        &self,
        path: PathBuf,
        max_bytes: u64,
        output_dir: &mut OutputDir,
        emit: &dyn Fn(BatchEvent),
    ) -> ItemReport {
        let mut task = ImageTask::new(path);
        let name = task.file_name();

        if let Some(target) = flattened_path(&task.original_path, &self.config().flatten_extension) {
            if target.exists() {
                log_line(emit, LogLevel::Warn, format!(
                    "{} already exists and will be replaced by the flattened {name}",
                    display_name(&target)
                ));
            }
        }

        match normalize(&task.original_path, &self.config().flatten_extension) {
            Ok(working_path) => task.set_working_path(working_path),
            Err(e) => {
                log_line(emit, LogLevel::Error, format!("Error processing PSD image {name}: {e}"));
                return report(task, ItemStatus::Failed { error: e.to_string() });
            }
        }

        if task.normalized {
            log_line(emit, LogLevel::Info, format!(
                "Flattened {name} into {}", display_name(&task.working_path)
            ));
        }

        let dir_existed = output_dir.path().is_dir();
        let result = self.reencoder.reencode(&task.working_path, max_bytes, output_dir);

        if !dir_existed && output_dir.path().is_dir() {
            log_line(emit, LogLevel::Info, format!(
                "Output folder created at: {}", output_dir.path().display()
            ));
        }

        let status = match result {
            Ok(ReencodeOutcome::NotDowngraded { output_path, size }) => {
                log_line(emit, LogLevel::Info, format!(
                    "Image does not exceed max size and was not downgraded: {name}"
                ));
                ItemStatus::NotDowngraded { output_path, size }
            }
            Ok(ReencodeOutcome::Downgraded {
                output_path,
                original_size,
                last,
                attempts,
                within_budget,
                quality_controlled,
            }) => {
                let (level, message) = match (quality_controlled, within_budget) {
                    (true, true) => (LogLevel::Info, format!(
                        "Image saved at: {} with quality: {}", output_path.display(), last.quality
                    )),
                    (true, false) => (LogLevel::Warn, format!(
                        "Image saved at: {} with quality: {} but is still {} bytes (budget {} bytes)",
                        output_path.display(), last.quality, last.resulting_size_bytes, max_bytes
                    )),
                    (false, _) => (LogLevel::Info, format!(
                        "Image saved at: {} ({} bytes, format has no quality setting)",
                        output_path.display(), last.resulting_size_bytes
                    )),
                };
                log_line(emit, level, message);

                ItemStatus::Downgraded {
                    output_path,
                    quality: quality_controlled.then_some(last.quality),
                    attempts,
                    original_size,
                    size: last.resulting_size_bytes,
                    within_budget,
                }
            }
            Err(e) => {
                log_line(emit, LogLevel::Error, format!("Error processing image {name}: {e}"));
                ItemStatus::Failed { error: e.to_string() }
            }
        };

        report(task, status)
    }

    /// Resets shared state and emits the final event.
    fn finish(
        &self,
        summary: RunSummary,
        cancel: &CancellationToken,
        emit: &dyn Fn(BatchEvent),
    ) -> RunSummary {
        self.progress.reset();
        cancel.reset();

        debug!("{}", summary.message());
        emit(BatchEvent::Completed(summary.clone()));
        summary
    }
}

fn report(task: ImageTask, status: ItemStatus) -> ItemReport {
    ItemReport {
        original_path: task.original_path,
        working_path: task.working_path,
        normalized: task.normalized,
        status,
    }
}

/// Sends a status line to the event sink.
///
/// The sink owns presentation; tracing only keeps a debug trail of the same lines.
fn log_line(emit: &dyn Fn(BatchEvent), level: LogLevel, message: String) {
    debug!(?level, "{message}");
    emit(BatchEvent::Log { level, message });
}
