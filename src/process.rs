//! Batch orchestration.
//!
//! Takes a list of [`PhotoTask`]s and renders each one to a framed JPEG in
//! the configured output directory.
//!
//! ## Scheduling
//!
//! Photos are rendered **sequentially**: a full-resolution surface can be tens
//! of megabytes, and all renders share one [`Canvas`]. Only the initial
//! metadata load ([`load_tasks`]) runs in parallel with
//! [rayon](https://docs.rs/rayon), since it is small, independent work.
//!
//! ## Progress
//!
//! When a [`Sender`] is supplied, one [`ProgressStatus::Processing`] event is
//! sent immediately before each photo, in task order, and exactly one terminal
//! event (`Completed`, `Error` or `Cancelled`) after the last.
//!
//! ## Failures
//!
//! A photo that cannot be read, decoded, rendered or written is recorded in
//! [`BatchResult::errors`] with its name and the batch moves on. Only a missing
//! output directory stops the batch, before any photo is touched.
//!
//! ## Cancellation
//!
//! A [`CancelToken`] is checked before each photo. A write already in flight
//! always completes, so no partial files are left behind.

use crate::config::WatermarkConfig;
use crate::imaging::{
    Canvas, CaptionFonts, ImageBackend, render_watermark, supported_input_extensions,
};
use crate::metadata::MetadataRecord;
use crate::naming;
use crate::output::count_noun;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub use crate::imaging::UnitError;
pub use crate::types::{BatchProgress, ProgressStatus, TaskStatus};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("no output directory selected")]
    MissingOutputDir,
    #[error("{name}: {source}")]
    Unit {
        name: String,
        #[source]
        source: UnitError,
    },
}

/// File access used by the batch.
pub trait FileStore: Sync {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;

    /// Write `bytes` to `path`, creating parent directories as needed.
    fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()>;
}

/// The local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl FileStore for FsStore {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)
    }
}

/// One photo in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoTask {
    /// Display name, normally the file name; also the output file stem source.
    pub name: String,
    /// `None` marks a photo whose data never arrived.
    pub source: Option<PathBuf>,
    pub metadata: Option<MetadataRecord>,
    pub status: TaskStatus,
}

impl PhotoTask {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            source: Some(path),
            metadata: None,
            status: TaskStatus::Pending,
        }
    }

    /// A task without image data; it fails with [`UnitError::MissingSource`].
    pub fn without_source(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            metadata: None,
            status: TaskStatus::Pending,
        }
    }
}

/// Cooperative stop signal, shareable across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Optional collaborators for [`run_batch`].
#[derive(Debug, Default)]
pub struct BatchOptions<'a> {
    /// Caption fonts; `None` renders without captions.
    pub fonts: Option<&'a CaptionFonts>,
    pub progress: Option<Sender<BatchProgress>>,
    pub cancel: Option<CancelToken>,
}

/// Outcome of a whole batch.
#[derive(Debug)]
pub struct BatchResult {
    /// True when every photo was written.
    pub success: bool,
    pub processed_count: usize,
    pub total_count: usize,
    pub errors: Vec<ProcessError>,
    pub output_paths: Vec<PathBuf>,
    pub cancelled: bool,
}

impl BatchResult {
    /// Error list as `"{name}: {message}"` lines.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Expand CLI inputs into photo paths.
///
/// Files are kept as given, whatever their extension. Directories are walked
/// recursively for supported extensions (case-insensitive), sorted by path.
/// Hidden entries (leading `.`) inside a directory are skipped.
pub fn discover_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut photos = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            photos.push(input.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && is_supported_photo(e.path()))
            .map(|e| e.into_path())
            .collect();
        found.sort();
        debug!(dir = %input.display(), count = found.len(), "discovered photos");
        photos.extend(found);
    }
    photos
}

fn is_supported_photo(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| supported_input_extensions().contains(&ext.as_str()))
}

/// Build tasks for `paths` and read their metadata in parallel.
///
/// Order follows `paths`. Unreadable files still produce a task (status
/// [`TaskStatus::Error`]) so the batch reports them by name.
pub fn load_tasks(
    backend: &impl ImageBackend,
    store: &impl FileStore,
    paths: &[PathBuf],
) -> Vec<PhotoTask> {
    paths
        .par_iter()
        .map(|path| {
            let mut task = PhotoTask::new(path.clone());
            task.status = TaskStatus::Loading;
            match store.read(path) {
                Ok(bytes) => {
                    task.metadata = backend.read_metadata(&bytes).ok();
                    task.status = TaskStatus::Loaded;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot read photo");
                    task.status = TaskStatus::Error;
                }
            }
            task
        })
        .collect()
}

/// Render every task to `config.output_dir`.
pub fn run_batch(
    backend: &impl ImageBackend,
    store: &impl FileStore,
    tasks: &mut [PhotoTask],
    config: &WatermarkConfig,
    options: BatchOptions<'_>,
) -> BatchResult {
    let total = tasks.len();
    let mut result = BatchResult {
        success: true,
        processed_count: 0,
        total_count: total,
        errors: Vec::new(),
        output_paths: Vec::new(),
        cancelled: false,
    };

    if config.output_dir_missing() {
        result.success = false;
        result.errors.push(ProcessError::MissingOutputDir);
        return result;
    }

    let send = |event: BatchProgress| {
        if let Some(tx) = &options.progress {
            // A dropped receiver only means nobody is listening
            let _ = tx.send(event);
        }
    };

    info!(total, output = %config.output_dir.display(), "starting batch");
    let mut canvas = Canvas::new();
    let mut last_timestamp = 0u64;
    let mut attempted = 0;

    for (i, task) in tasks.iter_mut().enumerate() {
        if options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            result.cancelled = true;
            break;
        }

        send(BatchProgress {
            current: i + 1,
            total,
            current_file_name: task.name.clone(),
            status: ProgressStatus::Processing,
            message: None,
        });
        attempted = i + 1;

        // Strictly increasing, so same-named photos never collide
        let timestamp = naming::now_millis().max(last_timestamp + 1);
        last_timestamp = timestamp;

        task.status = TaskStatus::Loading;
        match process_unit(backend, store, &mut canvas, task, config, options.fonts, timestamp) {
            Ok(path) => {
                debug!(name = %task.name, path = %path.display(), "written");
                task.status = TaskStatus::Loaded;
                result.processed_count += 1;
                result.output_paths.push(path);
            }
            Err(source) => {
                warn!(name = %task.name, error = %source, "photo failed");
                task.status = TaskStatus::Error;
                result.errors.push(ProcessError::Unit {
                    name: task.name.clone(),
                    source,
                });
            }
        }
    }

    result.success = result.errors.is_empty() && !result.cancelled;
    let (status, message) = if result.cancelled {
        (
            ProgressStatus::Cancelled,
            format!(
                "Cancelled after {attempted} of {}",
                count_noun(total, "photo")
            ),
        )
    } else if result.errors.is_empty() {
        (
            ProgressStatus::Completed,
            format!("Generated {}", count_noun(result.processed_count, "photo")),
        )
    } else {
        (
            ProgressStatus::Error,
            format!("Finished with {}", count_noun(result.errors.len(), "error")),
        )
    };
    info!(
        processed = result.processed_count,
        errors = result.errors.len(),
        cancelled = result.cancelled,
        "batch finished"
    );
    send(BatchProgress {
        current: attempted,
        total,
        current_file_name: String::new(),
        status,
        message: Some(message),
    });

    result
}

fn process_unit(
    backend: &impl ImageBackend,
    store: &impl FileStore,
    canvas: &mut Canvas,
    task: &PhotoTask,
    config: &WatermarkConfig,
    fonts: Option<&CaptionFonts>,
    timestamp: u64,
) -> Result<PathBuf, UnitError> {
    let source = task.source.as_ref().ok_or(UnitError::MissingSource)?;
    let bytes = store.read(source).map_err(|e| UnitError::Io {
        path: source.clone(),
        source: e,
    })?;

    let read_now;
    let metadata = match &task.metadata {
        Some(meta) => Some(meta),
        None => {
            read_now = backend.read_metadata(&bytes).ok();
            read_now.as_ref()
        }
    };

    let rendered = render_watermark(backend, canvas, &bytes, metadata, config, fonts)?;

    let file_name = naming::output_file_name(&task.name, timestamp);
    let path = naming::join_output_path(&config.output_dir, &file_name);
    store
        .write(&path, &rendered.jpeg)
        .map_err(|e| UnitError::Io {
            path: path.clone(),
            source: e,
        })?;
    Ok(path)
}
