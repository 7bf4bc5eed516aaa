use std::path::{Path, PathBuf};
use std::time::Duration;

use pixlink_codec::image::{self, DynamicImage, GrayImage};
use pixlink_codec::{prepare, Layout};
use pixlink_transport::LinkTransport;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cancel::CancelFlag;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::exchange::exchange;

/// Appended to the input stem to name each result file.
pub const OUTPUT_SUFFIX: &str = "_processed";

/// Loads input images for the batch driver.
pub trait ImageSource {
    fn load(&mut self, path: &Path) -> Result<DynamicImage, ItemError>;
}

/// Persists reconstructed replies; returns where the result went.
pub trait ResultSink {
    fn persist(&mut self, input: &Path, image: &GrayImage) -> Result<PathBuf, ItemError>;
}

/// Failure of a single batch item.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to save {path}: {source}")]
    Persist {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error(transparent)]
    Exchange(#[from] SessionError),
}

/// Where a batch item ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    Completed {
        output: PathBuf,
        received: usize,
        discarded: usize,
        elapsed_ms: u64,
    },
    Failed {
        error: String,
    },
    /// Not attempted because an earlier item failed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub input: PathBuf,
    #[serde(flatten)]
    pub status: ItemStatus,
}

/// Per-item outcome of a batch run, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    /// Index of the item that aborted the batch.
    pub aborted_at: Option<usize>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.status, ItemStatus::Completed { .. }))
            .count()
    }
}

/// The batch stopped at the first failing item.
///
/// Items before `index` were completed and persisted; the report marks the
/// failing item and everything after it as skipped.
#[derive(Debug, thiserror::Error)]
#[error("batch aborted at item {index} ({input}): {source}")]
pub struct BatchError {
    pub index: usize,
    pub input: PathBuf,
    pub report: BatchReport,
    #[source]
    pub source: ItemError,
}

/// Runs one exchange per input image, in order, on a single owned link.
///
/// Fail-fast: the first failure aborts the batch, since a remote unit that
/// missed a frame would feed stale bytes into the next exchange.
pub struct BatchDriver<L, S> {
    link: L,
    store: S,
    layout: Layout,
    config: SessionConfig,
    cancel: Option<CancelFlag>,
}

impl<L: LinkTransport, S: ImageSource + ResultSink> BatchDriver<L, S> {
    pub fn new(link: L, store: S, layout: Layout, config: SessionConfig) -> Self {
        Self {
            link,
            store,
            layout,
            config,
            cancel: None,
        }
    }

    /// Attach a cancellation flag shared by every exchange in the batch.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn run<P: AsRef<Path>>(&mut self, inputs: &[P]) -> Result<BatchReport, BatchError> {
        let mut report = BatchReport::default();
        info!(items = inputs.len(), "starting batch");

        for (index, input) in inputs.iter().enumerate() {
            let input = input.as_ref();
            debug!(index, input = %input.display(), "processing batch item");

            match self.process(input) {
                Ok(status) => report.items.push(BatchItem {
                    input: input.to_path_buf(),
                    status,
                }),
                Err(source) => {
                    warn!(index, input = %input.display(), error = %source, "aborting batch");
                    report.items.push(BatchItem {
                        input: input.to_path_buf(),
                        status: ItemStatus::Failed {
                            error: source.to_string(),
                        },
                    });
                    report
                        .items
                        .extend(inputs[index + 1..].iter().map(|rest| BatchItem {
                            input: rest.as_ref().to_path_buf(),
                            status: ItemStatus::Skipped,
                        }));
                    report.aborted_at = Some(index);
                    return Err(BatchError {
                        index,
                        input: input.to_path_buf(),
                        report,
                        source,
                    });
                }
            }
        }

        info!(completed = report.completed(), "batch complete");
        Ok(report)
    }

    fn process(&mut self, input: &Path) -> Result<ItemStatus, ItemError> {
        let source = self.store.load(input)?;
        let buffer = prepare(&source, &self.layout);
        let done = exchange(
            &mut self.link,
            &buffer,
            &self.layout,
            &self.config,
            self.cancel.as_ref(),
        )?;
        let output = self.store.persist(input, &done.image)?;
        Ok(ItemStatus::Completed {
            output,
            received: done.stats.received,
            discarded: done.stats.discarded,
            elapsed_ms: duration_ms(done.stats.elapsed),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Release the driver, handing the link and store back to the caller.
    pub fn into_parts(self) -> (L, S) {
        (self.link, self.store)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Reads inputs from disk and writes results into one output directory.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    output_dir: PathBuf,
}

impl FsImageStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<output_dir>/<input stem>_processed.png`.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        self.output_dir.join(format!("{stem}{OUTPUT_SUFFIX}.png"))
    }
}

impl ImageSource for FsImageStore {
    fn load(&mut self, path: &Path) -> Result<DynamicImage, ItemError> {
        image::open(path).map_err(|source| ItemError::Load {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ResultSink for FsImageStore {
    fn persist(&mut self, input: &Path, image: &GrayImage) -> Result<PathBuf, ItemError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| ItemError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;
        let output = self.output_path_for(input);
        image.save(&output).map_err(|source| ItemError::Persist {
            path: output.clone(),
            source,
        })?;
        debug!(output = %output.display(), "saved reply image");
        Ok(output)
    }
}
