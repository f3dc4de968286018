//! Pipeline execution implementation.

use super::{CancellationToken, FailureStage, FileFailure, PipelineReport};
use crate::core::comparator::{select, FingerprintedFile, SimilarityGroup, SimilarityGrouper, DEFAULT_THRESHOLD};
use crate::core::hasher::{HashAlgorithmKind, HasherConfig, ImageHasher};
use crate::core::metadata::{CreationTimeProvider, FileTimes};
use crate::core::scanner::{MediaFile, MediaScanner, ScanConfig, WalkDirScanner};
use crate::core::sink::GroupSink;
use crate::error::{MediaSieveError, PipelineError};
use crate::events::{
    null_sender, Event, EventSender, GroupEvent, HashEvent, HashProgress, PipelineEvent,
    PipelinePhase, SinkEvent,
};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directories to scan
    pub paths: Vec<PathBuf>,
    /// Hash algorithm to use
    pub algorithm: HashAlgorithmKind,
    pub hash_size: u32,
    /// Grouping threshold (lower = stricter)
    pub threshold: u32,
    /// Worker threads; `None` means [`default_workers`]
    pub workers: Option<usize>,
    /// Hash and group images; when off every file is kept as-is
    pub dedupe: bool,
    /// Drop files that fail to hash instead of keeping them
    pub skip_invalid: bool,
    /// Scanner configuration
    pub scan_config: ScanConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            algorithm: HashAlgorithmKind::Perceptual,
            hash_size: 8,
            threshold: DEFAULT_THRESHOLD,
            workers: None,
            dedupe: true,
            skip_invalid: false,
            scan_config: ScanConfig::default(),
        }
    }
}

/// One CPU is left free for the caller and the event consumer.
pub fn default_workers() -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or_else(|_| {
            warn!("Failed to determine available parallelism, falling back to 1");
            1
        });
    available.saturating_sub(1).max(1)
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    scanner: Option<Box<dyn MediaScanner>>,
    hasher: Option<Box<dyn ImageHasher>>,
    times: Option<Box<dyn CreationTimeProvider>>,
    cancel: CancellationToken,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            scanner: None,
            hasher: None,
            times: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Add directories to scan
    pub fn paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.paths = paths;
        self
    }

    /// Set the hash algorithm
    pub fn algorithm(mut self, algorithm: HashAlgorithmKind) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    /// Set the grouping threshold
    pub fn threshold(mut self, threshold: u32) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Override the worker count
    pub fn workers(mut self, workers: Option<usize>) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn dedupe(mut self, dedupe: bool) -> Self {
        self.config.dedupe = dedupe;
        self
    }

    pub fn skip_invalid(mut self, skip: bool) -> Self {
        self.config.skip_invalid = skip;
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.scan_config.recursive = recursive;
        self
    }

    pub fn include_videos(mut self, include: bool) -> Self {
        self.config.scan_config.include_videos = include;
        self
    }

    /// Replace the filesystem scanner
    pub fn scanner(mut self, scanner: Box<dyn MediaScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Replace the hasher built from `algorithm`
    pub fn hasher(mut self, hasher: Box<dyn ImageHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Creation-time source for selection (defaults to filesystem times)
    pub fn creation_times(mut self, times: Box<dyn CreationTimeProvider>) -> Self {
        self.times = Some(times);
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        let config = self.config;
        let scanner = self
            .scanner
            .unwrap_or_else(|| Box::new(WalkDirScanner::new(config.scan_config.clone())));
        let hasher = self.hasher.unwrap_or_else(|| {
            HasherConfig::new()
                .algorithm(config.algorithm)
                .hash_size(config.hash_size)
                .build()
        });

        Pipeline {
            scanner,
            hasher,
            times: self.times.unwrap_or_else(|| Box::new(FileTimes)),
            cancel: self.cancel,
            config,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-file result of the worker pool
struct Outcome {
    file: FingerprintedFile,
    /// Whether the file went through the hasher
    hashed: bool,
    error: Option<String>,
}

/// The dedupe pipeline
pub struct Pipeline {
    config: PipelineConfig,
    scanner: Box<dyn MediaScanner>,
    hasher: Box<dyn ImageHasher>,
    times: Box<dyn CreationTimeProvider>,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Handle for cancelling this pipeline from another thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn workers(&self) -> usize {
        self.config.workers.unwrap_or_else(default_workers).max(1)
    }

    /// Run the pipeline without events
    pub fn run(&self, sinks: &mut [Box<dyn GroupSink>]) -> Result<PipelineReport, MediaSieveError> {
        self.run_with_events(sinks, &null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(
        &self,
        sinks: &mut [Box<dyn GroupSink>],
        events: &EventSender,
    ) -> Result<PipelineReport, MediaSieveError> {
        let start_time = Instant::now();
        let mut failures = Vec::new();

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Scanning
        events.phase(PipelinePhase::Scanning);

        let scan_result = self.scanner.scan_with_events(&self.config.paths, events);
        for error in &scan_result.errors {
            failures.push(FileFailure {
                path: error.path().to_path_buf(),
                stage: FailureStage::Scan,
                reason: error.to_string(),
                excluded: true,
            });
        }

        let files = scan_result.files;
        if files.is_empty() {
            return Err(PipelineError::NoInput {
                paths: self.config.paths.clone(),
            }
            .into());
        }
        let processed = files.len();

        // Phase 2: Hashing
        events.phase(PipelinePhase::Hashing);

        let mut outcomes = self.hash_all(&files, events)?;
        outcomes.sort_by(|a, b| a.file.path.cmp(&b.file.path));

        let mut hashed = Vec::new();
        let mut passthrough = Vec::new();
        for outcome in outcomes {
            if let Some(reason) = outcome.error {
                failures.push(FileFailure {
                    path: outcome.file.path.clone(),
                    stage: FailureStage::Hash,
                    reason,
                    excluded: self.config.skip_invalid,
                });
            }
            if outcome.hashed {
                hashed.push(outcome.file);
            } else {
                passthrough.push(outcome.file);
            }
        }

        // Phase 3: Grouping
        events.phase(PipelinePhase::Grouping);
        events.send(Event::Group(GroupEvent::Started {
            distinct_fingerprints: SimilarityGrouper::distinct_fingerprints(&hashed),
        }));

        let grouper = SimilarityGrouper::new(self.config.threshold).skip_invalid(self.config.skip_invalid);
        let mut groups = grouper.group(&hashed);
        for file in passthrough {
            groups.push(SimilarityGroup::singleton(groups.len(), file));
        }

        let selections: Vec<_> = groups.iter().filter_map(select).collect();
        let removed: usize = selections.iter().map(|s| s.removed.len()).sum();

        events.send(Event::Group(GroupEvent::Completed {
            groups: selections.len(),
            removed,
        }));

        // Phase 4: Delivering
        events.phase(PipelinePhase::Delivering);
        events.send(Event::Sink(SinkEvent::Started {
            selections: selections.len(),
        }));

        for (i, selection) in selections.iter().enumerate() {
            for sink in sinks.iter_mut() {
                if let Err(e) = sink.accept(selection) {
                    warn!(sink = sink.name(), path = %e.path().display(), "{e}");
                    events.send(Event::Sink(SinkEvent::Failed {
                        path: e.path().to_path_buf(),
                        message: e.to_string(),
                    }));
                    failures.push(FileFailure {
                        path: e.path().to_path_buf(),
                        stage: FailureStage::Deliver,
                        reason: format!("{}: {}", sink.name(), e),
                        excluded: false,
                    });
                }
            }
            events.send(Event::Sink(SinkEvent::Progress {
                completed: i + 1,
                total: selections.len(),
            }));
        }

        for sink in sinks.iter_mut() {
            if let Err(e) = sink.finish() {
                warn!(sink = sink.name(), "finishing failed: {e}");
                events.send(Event::Sink(SinkEvent::Failed {
                    path: e.path().to_path_buf(),
                    message: e.to_string(),
                }));
                failures.push(FileFailure {
                    path: e.path().to_path_buf(),
                    stage: FailureStage::Deliver,
                    reason: format!("{}: {}", sink.name(), e),
                    excluded: false,
                });
            }
        }
        events.send(Event::Sink(SinkEvent::Completed));

        let report = PipelineReport {
            selections,
            failures,
            processed,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };
        let summary = report.summary();

        info!(
            processed = summary.processed,
            kept = summary.kept,
            removed = summary.removed,
            failed = summary.failed,
            duration_ms = summary.duration_ms,
            "pipeline complete"
        );
        events.send(Event::Pipeline(PipelineEvent::Completed { summary }));

        Ok(report)
    }

    /// Fingerprint images and resolve creation times on the worker pool
    fn hash_all(&self, files: &[MediaFile], events: &EventSender) -> Result<Vec<Outcome>, MediaSieveError> {
        let workers = self.workers();
        let total = files.len();

        events.send(Event::Hash(HashEvent::Started { total, workers }));
        debug!(workers, total, dedupe = self.config.dedupe, "starting worker pool");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sieve-hash-{i}"))
            .build()
            .map_err(|e| PipelineError::WorkerPool(e.to_string()))?;

        let completed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        let outcomes: Vec<Option<Outcome>> = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    if self.cancel.is_cancelled() {
                        return None;
                    }

                    let outcome = self.process(file);
                    if let Some(message) = &outcome.error {
                        failed.fetch_add(1, Ordering::SeqCst);
                        warn!(path = %file.path.display(), "hashing failed: {message}");
                        events.send(Event::Hash(HashEvent::Failed {
                            path: file.path.clone(),
                            message: message.clone(),
                        }));
                    }

                    let current_completed = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    events.send(Event::Hash(HashEvent::Progress(HashProgress {
                        completed: current_completed,
                        total,
                        current_path: file.path.clone(),
                    })));

                    Some(outcome)
                })
                .collect()
        });

        if self.cancel.is_cancelled() {
            info!(completed = completed.load(Ordering::SeqCst), total, "run cancelled");
            events.send(Event::Pipeline(PipelineEvent::Cancelled));
            return Err(PipelineError::Cancelled.into());
        }

        let failed = failed.load(Ordering::SeqCst);
        events.send(Event::Hash(HashEvent::Completed {
            hashed: total - failed,
            failed,
        }));

        Ok(outcomes.into_iter().flatten().collect())
    }

    fn process(&self, file: &MediaFile) -> Outcome {
        let created = self.times.creation_time(&file.path);

        if !(self.config.dedupe && file.is_image()) {
            return Outcome {
                file: FingerprintedFile::new(file.path.clone(), None, created),
                hashed: false,
                error: None,
            };
        }

        match self.hasher.hash_file(&file.path) {
            Ok(fingerprint) => Outcome {
                file: FingerprintedFile::new(file.path.clone(), Some(fingerprint), created),
                hashed: true,
                error: None,
            },
            Err(e) => Outcome {
                file: FingerprintedFile::new(file.path.clone(), None, created),
                hashed: true,
                error: Some(e.to_string()),
            },
        }
    }
}
