//! Stage orchestration: file naming, resumability, atomic writes.
//!
//! Each stage reads finished files and writes exactly one file (export
//! writes two). A stage whose outputs exist is skipped unless forced.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use crate::config::{PipelineConfig, SourceConfig};
use crate::error::{Error, Result};
use crate::export;
use crate::filter::filter;
use crate::merge::{merge, SourcePriority};
use crate::model::SourceDocument;
use crate::morphology::infer;
use crate::normalize::{print_stats, Normalizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Merge,
    Infer,
    Filter,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Merge => "merge",
            Stage::Infer => "infer",
            Stage::Filter => "filter",
            Stage::Export => "export",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Skipped,
    Completed,
}

/// Write to `<path>.tmp`, then rename over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn write_document(path: &Path, document: &SourceDocument) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(document)?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}

/// Read and validate a document produced by an earlier stage.
pub fn read_document(stage: Stage, path: &Path) -> Result<SourceDocument> {
    if !path.exists() {
        return Err(Error::MissingInput {
            stage,
            path: path.to_path_buf(),
        });
    }
    let reader = BufReader::new(File::open(path)?);
    let document: SourceDocument = serde_json::from_reader(reader).map_err(|e| Error::SchemaViolation {
        stage,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    document.validate().map_err(|reason| Error::SchemaViolation {
        stage,
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(document)
}

/// File layout of the work directory.
#[derive(Debug, Clone)]
pub struct WorkPaths {
    dir: PathBuf,
}

impl WorkPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        WorkPaths { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn source(&self, name: &str) -> PathBuf {
        self.dir.join(format!("source.{}.json", name))
    }

    pub fn merged(&self) -> PathBuf {
        self.dir.join("merged.json")
    }

    pub fn inferred(&self) -> PathBuf {
        self.dir.join("inferred.json")
    }

    pub fn filtered(&self) -> PathBuf {
        self.dir.join("filtered.json")
    }
}

pub struct StageRunner<'c> {
    config: &'c PipelineConfig,
    paths: WorkPaths,
    force: bool,
    quiet: bool,
}

impl<'c> StageRunner<'c> {
    pub fn new(config: &'c PipelineConfig, force: bool, quiet: bool) -> Self {
        StageRunner {
            config,
            paths: WorkPaths::new(&config.work_dir),
            force,
            quiet,
        }
    }

    pub fn paths(&self) -> &WorkPaths {
        &self.paths
    }

    fn up_to_date(&self, stage: Stage, outputs: &[PathBuf]) -> bool {
        if self.force || !outputs.iter().all(|p| p.exists()) {
            return false;
        }
        log::info!("[{}] output exists, skipping (use --force to rebuild)", stage);
        true
    }

    /// Extract every configured source.
    pub fn extract_all(&self) -> Result<Vec<(String, StageOutcome)>> {
        self.config
            .sources
            .iter()
            .map(|source| Ok((source.name.clone(), self.extract(source)?)))
            .collect()
    }

    /// Extract one source, possibly not listed in the config.
    pub fn extract(&self, source: &SourceConfig) -> Result<StageOutcome> {
        let output = self.paths.source(&source.name);
        if self.up_to_date(Stage::Extract, &[output.clone()]) {
            return Ok(StageOutcome::Skipped);
        }
        if !source.dump.exists() {
            return Err(Error::MissingInput {
                stage: Stage::Extract,
                path: source.dump.clone(),
            });
        }

        log::info!("[{}] {} from {}", Stage::Extract, source.name, source.dump.display());
        let normalizer = Normalizer::new(
            source,
            &self.config.extractor,
            &self.config.source_language,
            &self.config.target_language,
        )?;
        let (document, stats) = normalizer.normalize_dump(self.quiet)?;
        write_document(&output, &document)?;
        if !self.quiet {
            print_stats(&source.name, &stats);
        }
        log::info!("[{}] wrote {}", Stage::Extract, output.display());
        Ok(StageOutcome::Completed)
    }

    pub fn merge(&self) -> Result<StageOutcome> {
        let output = self.paths.merged();
        if self.up_to_date(Stage::Merge, &[output.clone()]) {
            return Ok(StageOutcome::Skipped);
        }

        let documents = self
            .config
            .sources
            .iter()
            .map(|source| read_document(Stage::Merge, &self.paths.source(&source.name)))
            .collect::<Result<Vec<_>>>()?;
        let priority = SourcePriority::new(self.config.source_priority.clone());
        let merged = merge(&documents, &priority, &self.config.merge);
        self.finish(Stage::Merge, &output, &merged)
    }

    pub fn infer(&self) -> Result<StageOutcome> {
        let output = self.paths.inferred();
        if self.up_to_date(Stage::Infer, &[output.clone()]) {
            return Ok(StageOutcome::Skipped);
        }
        let merged = read_document(Stage::Infer, &self.paths.merged())?;
        let inferred = infer(&merged, &self.config.inference);
        self.finish(Stage::Infer, &output, &inferred)
    }

    pub fn filter(&self) -> Result<StageOutcome> {
        let output = self.paths.filtered();
        if self.up_to_date(Stage::Filter, &[output.clone()]) {
            return Ok(StageOutcome::Skipped);
        }
        let inferred = read_document(Stage::Filter, &self.paths.inferred())?;
        let filtered = filter(&inferred, &self.config.filter, &self.config.target_language);
        self.finish(Stage::Filter, &output, &filtered)
    }

    pub fn export(&self) -> Result<StageOutcome> {
        let outputs = [
            self.paths.dir().join(&self.config.export.monodix),
            self.paths.dir().join(&self.config.export.bidix),
        ];
        if self.up_to_date(Stage::Export, &outputs) {
            return Ok(StageOutcome::Skipped);
        }
        let filtered = read_document(Stage::Export, &self.paths.filtered())?;
        let summary = export::export(
            &filtered,
            &self.config.export,
            &self.config.target_language,
            self.paths.dir(),
        )?;
        log::info!(
            "[{}] wrote {} and {}",
            Stage::Export,
            summary.monodix.display(),
            summary.bidix.display()
        );
        Ok(StageOutcome::Completed)
    }

    /// Every stage in order.
    pub fn run_all(&self) -> Result<()> {
        self.extract_all()?;
        self.merge()?;
        self.infer()?;
        self.filter()?;
        self.export()?;
        Ok(())
    }

    fn finish(&self, stage: Stage, output: &Path, document: &SourceDocument) -> Result<StageOutcome> {
        write_document(output, document)?;
        for (key, value) in &document.metadata.statistics {
            log::info!("[{}] {}: {}", stage, key, value);
        }
        log::info!("[{}] wrote {}", stage, output.display());
        Ok(StageOutcome::Completed)
    }
}
