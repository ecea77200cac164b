//! Output sinks.
//!
//! Every sink receives the whole simulation at each save and writes one
//! record. Plain-text sinks are generic over [`std::io::Write`] so tests can
//! write to memory; [`Outputs::in_directory`] opens the usual file set.

use std::fs::{self, File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::error::DemError;
use crate::simulation::Simulation;

pub mod checkpoint;
pub mod contacts;
pub mod energy;
pub mod trajectory;

#[cfg(test)]
mod checkpoint_test;

pub use checkpoint::{load_checkpoint, read_checkpoint, save_checkpoint, write_checkpoint};
pub use contacts::ContactWriter;
pub use energy::EnergyWriter;
pub use trajectory::TrajectoryWriter;

/// Something that records the simulation at save points.
pub trait OutputSink {
    fn write(&mut self, sim: &Simulation) -> Result<(), DemError>;
}

/// Rewrites the restart file at every save.
#[derive(Debug, Clone)]
pub struct CheckpointSink {
    path: PathBuf,
}

impl CheckpointSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Like [`CheckpointSink::new`], but fails now if the file cannot be
    /// opened for writing. An existing file is left as it is.
    ///
    /// # Errors
    ///
    /// Returns [`DemError::Open`] when the path is not writable.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, DemError> {
        let path = path.into();
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| DemError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for CheckpointSink {
    fn write(&mut self, sim: &Simulation) -> Result<(), DemError> {
        save_checkpoint(sim, &self.path)
    }
}

pub(crate) fn create(path: &Path) -> Result<BufWriter<File>, DemError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| DemError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// The set of sinks a run writes to.
#[derive(Default)]
pub struct Outputs {
    sinks: Vec<Box<dyn OutputSink>>,
    checkpoint: Option<CheckpointSink>,
}

impl Outputs {
    /// No output at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: impl OutputSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn with_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint = Some(CheckpointSink::new(path));
        self
    }

    /// Opens `<name>.data`, `<name>.fstat` and `<name>.ene` in `dir` and
    /// checkpoints to `<name>.restart`.
    ///
    /// # Errors
    ///
    /// Fails if the directory or any file cannot be created. The restart
    /// file is checked first, so a failure leaves no text files behind.
    pub fn in_directory(dir: impl AsRef<Path>, name: &str) -> Result<Self, DemError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| DemError::Open {
            path: dir.to_path_buf(),
            source,
        })?;
        let file = |ext: &str| dir.join(format!("{name}.{ext}"));
        let checkpoint = CheckpointSink::create(file("restart"))?;

        let mut outputs = Outputs::none()
            .with_sink(TrajectoryWriter::new(create(&file("data"))?))
            .with_sink(ContactWriter::new(create(&file("fstat"))?))
            .with_sink(EnergyWriter::new(create(&file("ene"))?));
        outputs.checkpoint = Some(checkpoint);
        Ok(outputs)
    }

    pub fn len(&self) -> usize {
        self.sinks.len() + usize::from(self.checkpoint.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes one record to every sink, the restart file first.
    pub fn write_all(&mut self, sim: &Simulation) -> Result<(), DemError> {
        self.checkpoint(sim)?;
        for sink in &mut self.sinks {
            sink.write(sim)?;
        }
        Ok(())
    }

    /// Writes the restart file only.
    pub fn checkpoint(&mut self, sim: &Simulation) -> Result<(), DemError> {
        match &mut self.checkpoint {
            Some(sink) => sink.write(sim),
            None => Ok(()),
        }
    }
}
