//! Restart files.
//!
//! A checkpoint holds everything that influences future steps: particles
//! with their slot generations, interactions with their history, walls,
//! boundaries including random-stream state, species, time and step count.
//! The broad-phase grid is rebuilt on load. Numbers are written with
//! round-trip precision, so a restarted run continues bit for bit.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::boundary::BoundaryRegistry;
use crate::config::{Dimension, SimulationConfig};
use crate::error::DemError;
use crate::interaction::{Interaction, InteractionRegistry};
use crate::logging::RunLog;
use crate::particle::{Particle, ParticleId};
use crate::registry::ParticleRegistry;
use crate::simulation::Simulation;
use crate::species::SpeciesTable;
use crate::wall::Wall;

pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Serialize)]
struct CheckpointRef<'a> {
    format_version: u32,
    config: &'a SimulationConfig,
    time: f64,
    step_count: u64,
    forces_primed: bool,
    last_saved_step: Option<u64>,
    species: &'a SpeciesTable,
    particles: &'a SlotMap<ParticleId, Particle>,
    slot_count: usize,
    // a list, since JSON object keys must be strings
    interactions: Vec<&'a Interaction>,
    walls: &'a [Wall],
    boundaries: &'a BoundaryRegistry,
}

#[derive(Deserialize)]
struct Checkpoint {
    config: SimulationConfig,
    time: f64,
    step_count: u64,
    forces_primed: bool,
    last_saved_step: Option<u64>,
    species: SpeciesTable,
    particles: SlotMap<ParticleId, Particle>,
    slot_count: usize,
    interactions: Vec<Interaction>,
    walls: Vec<Wall>,
    boundaries: BoundaryRegistry,
}

/// Serializes the simulation to `writer`.
pub fn write_checkpoint<W: Write>(sim: &Simulation, mut writer: W) -> Result<(), DemError> {
    let checkpoint = CheckpointRef {
        format_version: CHECKPOINT_VERSION,
        config: &sim.config,
        time: sim.time,
        step_count: sim.step_count,
        forces_primed: sim.forces_primed,
        last_saved_step: sim.last_saved_step,
        species: &sim.species,
        particles: sim.particles.slots(),
        slot_count: sim.particles.slot_count(),
        interactions: sim.interactions.iter().collect(),
        walls: &sim.walls,
        boundaries: &sim.boundaries,
    };
    serde_json::to_writer(&mut writer, &checkpoint)?;
    writer.flush()?;
    Ok(())
}

/// Restores a simulation written by [`write_checkpoint`].
///
/// # Errors
///
/// Fails on malformed input or an unknown format version.
pub fn read_checkpoint<R: Read>(reader: R) -> Result<Simulation, DemError> {
    let value: serde_json::Value = serde_json::from_reader(reader)?;
    let found = value
        .get("format_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;
    if found != CHECKPOINT_VERSION {
        return Err(DemError::UnsupportedCheckpointVersion {
            found,
            expected: CHECKPOINT_VERSION,
        });
    }
    let checkpoint: Checkpoint = serde_json::from_value(value)?;

    let dimension = checkpoint.config.dimension.unwrap_or(Dimension::Three);
    let particles = ParticleRegistry::from_slots(
        checkpoint.particles,
        checkpoint.slot_count,
        dimension,
        checkpoint.config.hgrid,
    );

    Ok(Simulation {
        config: checkpoint.config,
        species: checkpoint.species,
        particles,
        interactions: InteractionRegistry::from_interactions(checkpoint.interactions),
        walls: checkpoint.walls,
        boundaries: checkpoint.boundaries,
        time: checkpoint.time,
        step_count: checkpoint.step_count,
        forces_primed: checkpoint.forces_primed,
        last_saved_step: checkpoint.last_saved_step,
        log: RunLog::default(),
    })
}

/// Writes a checkpoint file, replacing any previous one.
pub fn save_checkpoint(sim: &Simulation, path: impl AsRef<Path>) -> Result<(), DemError> {
    let writer = super::create(path.as_ref())?;
    write_checkpoint(sim, writer)
}

/// Loads a checkpoint file; the restored run logs to `log`.
///
/// Returns `Ok(None)` when the file cannot be opened, so callers can fall
/// back to a fresh setup. That case is reported as a warning on `log`.
///
/// # Errors
///
/// Fails if the file opens but does not hold a valid checkpoint.
pub fn load_checkpoint(
    path: impl AsRef<Path>,
    log: &RunLog,
) -> Result<Option<Simulation>, DemError> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            log.warn(format_args!("no restart file at {}: {err}", path.display()));
            return Ok(None);
        }
    };
    let mut sim = read_checkpoint(BufReader::new(file))?;
    sim.set_log(log.clone());
    Ok(Some(sim))
}
