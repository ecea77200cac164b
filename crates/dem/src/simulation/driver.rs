//! Step controller.
//!
//! Orchestrates every stage of a time step in a fixed order and runs the
//! time loop around it.

use std::time::{Duration, Instant};

use super::Simulation;
use crate::error::DemError;
use crate::forces::{compute_forces, ForceContext};
use crate::integrator::VelocityVerlet;
use crate::output::Outputs;

/// Counters from one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub inserted: usize,
    pub saturated_insertions: usize,
    pub ghosts: usize,
    pub pairs_tested: usize,
    pub particle_contacts: usize,
    pub wall_contacts: usize,
    pub folded: usize,
    pub removed: usize,
    pub interactions_erased: usize,
}

/// Why [`Simulation::solve_with`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTime,
    /// The continuation predicate returned `false`.
    Predicate,
    /// The wall-clock limit ran out; a checkpoint was written.
    WallClock,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub steps: u64,
    pub time: f64,
    pub saves: u64,
    pub stop: StopReason,
}

/// Optional limits for [`Simulation::solve_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolveOptions {
    pub wall_clock_limit: Option<Duration>,
}

impl SolveOptions {
    pub fn with_wall_clock_limit(mut self, limit: Duration) -> Self {
        self.wall_clock_limit = Some(limit);
        self
    }
}

impl Simulation {
    fn integrator(&self) -> VelocityVerlet {
        VelocityVerlet::new(self.dimension())
    }

    /// Runs a force pass with ghosts in place, then removes the ghosts.
    fn force_pass(&mut self, dt: f64, stats: &mut StepStats) {
        let gravity = self.gravity();
        stats.ghosts += self.boundaries.create_ghosts(&mut self.particles, self.time);
        let context = ForceContext {
            species: &self.species,
            walls: &self.walls,
            body_force: &gravity,
            time: self.time,
            dt,
        };
        let forces = compute_forces(&mut self.particles, &mut self.interactions, &context);
        stats.pairs_tested += forces.pairs_tested;
        stats.particle_contacts += forces.particle_contacts;
        stats.wall_contacts += forces.wall_contacts;
        self.particles.remove_ghosts();
    }

    /// Computes the initial forces so the first half kick uses real values.
    ///
    /// No time passes during this pass, so contact histories see a zero
    /// increment.
    fn prime_forces(&mut self) {
        if self.forces_primed {
            return;
        }
        let mut stats = StepStats::default();
        self.force_pass(0.0, &mut stats);
        self.forces_primed = true;
        self.log.debug(format_args!(
            "initial force pass: {} contacts, {} wall contacts",
            stats.particle_contacts, stats.wall_contacts
        ));
    }

    /// Advances the simulation by one configured time step.
    ///
    /// Nothing inside a step fails: a contact that cannot be evaluated is
    /// skipped and the step carries on.
    pub fn step(&mut self) -> StepStats {
        self.step_by(self.config.time_step)
    }

    /// Advances by `dt`, which may be shorter than the configured step.
    ///
    /// Stage order:
    /// 1. Insertion boundaries add particles
    /// 2. Half kick and drift for real particles; walls move
    /// 3. Ghosts are created, forces computed, ghosts removed
    /// 4. Second half kick
    /// 5. Escaped particles are folded back or deleted; interactions follow
    /// 6. Interactions not refreshed this step are erased
    pub(crate) fn step_by(&mut self, dt: f64) -> StepStats {
        self.prime_forces();
        let mut stats = StepStats::default();
        let dimension = self.dimension();
        let integrator = self.integrator();

        // 1. Insertion
        let insertion =
            self.boundaries
                .insert_particles(&mut self.particles, &self.species, &self.walls, dimension, self.time);
        stats.inserted = insertion.inserted;
        stats.saturated_insertions = insertion.saturated;

        // 2. Integrate before force
        self.particles
            .modify_real(|p| integrator.integrate_before_force(p, dt));
        self.walls.iter_mut().for_each(|w| w.advance(dt));
        self.time += dt;

        // 3. Forces at the new positions
        self.force_pass(dt, &mut stats);

        // 4. Integrate after force
        self.particles
            .modify_real(|p| integrator.integrate_after_force(p, dt));

        // 5. Periodic folding and deletion
        let folds = self.boundaries.fold_all(&mut self.particles, self.time);
        stats.folded = folds.folds.len();
        stats.removed = folds.removed.len();
        self.interactions.reattribute(&folds.folds);
        if !folds.removed.is_empty() {
            self.interactions.purge_missing(&self.particles);
            self.particles.normalize_free_slots();
        }

        // 6. Stale interactions
        stats.interactions_erased = self.interactions.erase_stale(self.time - 0.5 * dt);

        self.step_count += 1;
        stats
    }

    /// Runs until the configured end time, writing outputs.
    pub fn solve(&mut self, outputs: &mut Outputs) -> Result<RunSummary, DemError> {
        self.solve_with(outputs, SolveOptions::default(), |_| true)
    }

    /// Runs until the end time, until `keep_going` returns `false`, or until
    /// the wall-clock limit is hit.
    ///
    /// Outputs are written every `save_every` steps and always at the end.
    /// The last step is shortened so the run lands exactly on the end time.
    ///
    /// # Errors
    ///
    /// Configuration problems are reported before any step is taken. I/O
    /// failures from outputs abort the run.
    pub fn solve_with(
        &mut self,
        outputs: &mut Outputs,
        options: SolveOptions,
        mut keep_going: impl FnMut(&Simulation) -> bool,
    ) -> Result<RunSummary, DemError> {
        self.validate()?;
        let started = Instant::now();
        let dt = self.config.time_step;
        let end = self.config.max_time;
        let tolerance = 1e-9 * dt;
        let mut saves = 0;

        self.log.info(format_args!(
            "starting '{}' at t = {} with {} particles, dt = {}, end = {}",
            self.config.name,
            self.time,
            self.particles.real_count(),
            dt,
            end
        ));

        if self.step_count == 0 && self.last_saved_step.is_none() {
            self.prime_forces();
            outputs.write_all(self)?;
            self.last_saved_step = Some(self.step_count);
            saves += 1;
        }

        let stop = loop {
            let remaining = end - self.time;
            if remaining <= tolerance {
                self.time = self.time.max(end);
                break StopReason::EndTime;
            }
            if !keep_going(self) {
                break StopReason::Predicate;
            }
            if options
                .wall_clock_limit
                .is_some_and(|limit| started.elapsed() >= limit)
            {
                break StopReason::WallClock;
            }

            let stats = if remaining < dt - tolerance {
                self.step_by(remaining)
            } else {
                self.step()
            };
            self.log.trace(format_args!("step {}: {:?}", self.step_count, stats));
            if stats.saturated_insertions > 0 {
                self.log.debug(format_args!(
                    "step {}: insertion saturated after {} new particles",
                    self.step_count, stats.inserted
                ));
            }

            if self.step_count % self.config.save_every == 0 {
                outputs.write_all(self)?;
                self.last_saved_step = Some(self.step_count);
                saves += 1;
                self.log.debug(format_args!(
                    "t = {:.6} step {}: {} particles, {} interactions",
                    self.time,
                    self.step_count,
                    self.particles.real_count(),
                    self.interactions.len()
                ));
            }
        };

        if self.last_saved_step != Some(self.step_count) {
            outputs.write_all(self)?;
            self.last_saved_step = Some(self.step_count);
            saves += 1;
        }
        if stop == StopReason::WallClock {
            outputs.checkpoint(self)?;
            self.log.warn(format_args!(
                "wall-clock limit reached at t = {}; checkpoint written",
                self.time
            ));
        }

        self.log.info(format_args!(
            "finished '{}' at t = {} after {} steps",
            self.config.name, self.time, self.step_count
        ));

        Ok(RunSummary {
            steps: self.step_count,
            time: self.time,
            saves,
            stop,
        })
    }
}
