//! Hierarchical grid broad phase.
//!
//! Particles are binned into one of a few grid *levels* according to their
//! interaction diameter. Level boundaries grow geometrically between the
//! smallest and largest diameter present, so a polydisperse system spanning
//! several decades of size needs only a handful of levels and each particle
//! only inspects a constant number of cells.
//!
//! A particle on level `L` queries every level `j >= L`, widening the search
//! by half the largest diameter level `j` can hold. Pairs on the same level
//! are reported once, by the lower key. This makes the candidate set complete
//! for any cell oversize ratio: every touching pair appears at least once.
//!
//! The grid is a cache. It is never serialized; a restart rebuilds it.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use std::collections::HashMap;

use crate::config::Dimension;
use crate::error::ConfigError;
use crate::particle::{Particle, ParticleId};

type CellKey = [i64; 3];

/// Cell size used when no particle has a positive interaction diameter.
const FALLBACK_CELL_SIZE: f64 = 1.0;

/// Tuning knobs for the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HGridSettings {
    /// Upper bound on the number of levels.
    pub max_levels: usize,
    /// Cell size divided by the largest diameter a level holds.
    pub cell_oversize_ratio: f64,
}

impl HGridSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_levels == 0 {
            return Err(ConfigError::InvalidGrid(
                "at least one level is required".to_string(),
            ));
        }
        if !(self.cell_oversize_ratio > 0.0 && self.cell_oversize_ratio.is_finite()) {
            return Err(ConfigError::InvalidGrid(format!(
                "cell oversize ratio must be positive, got {}",
                self.cell_oversize_ratio
            )));
        }
        Ok(())
    }
}

impl Default for HGridSettings {
    fn default() -> Self {
        Self {
            max_levels: 3,
            cell_oversize_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Level {
    /// Largest interaction diameter stored on this level.
    max_diameter: f64,
    cell_size: f64,
    cells: HashMap<CellKey, Vec<ParticleId>>,
}

impl Level {
    fn new(max_diameter: f64, ratio: f64) -> Self {
        let cell_size = max_diameter * ratio;
        Level {
            max_diameter,
            cell_size: if cell_size > 0.0 && cell_size.is_finite() {
                cell_size
            } else {
                FALLBACK_CELL_SIZE
            },
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, position: &Point3<f64>, axes: usize) -> CellKey {
        let mut key = [0i64; 3];
        key.iter_mut()
            .take(axes)
            .zip(position.coords.iter())
            .for_each(|(k, &x)| *k = (x / self.cell_size).floor() as i64);
        key
    }

    fn remove_from(&mut self, cell: &CellKey, id: ParticleId) {
        if let Some(bucket) = self.cells.get_mut(cell) {
            if let Some(slot) = bucket.iter().position(|&other| other == id) {
                bucket.swap_remove(slot);
            }
            if bucket.is_empty() {
                self.cells.remove(cell);
            }
        }
    }

    /// Visits every id in cells between `lo` and `hi` inclusive.
    fn visit_range(&self, lo: &CellKey, hi: &CellKey, mut f: impl FnMut(ParticleId)) {
        let span = (0..3)
            .map(|k| (hi[k] as i128 - lo[k] as i128 + 1).max(0) as u128)
            .fold(1u128, |acc, n| acc.saturating_mul(n));

        if span > self.cells.len() as u128 {
            // sparse level: scanning occupied cells is cheaper
            self.cells
                .iter()
                .filter(|(key, _)| (0..3).all(|k| key[k] >= lo[k] && key[k] <= hi[k]))
                .for_each(|(_, bucket)| bucket.iter().for_each(|&id| f(id)));
            return;
        }

        for x in lo[0]..=hi[0] {
            for y in lo[1]..=hi[1] {
                for z in lo[2]..=hi[2] {
                    if let Some(bucket) = self.cells.get(&[x, y, z]) {
                        bucket.iter().for_each(|&id| f(id));
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    level: usize,
    cell: CellKey,
    position: Point3<f64>,
    radius: f64,
}

/// Multi-level spatial hash over particle ids.
#[derive(Debug, Clone)]
pub struct HGrid {
    settings: HGridSettings,
    axes: usize,
    levels: Vec<Level>,
    entries: SecondaryMap<ParticleId, Entry>,
    /// Smallest positive and largest interaction diameter at the last rebuild.
    diameter_range: Option<(f64, f64)>,
    rebuilds: usize,
}

/// Geometric level bounds between `d_min` and `d_max`.
fn level_bounds(settings: &HGridSettings, d_min: f64, d_max: f64) -> Vec<f64> {
    if !(d_max > 0.0) {
        return vec![0.0];
    }
    let d_min = if d_min > 0.0 { d_min.min(d_max) } else { d_max };
    let ratio = d_max / d_min;
    let wanted = ratio.log2().ceil().max(1.0) as usize;
    let count = wanted.min(settings.max_levels.max(1));
    let q = ratio.powf(1.0 / count as f64);

    let mut bounds: Vec<f64> = (0..count)
        .map(|i| d_min * q.powi(i as i32 + 1))
        .collect();
    if let Some(last) = bounds.last_mut() {
        *last = d_max;
    }
    bounds
}

impl HGrid {
    pub fn new(settings: HGridSettings, dimension: Dimension) -> Self {
        HGrid {
            settings,
            axes: dimension.axes(),
            levels: vec![Level::new(0.0, settings.cell_oversize_ratio)],
            entries: SecondaryMap::new(),
            diameter_range: None,
            rebuilds: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn cell_size(&self, level: usize) -> Option<f64> {
        self.levels.get(level).map(|l| l.cell_size)
    }

    pub fn level_of(&self, id: ParticleId) -> Option<usize> {
        self.entries.get(id).map(|e| e.level)
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of full rebuilds since creation.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    fn level_for(&self, diameter: f64) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| diameter <= level.max_diameter)
    }

    /// True if the current levels can hold this diameter without distorting
    /// the hierarchy.
    fn fits(&self, diameter: f64) -> bool {
        match self.diameter_range {
            None => false,
            Some((d_min, d_max)) => {
                diameter <= d_max && !(diameter > 0.0 && diameter < 0.5 * d_min)
            }
        }
    }

    /// Recomputes the levels from scratch and re-bins every particle.
    pub fn rebuild<'a>(&mut self, particles: impl Iterator<Item = (ParticleId, &'a Particle)>) {
        let particles: Vec<(ParticleId, &Particle)> = particles.collect();

        let diameters = particles.iter().map(|(_, p)| 2.0 * p.interaction_radius);
        let d_max = diameters.clone().fold(0.0_f64, f64::max);
        let d_min = diameters
            .filter(|&d| d > 0.0)
            .fold(f64::INFINITY, f64::min);

        let bounds = level_bounds(&self.settings, d_min, d_max);
        self.levels = bounds
            .iter()
            .map(|&b| Level::new(b, self.settings.cell_oversize_ratio))
            .collect();
        self.diameter_range = if d_max > 0.0 {
            Some((d_min.min(d_max), d_max))
        } else {
            Some((0.0, 0.0))
        };
        self.entries.clear();
        self.rebuilds += 1;

        for (id, particle) in particles {
            self.place(id, particle);
        }
    }

    fn place(&mut self, id: ParticleId, particle: &Particle) {
        let diameter = 2.0 * particle.interaction_radius;
        let level = self
            .level_for(diameter)
            .unwrap_or(self.levels.len() - 1);
        let cell = self.levels[level].cell_of(&particle.position, self.axes);
        self.levels[level].cells.entry(cell).or_default().push(id);
        self.entries.insert(
            id,
            Entry {
                level,
                cell,
                position: particle.position,
                radius: particle.interaction_radius,
            },
        );
    }

    /// Inserts a particle. Returns `false` when the particle's size does not
    /// fit the current levels; the caller must then [`HGrid::rebuild`].
    pub fn insert(&mut self, id: ParticleId, particle: &Particle) -> bool {
        if !self.fits(2.0 * particle.interaction_radius) {
            return false;
        }
        self.remove(id);
        self.place(id, particle);
        true
    }

    /// Moves a particle to the cell of its new position.
    pub fn update(&mut self, id: ParticleId, position: &Point3<f64>) {
        let axes = self.axes;
        let Some(entry) = self.entries.get_mut(id) else {
            return;
        };
        entry.position = *position;
        let level = &mut self.levels[entry.level];
        let cell = level.cell_of(position, axes);
        if cell != entry.cell {
            level.remove_from(&entry.cell, id);
            level.cells.entry(cell).or_default().push(id);
            entry.cell = cell;
        }
    }

    pub fn remove(&mut self, id: ParticleId) {
        if let Some(entry) = self.entries.remove(id) {
            self.levels[entry.level].remove_from(&entry.cell, id);
        }
    }

    fn range(&self, level: &Level, position: &Point3<f64>, extent: f64) -> (CellKey, CellKey) {
        let mut lo = [0i64; 3];
        let mut hi = [0i64; 3];
        for k in 0..self.axes {
            lo[k] = ((position[k] - extent) / level.cell_size).floor() as i64;
            hi[k] = ((position[k] + extent) / level.cell_size).floor() as i64;
        }
        (lo, hi)
    }

    /// Every particle that might touch `id`, on levels at or above its own.
    ///
    /// Together with the reverse query from the coarser partner this covers
    /// all touching pairs; [`HGrid::for_each_candidate_pair`] combines both.
    pub fn for_each_candidate_neighbor(&self, id: ParticleId, mut f: impl FnMut(ParticleId)) {
        let Some(entry) = self.entries.get(id) else {
            return;
        };
        for level in &self.levels[entry.level..] {
            let extent = entry.radius + 0.5 * level.max_diameter;
            let (lo, hi) = self.range(level, &entry.position, extent);
            level.visit_range(&lo, &hi, |other| {
                if other != id {
                    f(other)
                }
            });
        }
    }

    /// Every unordered candidate pair, reported exactly once.
    pub fn for_each_candidate_pair(&self, mut f: impl FnMut(ParticleId, ParticleId)) {
        for (id, entry) in &self.entries {
            self.for_each_candidate_neighbor(id, |other| {
                let same_level = self
                    .entries
                    .get(other)
                    .is_some_and(|e| e.level == entry.level);
                if !same_level || other > id {
                    f(id, other);
                }
            });
        }
    }

    /// Every particle whose interaction sphere might intersect the given
    /// sphere, searching all levels.
    pub fn query_sphere(&self, position: &Point3<f64>, radius: f64, mut f: impl FnMut(ParticleId)) {
        for level in &self.levels {
            let extent = radius + 0.5 * level.max_diameter;
            let (lo, hi) = self.range(level, position, extent);
            level.visit_range(&lo, &hi, &mut f);
        }
    }
}
