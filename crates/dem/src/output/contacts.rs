//! Contact force statistics (`.fstat`).
//!
//! Each save writes `# time count`, then one line per active interaction:
//!
//! ```text
//! time first second cx cy cz overlap spring fn ft nx ny nz
//! ```
//!
//! `second` is a particle id or `w<index>` for walls. `fn` is the normal
//! force magnitude on the first participant (positive when repulsive), `ft`
//! the tangential force magnitude and `spring` the tangential spring length.

use std::io::Write;

use slotmap::Key;

use super::OutputSink;
use crate::error::DemError;
use crate::interaction::Partner;
use crate::particle::ParticleId;
use crate::simulation::Simulation;

#[derive(Debug)]
pub struct ContactWriter<W: Write> {
    writer: W,
}

impl<W: Write> ContactWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn label(id: ParticleId) -> String {
    format!("{:?}", id.data())
}

impl<W: Write> OutputSink for ContactWriter<W> {
    fn write(&mut self, sim: &Simulation) -> Result<(), DemError> {
        let time = sim.time();
        let active: Vec<_> = sim
            .interactions()
            .iter()
            .filter(|i| i.last_refreshed == time)
            .collect();
        writeln!(self.writer, "# {} {}", time, active.len())?;

        for i in active {
            let second = match i.key.partner {
                Partner::Particle(id) => label(id),
                Partner::Wall(wall) => format!("w{}", wall.0),
            };
            let normal_force = -i.force.dot(&i.normal);
            let tangential = i.force + i.normal * normal_force;
            writeln!(
                self.writer,
                "{} {} {} {} {} {} {} {} {} {} {} {} {}",
                time,
                label(i.key.first),
                second,
                i.contact_point.x,
                i.contact_point.y,
                i.contact_point.z,
                i.overlap,
                i.history.tangential_spring.norm(),
                normal_force,
                tangential.norm(),
                i.normal.x,
                i.normal.y,
                i.normal.z
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
