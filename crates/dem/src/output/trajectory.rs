//! Particle trajectory snapshots (`.data`).
//!
//! Each save writes a header line
//!
//! ```text
//! N time xmin ymin zmin xmax ymax zmax
//! ```
//!
//! followed by one line per real particle:
//!
//! ```text
//! x y z vx vy vz radius qw qx qy qz wx wy wz species
//! ```

use std::io::Write;

use super::OutputSink;
use crate::error::DemError;
use crate::simulation::Simulation;

#[derive(Debug)]
pub struct TrajectoryWriter<W: Write> {
    writer: W,
}

impl<W: Write> TrajectoryWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for TrajectoryWriter<W> {
    fn write(&mut self, sim: &Simulation) -> Result<(), DemError> {
        let config = sim.config();
        let (lo, hi) = (config.domain_min, config.domain_max);
        writeln!(
            self.writer,
            "{} {} {} {} {} {} {} {}",
            sim.particles().real_count(),
            sim.time(),
            lo.x,
            lo.y,
            lo.z,
            hi.x,
            hi.y,
            hi.z
        )?;

        for (_, p) in sim.particles().iter_real() {
            let q = p.orientation.quaternion();
            writeln!(
                self.writer,
                "{} {} {} {} {} {} {} {} {} {} {} {} {} {} {}",
                p.position.x,
                p.position.y,
                p.position.z,
                p.velocity.x,
                p.velocity.y,
                p.velocity.z,
                p.radius,
                q.w,
                q.i,
                q.j,
                q.k,
                p.angular_velocity.x,
                p.angular_velocity.y,
                p.angular_velocity.z,
                p.species.0
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
