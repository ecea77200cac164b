//! Energy time series (`.ene`).

use std::io::Write;

use super::OutputSink;
use crate::error::DemError;
use crate::simulation::Simulation;

/// Writes `time kinetic rotational gravitational elastic` once per save,
/// after a single header line.
#[derive(Debug)]
pub struct EnergyWriter<W: Write> {
    writer: W,
    header_written: bool,
}

impl<W: Write> EnergyWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header_written: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for EnergyWriter<W> {
    fn write(&mut self, sim: &Simulation) -> Result<(), DemError> {
        if !self.header_written {
            writeln!(self.writer, "time kinetic rotational gravitational elastic")?;
            self.header_written = true;
        }
        let e = sim.energies();
        writeln!(
            self.writer,
            "{} {} {} {} {}",
            sim.time(),
            e.kinetic,
            e.rotational,
            e.gravitational,
            e.elastic
        )?;
        self.writer.flush()?;
        Ok(())
    }
}
