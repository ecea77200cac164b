//! Periodic chute scenario.
//!
//! A box periodic in x and y with a frictional floor at the bottom of the
//! domain. Particles rain in from an insertion region in the upper part of
//! the box, and gravity is tilted by the chute inclination so the settled
//! bed flows down-slope along x.

use nalgebra::{Point3, Vector3};

use dem::boundary::{Boundary, CubeInsertionBoundary, PeriodicBoundary};
use dem::config::{Dimension, SimulationConfig};
use dem::species::{LinearViscoelastic, SlidingFriction, Species};
use dem::wall::Wall;
use dem::Simulation;

/// Parameters of the chute.
#[derive(Debug, Clone)]
pub struct ChuteSetup {
    pub name: String,
    pub dimension: Dimension,
    pub domain_min: Point3<f64>,
    pub domain_max: Point3<f64>,
    /// Inclination in degrees.
    pub inclination: f64,
    pub radius: f64,
    /// Relative spread of radii around `radius`.
    pub polydispersity: f64,
    pub particles: u64,
    pub density: f64,
    pub collision_time: f64,
    pub restitution: f64,
    pub friction: f64,
    pub time_step: Option<f64>,
    pub max_time: f64,
    pub save_every: u64,
    pub seed: u64,
}

impl ChuteSetup {
    fn mass(&self) -> f64 {
        self.density * self.dimension.volume(self.radius)
    }

    /// Time step resolving a collision with 50 steps unless given.
    pub fn time_step(&self) -> f64 {
        self.time_step.unwrap_or(self.collision_time / 50.0)
    }

    pub fn gravity(&self) -> Vector3<f64> {
        let theta = self.inclination.to_radians();
        Vector3::new(theta.sin(), 0.0, -theta.cos()) * 9.81
    }

    pub fn species(&self) -> Species {
        let normal = LinearViscoelastic::from_collision_time(
            self.collision_time,
            self.restitution,
            0.5 * self.mass(),
        );
        let sliding = SlidingFriction {
            stiffness: 2.0 / 7.0 * normal.stiffness,
            dissipation: 2.0 / 7.0 * normal.dissipation,
            coefficient: self.friction,
        };
        Species::new(self.density, normal).with_sliding_friction(sliding)
    }

    /// Builds a fresh simulation from the setup.
    pub fn build(&self) -> anyhow::Result<Simulation> {
        let config = SimulationConfig::new(self.name.clone())
            .with_dimension(self.dimension)
            .with_time_step(self.time_step())
            .with_max_time(self.max_time)
            .with_save_every(self.save_every)
            .with_gravity(self.gravity())
            .with_domain(self.domain_min, self.domain_max);

        let mut sim = Simulation::new(config);
        let species = sim.add_species(self.species());

        let (lo, hi) = (self.domain_min, self.domain_max);
        sim.add_wall(Wall::plane(Vector3::z(), lo, species));
        sim.add_boundary(Boundary::Periodic(PeriodicBoundary::new(
            Vector3::x(),
            lo.x,
            hi.x,
        )))?;
        if self.dimension == Dimension::Three {
            sim.add_boundary(Boundary::Periodic(PeriodicBoundary::new(
                Vector3::y(),
                lo.y,
                hi.y,
            )))?;
        }

        let spread = self.polydispersity.clamp(0.0, 0.9);
        let inlet_floor = lo.z + 0.5 * (hi.z - lo.z);
        let insertion = CubeInsertionBoundary::new(
            Point3::new(lo.x, lo.y, inlet_floor),
            hi,
            species,
            self.radius * (1.0 - spread),
            self.radius * (1.0 + spread),
            self.seed,
        )
        .with_velocity_range(Vector3::new(0.0, 0.0, -0.1), Vector3::new(0.0, 0.0, 0.0))
        .with_max_failed_attempts(100)
        .with_max_particles(self.particles);
        sim.add_boundary(Boundary::CubeInsertion(insertion))?;

        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ChuteSetup {
        ChuteSetup {
            name: "test".to_string(),
            dimension: Dimension::Three,
            domain_min: Point3::origin(),
            domain_max: Point3::new(10.0, 5.0, 10.0),
            inclination: 24.0,
            radius: 0.5,
            polydispersity: 0.1,
            particles: 20,
            density: 1.0,
            collision_time: 0.005,
            restitution: 0.8,
            friction: 0.5,
            time_step: None,
            max_time: 0.01,
            save_every: 10,
            seed: 1,
        }
    }

    #[test]
    fn test_gravity_is_tilted_downslope() {
        let g = setup().gravity();
        assert!(g.x > 0.0);
        assert!(g.z < 0.0);
        assert!((g.norm() - 9.81).abs() < 1e-12);
    }

    #[test]
    fn test_build_validates() {
        let sim = setup().build().unwrap();
        assert!(sim.validate().is_ok());
        assert_eq!(sim.boundaries().len(), 3);
        assert_eq!(sim.walls().len(), 1);
    }

    #[test]
    fn test_short_run_inserts_particles() {
        let mut sim = setup().build().unwrap();
        sim.set_log(dem::logging::RunLog::Silent);
        sim.solve(&mut dem::output::Outputs::none()).unwrap();
        assert_eq!(sim.particles().real_count(), 20);
    }
}
