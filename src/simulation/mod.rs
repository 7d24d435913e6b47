//! Simulation systems that exercise the massing queries at runtime.

use bevy::prelude::*;

pub mod walkers;

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(walkers::WalkerPlugin)
            .init_resource::<SimulationConfig>()
            .add_systems(Update, simulation_controls);
    }
}

/// Configuration for the simulation.
#[derive(Resource, Default)]
pub struct SimulationConfig {
    /// Whether simulation is paused.
    pub paused: bool,
}

/// Run condition for simulation systems. Runs when no config is present.
pub fn simulation_running(config: Option<Res<SimulationConfig>>) -> bool {
    config.map_or(true, |c| !c.paused)
}

/// Keyboard controls for pausing the simulation.
fn simulation_controls(keyboard: Res<ButtonInput<KeyCode>>, mut config: ResMut<SimulationConfig>) {
    // Space: Toggle pause
    if keyboard.just_pressed(KeyCode::Space) {
        config.paused = !config.paused;
        if config.paused {
            info!("Simulation PAUSED");
        } else {
            info!("Simulation RESUMED");
        }
    }
}
