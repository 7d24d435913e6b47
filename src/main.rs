//! Massing viewer - generates a demo block of buildings and drops walkers onto them.

use bevy::prelude::*;

use urban_massing::{camera, massing, simulation, ui};

fn main() {
    // Force Vulkan backend on Windows (DX12 causes crashes on some systems)
    #[cfg(target_os = "windows")]
    std::env::set_var("WGPU_BACKEND", "vulkan");
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Massing Viewer".into(),
                resolution: (1280., 720.).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.05, 0.06, 0.08)))
        // Building generation and collision
        .add_plugins(massing::MassingPlugin)
        .add_plugins(camera::CameraPlugin)
        // Walkers
        .add_plugins(simulation::SimulationPlugin)
        // Debug UI and wireframes
        .add_plugins(ui::UiPlugin)
        .run();
}
