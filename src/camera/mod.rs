//! Orbit camera for the massing viewer with zoom, pan, and rotate controls.

use bevy::{
    core_pipeline::tonemapping::Tonemapping,
    input::mouse::{MouseMotion, MouseWheel},
    pbr::{DistanceFog, FogFalloff},
    prelude::*,
};

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera)
            .add_systems(Update, (camera_zoom, camera_pan, camera_rotate, apply_orbit).chain());
    }
}

/// Orbit state of the viewer camera. The transform is derived from it every frame.
#[derive(Component)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            // Center of the default demo block, in Bevy space.
            target: Vec3::new(50.0, 0.0, -45.0),
            distance: 180.0,
            yaw: -0.8,
            pitch: 0.6,
        }
    }
}

impl OrbitCamera {
    fn eye(&self) -> Vec3 {
        let dir = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target + dir * self.distance
    }
}

fn setup_camera(mut commands: Commands) {
    let orbit = OrbitCamera::default();
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(orbit.eye()).looking_at(orbit.target, Vec3::Y),
        DistanceFog {
            color: Color::srgba(0.6, 0.7, 0.8, 0.85),
            falloff: FogFalloff::Exponential { density: 0.0015 },
            ..default()
        },
        Tonemapping::TonyMcMapface,
        orbit,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(100.0, 200.0, 50.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn camera_zoom(mut query: Query<&mut OrbitCamera>, mut scroll_events: EventReader<MouseWheel>) {
    let scroll: f32 = scroll_events.read().map(|e| e.y).sum();
    if scroll == 0.0 {
        return;
    }

    for mut orbit in &mut query {
        orbit.distance = (orbit.distance * (1.0 - scroll * 0.1)).clamp(10.0, 1000.0);
    }
}

fn camera_pan(
    mut query: Query<&mut OrbitCamera>,
    keys: Res<ButtonInput<KeyCode>>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    time: Res<Time>,
) {
    let mut direction = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyW) || keys.pressed(KeyCode::ArrowUp) {
        direction.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyS) || keys.pressed(KeyCode::ArrowDown) {
        direction.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyA) || keys.pressed(KeyCode::ArrowLeft) {
        direction.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) || keys.pressed(KeyCode::ArrowRight) {
        direction.x += 1.0;
    }

    let mut mouse_delta = Vec2::ZERO;
    if mouse_buttons.pressed(MouseButton::Middle) || mouse_buttons.pressed(MouseButton::Right) {
        for event in mouse_motion.read() {
            mouse_delta += event.delta;
        }
    } else {
        mouse_motion.clear();
    }

    for mut orbit in &mut query {
        // Screen axes projected onto the ground plane.
        let right = Vec3::new(orbit.yaw.cos(), 0.0, -orbit.yaw.sin());
        let forward = Vec3::new(orbit.yaw.sin(), 0.0, orbit.yaw.cos());
        let key_speed = orbit.distance * 0.5 * time.delta_secs();
        let drag_speed = orbit.distance * 0.002;

        let delta = (right * direction.x + forward * direction.y) * key_speed
            - (right * mouse_delta.x + forward * mouse_delta.y) * drag_speed;
        orbit.target += delta;
    }
}

fn camera_rotate(mut query: Query<&mut OrbitCamera>, keys: Res<ButtonInput<KeyCode>>, time: Res<Time>) {
    let mut yaw = 0.0;
    let mut pitch = 0.0;
    if keys.pressed(KeyCode::KeyQ) {
        yaw -= 1.0;
    }
    if keys.pressed(KeyCode::KeyE) {
        yaw += 1.0;
    }
    if keys.pressed(KeyCode::KeyR) {
        pitch += 1.0;
    }
    if keys.pressed(KeyCode::KeyF) {
        pitch -= 1.0;
    }
    if yaw == 0.0 && pitch == 0.0 {
        return;
    }

    for mut orbit in &mut query {
        orbit.yaw += yaw * time.delta_secs();
        orbit.pitch = (orbit.pitch + pitch * time.delta_secs()).clamp(0.05, 1.5);
    }
}

fn apply_orbit(mut query: Query<(&mut Transform, &OrbitCamera), Changed<OrbitCamera>>) {
    for (mut transform, orbit) in &mut query {
        *transform = Transform::from_translation(orbit.eye()).looking_at(orbit.target, Vec3::Y);
    }
}
