//! Debug UI and visualization tools.

use bevy::{
    diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin},
    prelude::*,
};

use crate::camera::OrbitCamera;
use crate::massing::plugin::{from_massing_space, to_massing_space};
use crate::massing::{BuildingMassings, HitKind};

pub mod debug_render;

/// Length of the cursor pick ray, in meters.
const PICK_DISTANCE: f32 = 2000.0;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(FrameTimeDiagnosticsPlugin::default())
            .add_plugins(debug_render::DebugRenderPlugin)
            .init_resource::<DebugConfig>()
            .init_resource::<CursorPick>()
            .add_systems(Startup, setup_hud)
            .add_systems(
                Update,
                (
                    update_fps_counter,
                    update_massing_stats,
                    pick_under_cursor,
                    update_pick_text,
                    toggle_debug_views,
                ),
            );
    }
}

/// Configuration for debug visualization.
#[derive(Resource)]
pub struct DebugConfig {
    pub show_fps: bool,
    pub show_parts: bool,
    pub show_roofs: bool,
    pub show_details: bool,
    pub show_bcubes: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_fps: true,
            show_parts: true,
            show_roofs: true,
            show_details: true,
            show_bcubes: false,
        }
    }
}

/// Closest massing hit under the cursor at the last left click.
#[derive(Resource, Default)]
pub struct CursorPick {
    pub hit: Option<(usize, HitKind, Vec3)>,
}

#[derive(Component)]
struct FpsText;

#[derive(Component)]
struct MassingStatsText;

#[derive(Component)]
struct PickText;

fn setup_hud(mut commands: Commands) {
    let panel_bg = Color::srgb(0.04, 0.05, 0.06);
    let border = Color::srgb(0.0, 0.75, 0.35);
    let retro_green = Color::srgb(0.4, 0.95, 0.6);
    let retro_orange = Color::srgb(1.0, 0.6, 0.2);

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(10.0),
                right: Val::Px(10.0),
                padding: UiRect::axes(Val::Px(12.0), Val::Px(10.0)),
                border: UiRect::all(Val::Px(1.0)),
                row_gap: Val::Px(6.0),
                flex_direction: FlexDirection::Column,
                ..default()
            },
            BackgroundColor(panel_bg),
            BorderColor(border),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("MASSING VIEWER"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(retro_orange),
            ));

            parent.spawn((
                Text::new("FPS: --"),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(retro_green),
                FpsText,
            ));

            parent.spawn((
                Text::new("Massings: --"),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::srgb(0.6, 0.9, 0.7)),
                MassingStatsText,
            ));

            parent.spawn((
                Text::new("Pick: --"),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::srgb(0.75, 0.95, 0.8)),
                PickText,
            ));
        });

    commands.spawn((
        Text::new("WASD: Pan | Scroll: Zoom | Q/E R/F: Orbit | Click: Pick | B: Wireframes | V: Bounds"),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::srgb(0.65, 0.85, 0.7)),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
    ));
}

fn update_fps_counter(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsText>>,
    config: Res<DebugConfig>,
) {
    if !config.show_fps {
        return;
    }

    for mut text in &mut query {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                **text = format!("FPS: {:.0}", value);
            }
        }
    }
}

fn update_massing_stats(massings: Res<BuildingMassings>, mut query: Query<&mut Text, With<MassingStatsText>>) {
    if !massings.is_changed() {
        return;
    }

    let count = massings.massings.len();
    let rotated = massings.massings.iter().filter(|m| m.is_rotated()).count();
    let houses = massings.massings.iter().filter(|m| m.is_house()).count();
    let details: usize = massings.massings.iter().map(|m| m.details.len()).sum();

    for mut text in &mut query {
        **text = format!(
            "Massings: {} | Houses: {} | Rotated: {} | Details: {}",
            count, houses, rotated, details
        );
    }
}

/// Trace the cursor ray against every massing on left click.
fn pick_under_cursor(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    cameras: Query<(&Camera, &GlobalTransform), With<OrbitCamera>>,
    massings: Res<BuildingMassings>,
    mut pick: ResMut<CursorPick>,
) {
    if !mouse_buttons.just_pressed(MouseButton::Left) {
        return;
    }
    let Ok(window) = windows.get_single() else { return };
    let Some(cursor) = window.cursor_position() else { return };
    let Ok((camera, cam_transform)) = cameras.get_single() else { return };
    let Ok(ray) = camera.viewport_to_world(cam_transform, cursor) else { return };

    let p1 = to_massing_space(ray.origin);
    let p2 = to_massing_space(ray.origin + *ray.direction * PICK_DISTANCE);

    pick.hit = massings
        .massings
        .iter()
        .enumerate()
        .filter_map(|(i, m)| m.trace(p1, p2, false).map(|h| (i, h)))
        .min_by(|a, b| a.1.t.total_cmp(&b.1.t))
        .map(|(i, h)| (i, h.kind, from_massing_space(p1.lerp(p2, h.t))));

    if let Some((i, kind, pos)) = pick.hit {
        debug!("Picked massing {} ({:?}) at {:?}", i, kind, pos);
    }
}

fn update_pick_text(pick: Res<CursorPick>, mut query: Query<&mut Text, With<PickText>>) {
    if !pick.is_changed() {
        return;
    }

    for mut text in &mut query {
        **text = match pick.hit {
            Some((i, kind, pos)) => format!("Pick: #{} {:?} @ ({:.1}, {:.1}, {:.1})", i, kind, pos.x, pos.y, pos.z),
            None => "Pick: --".to_string(),
        };
    }
}

/// Toggle debug visualization modes with keyboard.
fn toggle_debug_views(keys: Res<ButtonInput<KeyCode>>, mut config: ResMut<DebugConfig>) {
    if keys.just_pressed(KeyCode::KeyB) {
        let on = !config.show_parts;
        config.show_parts = on;
        config.show_roofs = on;
        config.show_details = on;
        info!("Massing wireframes: {}", if on { "ON" } else { "OFF" });
    }

    if keys.just_pressed(KeyCode::KeyV) {
        config.show_bcubes = !config.show_bcubes;
        info!(
            "Bounding cubes: {}",
            if config.show_bcubes { "ON" } else { "OFF" }
        );
    }
}
