//! Debug rendering of building massings using Bevy gizmos.

use bevy::prelude::*;

use crate::massing::footprint::PolyPoints;
use crate::massing::plugin::from_massing_space;
use crate::massing::surface::SurfaceRole;
use crate::massing::{BuildingMassings, Cube, Massing, PartRole};
use crate::simulation::walkers::Walker;
use crate::ui::DebugConfig;

pub struct DebugRenderPlugin;

impl Plugin for DebugRenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (render_massings, render_walkers));
    }
}

/// Local massing-space point to Bevy world.
fn world(m: &Massing, p: Vec3) -> Vec3 {
    from_massing_space(m.to_world(p))
}

/// Vertical prism over a closed outline.
fn draw_prism(gizmos: &mut Gizmos, m: &Massing, outline: &[Vec2], z1: f32, z2: f32, color: Color) {
    for (i, a) in outline.iter().enumerate() {
        let b = outline[(i + 1) % outline.len()];
        gizmos.line(world(m, a.extend(z1)), world(m, b.extend(z1)), color);
        gizmos.line(world(m, a.extend(z2)), world(m, b.extend(z2)), color);
    }
    // Sparse verticals keep cylinders readable.
    let step = (outline.len() / 8).max(1);
    for a in outline.iter().step_by(step) {
        gizmos.line(world(m, a.extend(z1)), world(m, a.extend(z2)), color);
    }
}

fn draw_cube(gizmos: &mut Gizmos, m: &Massing, c: &Cube, color: Color) {
    let outline = c.xy_corners(0.0).map(|p| p.truncate());
    draw_prism(gizmos, m, &outline, c.min.z, c.max.z, color);
}

fn part_color(role: PartRole) -> Color {
    match role {
        PartRole::Main => Color::srgb(0.4, 0.95, 0.6),
        PartRole::Garage | PartRole::Shed => Color::srgb(0.9, 0.75, 0.4),
        PartRole::Porch => Color::srgb(0.8, 0.6, 0.9),
        PartRole::Basement => Color::srgb(0.4, 0.4, 0.45),
        PartRole::Chimney => Color::srgb(0.85, 0.35, 0.3),
    }
}

fn surface_color(role: SurfaceRole) -> Color {
    match role {
        SurfaceRole::RoofFace => Color::srgb(1.0, 0.6, 0.2),
        SurfaceRole::Wall => Color::srgb(0.8, 0.8, 0.7),
        SurfaceRole::Cap | SurfaceRole::Trim => Color::srgb(0.9, 0.9, 0.9),
        SurfaceRole::Helipad => Color::srgb(1.0, 1.0, 0.2),
        SurfaceRole::SolarPanel => Color::srgb(0.2, 0.4, 1.0),
        SurfaceRole::AccessHatch => Color::srgb(0.9, 0.2, 0.9),
    }
}

fn render_massings(massings: Res<BuildingMassings>, config: Res<DebugConfig>, mut gizmos: Gizmos) {
    if !massings.generated {
        return;
    }

    let mut outline = PolyPoints::new();
    for m in &massings.massings {
        if config.show_parts {
            for part in &m.parts {
                m.part_polygon(part, &mut outline);
                draw_prism(&mut gizmos, m, &outline, part.cube.min.z, part.cube.max.z, part_color(part.role));
            }
            let accessory = Color::srgb(0.6, 0.5, 0.4);
            for c in m.fences.iter().chain(m.driveway.iter()) {
                draw_cube(&mut gizmos, m, c, accessory);
            }
        }

        if config.show_roofs {
            for s in &m.roof_surfaces {
                let color = surface_color(s.role);
                for (i, a) in s.pts.iter().enumerate() {
                    let b = s.pts[(i + 1) % s.pts.len()];
                    gizmos.line(world(m, *a), world(m, b), color);
                }
            }
        }

        if config.show_details {
            let color = Color::srgb(0.3, 0.9, 0.9);
            for d in &m.details {
                draw_cube(&mut gizmos, m, &d.cube, color);
            }
        }

        if config.show_bcubes {
            // The bcube is already in world space.
            let c = m.bcube;
            let color = Color::srgba(1.0, 1.0, 1.0, 0.3);
            let corners = c.xy_corners(0.0);
            for (i, a) in corners.iter().enumerate() {
                let b = corners[(i + 1) % 4];
                for z in [c.min.z, c.max.z] {
                    gizmos.line(
                        from_massing_space(a.truncate().extend(z)),
                        from_massing_space(b.truncate().extend(z)),
                        color,
                    );
                }
                gizmos.line(
                    from_massing_space(a.truncate().extend(c.min.z)),
                    from_massing_space(a.truncate().extend(c.max.z)),
                    color,
                );
            }
        }
    }
}

fn render_walkers(walkers: Query<(&Transform, &Walker)>, mut gizmos: Gizmos) {
    for (transform, walker) in &walkers {
        let color = if walker.grounded {
            Color::srgb(0.2, 1.0, 0.3)
        } else {
            Color::srgb(1.0, 0.3, 0.2)
        };
        gizmos.sphere(Isometry3d::from_translation(transform.translation), walker.radius, color);
    }
}
