//! The massing of one building: ordered parts, roof surfaces, and rooftop details.

use super::error::{check_part, MassingError, Result};
use super::footprint::{calc_poly_pts, CrossSection, PolyPoints, PolygonShape};
use super::geom::Cube;
use super::rotation::Rotation;
use super::surface::{DetailObject, RoofSurface};

/// High-level building classification; houses take their own generation branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuildingKind {
    Office,
    House,
}

/// Role of a part. Only `Main` parts use the massing's cross-section family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartRole {
    Main,
    Garage,
    Shed,
    Porch,
    Basement,
    Chimney,
}

/// One axis-aligned box of the building.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Part {
    pub cube: Cube,
    pub role: PartRole,
}

impl Part {
    pub fn main(cube: Cube) -> Self {
        Self {
            cube,
            role: PartRole::Main,
        }
    }

    pub fn with_role(cube: Cube, role: PartRole) -> Self {
        Self { cube, role }
    }
}

/// Roof family chosen for a building. `Flat` is the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RoofType {
    #[default]
    Flat,
    Peaked,
    Hipped,
    Sloped,
    Dome,
    Onion,
}

#[derive(Clone, Debug)]
pub struct Massing {
    pub kind: BuildingKind,
    pub bcube: Cube,
    /// Main parts first (`real_num_parts` of them), accessory parts after.
    pub parts: Vec<Part>,
    pub real_num_parts: usize,
    pub num_sides: u32,
    pub shape: PolygonShape,
    pub rotation: Option<Rotation>,
    pub roof_type: RoofType,
    pub roof_surfaces: Vec<RoofSurface>,
    pub details: Vec<DetailObject>,
    pub fences: Vec<Cube>,
    pub driveway: Option<Cube>,
    pub has_complex_floorplan: bool,
}

impl Massing {
    pub fn new(kind: BuildingKind, footprint: Cube) -> Self {
        Self {
            kind,
            bcube: footprint,
            parts: Vec::new(),
            real_num_parts: 0,
            num_sides: 4,
            shape: PolygonShape::default(),
            rotation: None,
            roof_type: RoofType::Flat,
            roof_surfaces: Vec::new(),
            details: Vec::new(),
            fences: Vec::new(),
            driveway: None,
            has_complex_floorplan: false,
        }
    }

    pub fn is_house(&self) -> bool {
        self.kind == BuildingKind::House
    }

    pub fn section(&self) -> CrossSection {
        CrossSection::from_num_sides(self.num_sides)
    }

    /// Cross-section of one part; accessory roles are always rectangular.
    pub fn part_section(&self, part: &Part) -> CrossSection {
        if part.role == PartRole::Main {
            self.section()
        } else {
            CrossSection::Rectangle
        }
    }

    pub fn part_polygon(&self, part: &Part, out: &mut PolyPoints) {
        let num_sides = if part.role == PartRole::Main {
            self.num_sides
        } else {
            4
        };
        calc_poly_pts(&part.cube, num_sides, &self.shape, out);
    }

    pub fn main_parts(&self) -> &[Part] {
        &self.parts[..self.real_num_parts]
    }

    /// The topmost, roof-bearing main part.
    pub fn top_part(&self) -> Option<&Part> {
        self.main_parts().last()
    }

    pub fn height(&self) -> f32 {
        self.bcube.dz()
    }

    /// Append a main part, keeping main parts ahead of accessory parts.
    pub fn add_main_part(&mut self, cube: Cube) -> Result<()> {
        check_part(&cube)?;
        self.parts.insert(self.real_num_parts, Part::main(cube));
        self.real_num_parts += 1;
        Ok(())
    }

    pub fn add_accessory_part(&mut self, cube: Cube, role: PartRole) -> Result<()> {
        check_part(&cube)?;
        self.parts.push(Part::with_role(cube, role));
        self.bcube.union_with_cube(&cube);
        Ok(())
    }

    /// Union of all parts' boxes; `None` if there are no parts.
    pub fn calc_bcube_from_parts(&self) -> Option<Cube> {
        let mut iter = self.parts.iter();
        let mut bc = iter.next()?.cube;
        for p in iter {
            bc.union_with_cube(&p.cube);
        }
        Some(bc)
    }

    pub fn recompute_bcube(&mut self) -> Result<()> {
        self.bcube = self
            .calc_bcube_from_parts()
            .ok_or_else(|| MassingError::EmptyFootprint("massing has no parts".to_string()))?;
        Ok(())
    }

    /// Insert a roof surface and immediately grow the bcube to cover it.
    pub fn add_roof_surface(&mut self, surface: RoofSurface) {
        self.bcube.union_with_cube(&surface.bcube());
        self.roof_surfaces.push(surface);
    }

    /// Insert a rooftop detail and immediately grow the bcube to cover it.
    pub fn add_detail(&mut self, detail: DetailObject) {
        self.bcube.union_with_cube(&detail.cube);
        self.details.push(detail);
    }

    pub fn raise_bcube_top(&mut self, z: f32) {
        self.bcube.max.z = self.bcube.max.z.max(z);
    }

    pub fn validate(&self) -> Result<()> {
        for p in &self.parts {
            check_part(&p.cube)?;
        }
        Ok(())
    }

    pub fn is_rotated(&self) -> bool {
        self.rotation.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::massing::surface::{DetailRole, SurfaceRole};

    #[test]
    fn main_parts_stay_ahead_of_accessories() {
        let mut m = Massing::new(
            BuildingKind::House,
            Cube::from_bounds(0.0, 10.0, 0.0, 10.0, 0.0, 3.0),
        );
        m.add_main_part(Cube::from_bounds(0.0, 6.0, 0.0, 10.0, 0.0, 3.0))
            .unwrap();
        m.add_accessory_part(Cube::from_bounds(6.0, 10.0, 0.0, 4.0, 0.0, 2.5), PartRole::Garage)
            .unwrap();
        m.add_main_part(Cube::from_bounds(6.0, 10.0, 4.0, 10.0, 0.0, 3.0))
            .unwrap();

        assert_eq!(m.real_num_parts, 2);
        assert_eq!(m.parts[2].role, PartRole::Garage);
        assert_eq!(m.top_part().unwrap().cube.min.x, 6.0);
    }

    #[test]
    fn denormalized_parts_are_rejected() {
        let mut m = Massing::new(BuildingKind::Office, Cube::default());
        let bad = Cube::from_bounds(1.0, 0.0, 0.0, 1.0, 0.0, 1.0);
        assert_eq!(m.add_main_part(bad), Err(MassingError::DenormalizedPart(bad)));
    }

    #[test]
    fn insertions_grow_the_bcube() {
        let base = Cube::from_bounds(0.0, 10.0, 0.0, 10.0, 0.0, 3.0);
        let mut m = Massing::new(BuildingKind::Office, base);
        m.add_roof_surface(RoofSurface::horizontal(&base, 3.5, SurfaceRole::Helipad));
        assert_eq!(m.bcube.max.z, 3.5);
        m.add_detail(DetailObject::new(
            Cube::from_bounds(4.0, 5.0, 4.0, 5.0, 3.0, 9.0),
            DetailRole::Antenna,
        ));
        assert_eq!(m.bcube.max.z, 9.0);
    }
}
