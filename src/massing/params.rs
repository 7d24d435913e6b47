//! Material/config lookup consumed by generation.

/// Side count used to approximate a vertical cylinder.
pub const N_CYL_SIDES: u32 = 36;
/// Retry budget for placing one complex-floorplan level.
pub const MAX_CSG_ATTEMPTS: u32 = 200;
/// Retry budget for placing one rooftop accessory.
pub const MAX_DETAIL_ATTEMPTS: u32 = 100;

/// Per-material generation parameters. Distances are in meters.
#[derive(Clone, Debug)]
pub struct BuildingParams {
    /// Vertical distance between floors; also the unit level heights are snapped to.
    pub floor_spacing: f32,
    pub floor_thickness: f32,
    pub wall_thickness: f32,
    pub door_height: f32,

    pub min_levels: u32,
    pub max_levels: u32,
    /// Lower bound on the height of a single level.
    pub min_level_height: f32,

    /// Cumulative cross-section probabilities: round first, then cube; the rest is N-gon.
    pub prob_round: f32,
    pub prob_cube: f32,
    pub min_sides: u32,
    pub max_sides: u32,
    /// Upper bound on the clipped-side fraction of an N-gon (0 disables).
    pub max_flat_side_amt: f32,
    /// Upper bound on the alternating-step (chamfer) factor (0 disables).
    pub max_alt_step_factor: f32,

    pub split_prob: f32,
    pub complex_floorplan_prob: f32,
    /// Minimum horizontal size, in floor spacings, for a footprint to be split.
    pub min_split_size_floors: f32,

    pub rotate_prob: f32,
    /// Maximum yaw magnitude in degrees.
    pub max_rot_angle: f32,

    pub dome_roof: bool,
    pub onion_roof: bool,
    /// Ridge height as a fraction of the short side of a peaked or hipped roof.
    pub peak_height_frac: f32,
    pub non_flat_roof_prob: f32,

    pub house: HouseParams,
    pub details: DetailParams,
}

/// Probabilities specific to the house branch.
#[derive(Clone, Debug)]
pub struct HouseParams {
    pub two_part_prob: f32,
    pub two_story_prob: f32,
    pub garage_prob: f32,
    pub shed_prob: f32,
    pub porch_prob: f32,
    pub fence_prob: f32,
    pub basement_prob: f32,
    pub chimney_prob: f32,
    pub solar_prob: f32,
    pub hipped_roof_prob: f32,
}

/// Rooftop accessory tuning.
#[derive(Clone, Debug)]
pub struct DetailParams {
    pub parapet_prob: f32,
    pub max_ac_units: u32,
    pub max_roof_blocks: u32,
    pub antenna_prob: f32,
    /// Helipads are rolled with probability `1 / helipad_one_in`.
    pub helipad_one_in: u32,
    pub helipad_min_levels: u32,
    pub sign_prob: f32,
    pub hatch_prob: f32,
}

impl Default for BuildingParams {
    fn default() -> Self {
        Self {
            floor_spacing: 3.2,
            floor_thickness: 0.25,
            wall_thickness: 0.3,
            door_height: 2.2,
            min_levels: 1,
            max_levels: 6,
            min_level_height: 3.2,
            prob_round: 0.08,
            prob_cube: 0.72,
            min_sides: 3,
            max_sides: 8,
            max_flat_side_amt: 0.35,
            max_alt_step_factor: 0.6,
            split_prob: 0.4,
            complex_floorplan_prob: 0.5,
            min_split_size_floors: 4.0,
            rotate_prob: 0.25,
            max_rot_angle: 30.0,
            dome_roof: true,
            onion_roof: true,
            peak_height_frac: 0.35,
            non_flat_roof_prob: 0.75,
            house: HouseParams::default(),
            details: DetailParams::default(),
        }
    }
}

impl Default for HouseParams {
    fn default() -> Self {
        Self {
            two_part_prob: 0.7,
            two_story_prob: 0.5,
            garage_prob: 0.4,
            shed_prob: 0.2,
            porch_prob: 0.3,
            fence_prob: 0.5,
            basement_prob: 0.3,
            chimney_prob: 0.6,
            solar_prob: 0.3,
            hipped_roof_prob: 0.3,
        }
    }
}

impl Default for DetailParams {
    fn default() -> Self {
        Self {
            parapet_prob: 0.6,
            max_ac_units: 8,
            max_roof_blocks: 3,
            antenna_prob: 0.3,
            helipad_one_in: 12,
            helipad_min_levels: 8,
            sign_prob: 0.2,
            hatch_prob: 0.5,
        }
    }
}
