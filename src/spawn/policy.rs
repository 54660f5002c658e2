//! Caller-supplied placement policy: forbidden ground and nudging
//!
//! The spawner asks a policy whether a world position may be built on and,
//! for a forbidden town origin, where to move it instead. World-radius
//! limits are checked by the spawner itself from `TownConfig`.

use crate::core::types::Vec3;
use ahash::AHashSet;

/// How many rings of cells `BlockedGround::nudge` searches outward
pub const MAX_NUDGE_RINGS: i32 = 64;

/// Where entities may be placed
pub trait PlacementPolicy {
    /// Whether nothing may be built at this world position
    fn is_forbidden(&self, _position: Vec3) -> bool {
        false
    }

    /// A permitted position near a forbidden one, if the policy knows one
    fn nudge(&self, _position: Vec3) -> Option<Vec3> {
        None
    }
}

/// Everything inside the world radius is allowed
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenWorld;

impl PlacementPolicy for OpenWorld {}

type Predicate = Box<dyn Fn(Vec3) -> bool + Send + Sync>;
type Nudge = Box<dyn Fn(Vec3) -> Vec3 + Send + Sync>;

/// Policy assembled from closures; missing hooks allow everything
#[derive(Default)]
pub struct FnPolicy {
    forbidden: Option<Predicate>,
    nudge: Option<Nudge>,
}

impl FnPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forbidden(mut self, f: impl Fn(Vec3) -> bool + Send + Sync + 'static) -> Self {
        self.forbidden = Some(Box::new(f));
        self
    }

    pub fn with_nudge(mut self, f: impl Fn(Vec3) -> Vec3 + Send + Sync + 'static) -> Self {
        self.nudge = Some(Box::new(f));
        self
    }
}

impl PlacementPolicy for FnPolicy {
    fn is_forbidden(&self, position: Vec3) -> bool {
        self.forbidden.as_ref().is_some_and(|f| f(position))
    }

    fn nudge(&self, position: Vec3) -> Option<Vec3> {
        self.nudge.as_ref().map(|f| f(position))
    }
}

/// Grid of forbidden ground cells on the XZ plane
#[derive(Debug, Clone)]
pub struct BlockedGround {
    cells: AHashSet<(i32, i32)>,
    cell_size: f32,
}

impl BlockedGround {
    /// Create a new BlockedGround with the given cell size
    pub fn with_cell_size(cell_size: f32) -> Self {
        Self {
            cells: AHashSet::new(),
            cell_size: cell_size.max(0.001),
        }
    }

    /// Block a cell at grid coordinates
    pub fn block(&mut self, x: i32, z: i32) {
        self.cells.insert((x, z));
    }

    /// Unblock a cell at grid coordinates
    pub fn unblock(&mut self, x: i32, z: i32) {
        self.cells.remove(&(x, z));
    }

    pub fn is_blocked(&self, x: i32, z: i32) -> bool {
        self.cells.contains(&(x, z))
    }

    /// Block every cell touched by the rectangle `[min, max]` on XZ
    pub fn block_rect(&mut self, min: Vec3, max: Vec3) {
        let (x0, z0) = self.world_to_cell(min.min(max));
        let (x1, z1) = self.world_to_cell(min.max(max));
        for x in x0..=x1 {
            for z in z0..=z1 {
                self.block(x, z);
            }
        }
    }

    /// Convert world position to cell coordinates
    pub fn world_to_cell(&self, pos: Vec3) -> (i32, i32) {
        let x = (pos.x / self.cell_size).floor() as i32;
        let z = (pos.z / self.cell_size).floor() as i32;
        (x, z)
    }

    fn cell_center(&self, x: i32, z: i32, y: f32) -> Vec3 {
        Vec3::new(
            (x as f32 + 0.5) * self.cell_size,
            y,
            (z as f32 + 0.5) * self.cell_size,
        )
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl PlacementPolicy for BlockedGround {
    fn is_forbidden(&self, position: Vec3) -> bool {
        let (x, z) = self.world_to_cell(position);
        self.is_blocked(x, z)
    }

    /// Nearest free cell centre, searching square rings outward
    fn nudge(&self, position: Vec3) -> Option<Vec3> {
        let (cx, cz) = self.world_to_cell(position);
        if !self.is_blocked(cx, cz) {
            return Some(position);
        }
        for ring in 1..=MAX_NUDGE_RINGS {
            let mut best: Option<(f32, Vec3)> = None;
            for dx in -ring..=ring {
                for dz in -ring..=ring {
                    if dx.abs() != ring && dz.abs() != ring {
                        continue;
                    }
                    if self.is_blocked(cx + dx, cz + dz) {
                        continue;
                    }
                    let candidate = self.cell_center(cx + dx, cz + dz, position.y);
                    let dist = candidate.distance_squared(position);
                    if best.map_or(true, |(d, _)| dist < d) {
                        best = Some((dist, candidate));
                    }
                }
            }
            if let Some((_, candidate)) = best {
                return Some(candidate);
            }
        }
        None
    }
}
