//! Collision shapes and contact classification
//!
//! Bodies are circles or oriented rectangles. Contacts are reported as
//! unordered pairs of colliders; [`Contact::classify`] resolves a pair into a
//! gameplay outcome regardless of which side is listed first.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{EntityId, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Rectangle given by half extents before rotation
    Rect { half: Vec2 },
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// A positioned collision shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub position: Vec2,
    /// Radians, counter-clockwise
    pub rotation: f32,
    pub shape: Shape,
}

impl Body {
    pub fn circle(position: Vec2, radius: f32) -> Self {
        Self {
            position,
            rotation: 0.0,
            shape: Shape::Circle { radius },
        }
    }

    pub fn rect(position: Vec2, size: Vec2, rotation: f32) -> Self {
        Self {
            position,
            rotation,
            shape: Shape::Rect { half: size / 2.0 },
        }
    }

    /// Half of the horizontal extent (used for off-screen retirement)
    pub fn half_width(&self) -> f32 {
        (self.aabb().max.x - self.aabb().min.x) / 2.0
    }

    pub fn aabb(&self) -> Aabb {
        match self.shape {
            Shape::Circle { radius } => Aabb {
                min: self.position - Vec2::splat(radius),
                max: self.position + Vec2::splat(radius),
            },
            Shape::Rect { half } => {
                let (sin, cos) = self.rotation.sin_cos();
                let extent = Vec2::new(
                    (half.x * cos).abs() + (half.y * sin).abs(),
                    (half.x * sin).abs() + (half.y * cos).abs(),
                );
                Aabb {
                    min: self.position - extent,
                    max: self.position + extent,
                }
            }
        }
    }

    /// Coarse frame overlap, the test used when placing new entities
    pub fn frames_intersect(&self, other: &Body) -> bool {
        self.aabb().intersects(&other.aabb())
    }

    /// Exact shape overlap, the test used for contacts
    pub fn overlaps(&self, other: &Body) -> bool {
        match (self.shape, other.shape) {
            (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
                self.position.distance_squared(other.position) <= (ra + rb) * (ra + rb)
            }
            (Shape::Circle { radius }, Shape::Rect { half }) => {
                circle_rect(self.position, radius, other.position, other.rotation, half)
            }
            (Shape::Rect { half }, Shape::Circle { radius }) => {
                circle_rect(other.position, radius, self.position, self.rotation, half)
            }
            (Shape::Rect { .. }, Shape::Rect { .. }) => rect_rect(self, other),
        }
    }
}

fn circle_rect(center: Vec2, radius: f32, rect_pos: Vec2, rotation: f32, half: Vec2) -> bool {
    // Move the circle into the rectangle's local frame
    let local = Vec2::from_angle(-rotation).rotate(center - rect_pos);
    let closest = local.clamp(-half, half);
    local.distance_squared(closest) <= radius * radius
}

fn rect_corners(body: &Body) -> [Vec2; 4] {
    let half = match body.shape {
        Shape::Rect { half } => half,
        Shape::Circle { radius } => Vec2::splat(radius),
    };
    let rot = Vec2::from_angle(body.rotation);
    [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ]
    .map(|c| body.position + rot.rotate(c))
}

/// Separating axis test for two oriented rectangles
fn rect_rect(a: &Body, b: &Body) -> bool {
    let ca = rect_corners(a);
    let cb = rect_corners(b);
    let axes = [
        Vec2::from_angle(a.rotation),
        Vec2::from_angle(a.rotation).perp(),
        Vec2::from_angle(b.rotation),
        Vec2::from_angle(b.rotation).perp(),
    ];
    axes.iter().all(|axis| {
        let project = |corners: &[Vec2; 4]| {
            corners
                .iter()
                .map(|c| c.dot(*axis))
                .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p), hi.max(p)))
        };
        let (a_lo, a_hi) = project(&ca);
        let (b_lo, b_hi) = project(&cb);
        a_lo <= b_hi && b_lo <= a_hi
    })
}

/// Contact categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Ground,
    Player,
    Bullet,
    Coin,
    Powerup,
    /// A picked-up powerup on its way to the HUD; collides with nothing
    CollectedPowerup,
    Obstacle,
}

impl Category {
    pub fn of(kind: EntityKind) -> Option<Self> {
        match kind {
            EntityKind::Player => Some(Category::Player),
            EntityKind::Bullet => Some(Category::Bullet),
            EntityKind::Coin => Some(Category::Coin),
            EntityKind::Powerup => Some(Category::Powerup),
            EntityKind::CollectedPowerup => Some(Category::CollectedPowerup),
            EntityKind::Obstacle => Some(Category::Obstacle),
            EntityKind::Background | EntityKind::Warning | EntityKind::Robot => None,
        }
    }
}

/// One side of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collider {
    pub category: Category,
    pub id: Option<EntityId>,
}

impl Collider {
    pub fn new(category: Category, id: Option<EntityId>) -> Self {
        Self { category, id }
    }
}

/// A begin-contact event between two colliders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: Collider,
    pub b: Collider,
    pub point: Vec2,
}

/// Gameplay meaning of a contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactKind {
    /// Player touched the ground at the given height
    Landed { height: f32 },
    Coin(EntityId),
    Powerup(EntityId),
    Bullet(EntityId),
    Obstacle(EntityId),
}

impl Contact {
    /// Resolve the pair, whichever order the two sides were listed in
    pub fn classify(&self) -> Option<ContactKind> {
        let (player, other) = if self.a.category == Category::Player {
            (self.a, self.b)
        } else if self.b.category == Category::Player {
            (self.b, self.a)
        } else {
            return None;
        };
        debug_assert_eq!(player.category, Category::Player);

        match (other.category, other.id) {
            (Category::Ground, _) => Some(ContactKind::Landed {
                height: self.point.y,
            }),
            (Category::Coin, Some(id)) => Some(ContactKind::Coin(id)),
            (Category::Powerup, Some(id)) => Some(ContactKind::Powerup(id)),
            (Category::Bullet, Some(id)) => Some(ContactKind::Bullet(id)),
            (Category::Obstacle, Some(id)) => Some(ContactKind::Obstacle(id)),
            _ => None,
        }
    }
}
