use crate::config::EntitySpec;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Enemy,
    Boss,
    Projectile,
    Key,
    Portal,
    Attack,
    ParallaxLayer,
}

impl EntityKind {
    pub const fn feels_gravity(self) -> bool {
        matches!(self, Self::Player | Self::Enemy | Self::Boss)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
            Self::Boss => "boss",
            Self::Projectile => "projectile",
            Self::Key => "key",
            Self::Portal => "portal",
            Self::Attack => "attack",
            Self::ParallaxLayer => "parallax_layer",
        }
    }
}

/// Frame clock for a sprite sheet. `speed` scales elapsed time; `looped`
/// latches once the first full cycle has been shown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    frame_count: u32,
    frame_duration_ms: u32,
    elapsed_ms: f32,
    speed: f32,
    looped: bool,
}

impl Animation {
    pub fn new(frame_count: u32, frame_duration_ms: u32) -> Self {
        Self {
            frame_count: frame_count.max(1),
            frame_duration_ms: frame_duration_ms.max(1),
            elapsed_ms: 0.0,
            speed: 1.0,
            looped: false,
        }
    }

    pub fn update(&mut self, elapsed_ms: f32) {
        self.elapsed_ms += elapsed_ms.max(0.0) * self.speed;
        if self.elapsed_ms >= self.cycle_ms() {
            self.looped = true;
            self.elapsed_ms %= self.cycle_ms();
        }
    }

    pub fn frame(&self) -> u32 {
        ((self.elapsed_ms / self.frame_duration_ms as f32) as u32).min(self.frame_count - 1)
    }

    pub fn has_looped(&self) -> bool {
        self.looped
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn cycle_ms(&self) -> f32 {
        (self.frame_count * self.frame_duration_ms) as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
    pub visible: bool,
    pub flip_x: bool,
    pub animation: Animation,
    pub health: Option<i32>,
    /// Owned by Enemy and Boss; shares the parent's lifetime.
    pub attack: Option<Box<Entity>>,
}

impl Entity {
    pub fn from_spec(id: EntityId, kind: EntityKind, spec: &EntitySpec, position: Vec2) -> Self {
        Self {
            id,
            kind,
            position,
            velocity: Vec2::default(),
            width: spec.width,
            height: spec.height,
            scale: spec.scale,
            visible: true,
            flip_x: false,
            animation: Animation::new(spec.frame_count, spec.frame_duration_ms),
            health: spec.health,
            attack: None,
        }
    }

    /// Moves by velocity over `elapsed_ms` and steps the animation. The attack
    /// sub-entity advances with its parent.
    pub fn advance(&mut self, elapsed_ms: f32) {
        self.animation.update(elapsed_ms);
        self.position.x += self.velocity.x * elapsed_ms;
        self.position.y += self.velocity.y * elapsed_ms;
        if let Some(attack) = self.attack.as_deref_mut() {
            attack.advance(elapsed_ms);
        }
    }

    /// Returns the health left after the drain, or `None` for entities without health.
    pub fn drain_health(&mut self, amount: i32) -> Option<i32> {
        let health = self.health.as_mut()?;
        *health = health.saturating_sub(amount);
        Some(*health)
    }

    pub fn is_defeated(&self) -> bool {
        self.health.is_some_and(|health| health < 0)
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::scaled(self.position, self.width, self.height, self.scale)
    }
}

/// Axis-aligned box in world pixels, already multiplied by the render scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn scaled(origin: Vec2, width: f32, height: f32, scale: f32) -> Self {
        Self {
            min: origin,
            max: Vec2::new(origin.x + width * scale, origin.y + height * scale),
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}
