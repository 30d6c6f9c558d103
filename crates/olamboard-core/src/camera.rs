//! Camera module for pan/zoom transforms and inertial scrolling.

use crate::grid::CELL_SIZE;
use crate::input::WheelInput;
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Scale used when the board first opens.
pub const INITIAL_SCALE: f64 = 0.5;
/// Smallest allowed scale.
pub const MIN_SCALE: f64 = 0.02;
/// Largest allowed scale.
pub const MAX_SCALE: f64 = 50.0;
/// Per-frame velocity damping factor.
pub const INERTIA_DAMPING: f64 = 0.9;
/// Inertia stops once both velocity components fall under this (world units per frame).
pub const INERTIA_CUTOFF: f64 = 1.0;
/// Wheel delta that corresponds to doubling (plus one) the zoom factor.
const WHEEL_ZOOM_DIVISOR: f64 = 1000.0;

/// Camera manages the view transform for the board.
///
/// `offset` is the world coordinate shown at the top-left corner of the
/// screen, so `screen = (world - offset) * scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// World coordinate at the screen origin.
    pub offset: Vec2,
    /// Screen pixels per world unit.
    pub scale: f64,
    /// Inertial velocity in world units per frame.
    pub velocity: Vec2,
    /// Whether inertia is currently running.
    pub has_velocity: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            velocity: Vec2::ZERO,
            has_velocity: false,
        }
    }
}

/// Camera state captured when a single-contact pan begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanAnchor {
    pub offset: Vec2,
    pub scale: f64,
    pub screen: Point,
}

/// Camera state captured when two contacts are paired into a pinch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchAnchor {
    pub offset: Vec2,
    pub scale: f64,
    /// Screen midpoint of the two contacts at pairing time.
    pub midpoint: Point,
    /// Screen distance between the two contacts at pairing time.
    pub distance: f64,
}

impl Camera {
    /// Create a new camera with identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera framing the first row of cards for a viewport of the given height.
    pub fn initial_for_viewport(viewport_height: f64) -> Self {
        let scale = INITIAL_SCALE;
        Self {
            offset: Vec2::new(-CELL_SIZE / 2.0, -(viewport_height - CELL_SIZE) / 2.0 / scale),
            scale,
            ..Self::default()
        }
    }

    /// Get the affine transform for rendering (world to screen).
    pub fn transform(&self) -> Affine {
        Affine::scale(self.scale) * Affine::translate(-self.offset)
    }

    /// Get the inverse transform for input handling (screen to world).
    pub fn inverse_transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(1.0 / self.scale)
    }

    /// Convert a screen point to world coordinates.
    pub fn to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Capture the state a pan gesture is computed against.
    pub fn pan_anchor(&self, screen: Point) -> PanAnchor {
        PanAnchor {
            offset: self.offset,
            scale: self.scale,
            screen,
        }
    }

    /// Move the camera so the world point under `anchor.screen` follows the contact.
    pub fn pan_from(&mut self, anchor: &PanAnchor, current: Point) {
        self.offset = anchor.offset + anchor.screen.to_vec2() / anchor.scale
            - current.to_vec2() / self.scale;
    }

    /// Capture the state a pinch gesture is computed against.
    pub fn pinch_anchor(&self, a: Point, b: Point) -> PinchAnchor {
        PinchAnchor {
            offset: self.offset,
            scale: self.scale,
            midpoint: a.midpoint(b),
            distance: a.distance(b),
        }
    }

    /// Rescale by the change in contact distance, keeping the world point
    /// under the original midpoint under the current midpoint.
    pub fn pinch_to(&mut self, anchor: &PinchAnchor, a: Point, b: Point) {
        let midpoint = a.midpoint(b);
        if anchor.distance > 0.0 {
            self.scale = clamp_scale(a.distance(b) / anchor.distance * anchor.scale);
        }
        self.offset = anchor.offset + anchor.midpoint.to_vec2() / anchor.scale
            - midpoint.to_vec2() / self.scale;
    }

    /// Zoom the camera, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_scale = clamp_scale(self.scale * factor);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.to_world(screen_point);
        self.scale = new_scale;
        self.offset = world_point.to_vec2() - screen_point.to_vec2() / self.scale;
    }

    /// Apply a wheel event: zoom with ctrl/meta held, otherwise scroll.
    /// Shift swaps the horizontal and vertical scroll axes.
    pub fn wheel(&mut self, input: &WheelInput) {
        let delta = input.delta;
        if input.modifiers.command() {
            let factor = 1.0 + delta.y.abs() / WHEEL_ZOOM_DIVISOR;
            if delta.y > 0.0 {
                self.zoom_at(input.position, 1.0 / factor);
            } else if delta.y < 0.0 {
                self.zoom_at(input.position, factor);
            }
        } else {
            let scroll = if input.modifiers.shift {
                Vec2::new(delta.y, delta.x)
            } else {
                delta
            };
            self.offset += scroll / self.scale;
        }
    }

    /// Start inertial scrolling.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
        self.has_velocity = true;
    }

    /// Stop any inertial scrolling.
    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
        self.has_velocity = false;
    }

    /// Advance inertia by one frame. Returns true if the camera moved.
    pub fn tick(&mut self) -> bool {
        if !self.has_velocity {
            return false;
        }
        self.velocity *= INERTIA_DAMPING;
        self.offset += self.velocity;
        if self.velocity.x.abs() < INERTIA_CUTOFF && self.velocity.y.abs() < INERTIA_CUTOFF {
            self.has_velocity = false;
        }
        true
    }
}

fn clamp_scale(scale: f64) -> f64 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}
