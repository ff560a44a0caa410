//! Pan, pinch-zoom and rotate for an image quad driven by up to two pointers.
//!
//! One pointer pans. Two pointers pinch (distance), twist (angle) and pan (midpoint)
//! at the same time. Every change keeps the crop window inside the image.

use glam::{Affine2, Vec2};
use serde::Serialize;

use crate::backend::input::{Pointer, PointerEvent, PointerId, PointerSlots};

pub const MIN_ZOOM_FLOOR: f32 = 0.1;

/// Pointer-distance change (viewport units) below which pinch input is ignored.
const ZOOM_DEADZONE: f32 = 0.01;
/// Degrees.
const ROTATION_DEADZONE: f32 = 0.1;
/// Squared midpoint travel below which two-pointer pan is ignored.
const PAN_DEADZONE_SQ: f32 = 0.001;
const GESTURE_SCALE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ManipulatorSettings {
    pan_sensitivity: f32,
    zoom_sensitivity: f32,
    rotation_sensitivity: f32,
    min_zoom: f32,
    max_zoom: f32,
}

impl Default for ManipulatorSettings {
    fn default() -> Self {
        Self::new(0.5, 2.0, 100.0, 1.0, 5.0)
    }
}

impl ManipulatorSettings {
    pub fn new(pan: f32, zoom: f32, rotation: f32, min_zoom: f32, max_zoom: f32) -> Self {
        let mut settings = Self {
            pan_sensitivity: pan,
            zoom_sensitivity: zoom,
            rotation_sensitivity: rotation,
            min_zoom: 1.0,
            max_zoom: 1.0,
        };
        settings.set_min_zoom(min_zoom);
        settings.set_max_zoom(max_zoom);
        settings
    }

    pub const fn pan_sensitivity(&self) -> f32 {
        self.pan_sensitivity
    }

    pub const fn zoom_sensitivity(&self) -> f32 {
        self.zoom_sensitivity
    }

    pub const fn rotation_sensitivity(&self) -> f32 {
        self.rotation_sensitivity
    }

    pub const fn min_zoom(&self) -> f32 {
        self.min_zoom
    }

    pub const fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    /// Never below [`MIN_ZOOM_FLOOR`]; drags `max_zoom` up with it.
    pub fn set_min_zoom(&mut self, value: f32) {
        self.min_zoom = value.max(MIN_ZOOM_FLOOR);
        self.max_zoom = self.max_zoom.max(self.min_zoom);
    }

    /// Never below `min_zoom`.
    pub fn set_max_zoom(&mut self, value: f32) {
        self.max_zoom = value.max(self.min_zoom);
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

/// Visible-region state of the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportTransform {
    pub zoom: f32,
    /// Crop-window centre offset, as a fraction of the image extent.
    pub pan: Vec2,
    /// Degrees, unbounded.
    pub rotation: f32,
}

impl ViewportTransform {
    pub const IDENTITY: Self = Self {
        zoom: 1.0,
        pan: Vec2::ZERO,
        rotation: 0.0,
    };

    /// Side of the square crop window in UV units.
    pub fn visible_extent(&self) -> f32 {
        1.0 / self.zoom
    }

    /// How far the crop window centre may move from 0.5 on either axis.
    pub fn max_pan(&self) -> f32 {
        ((1.0 - self.visible_extent()) / 2.0).max(0.0)
    }

    pub fn uv_rect(&self) -> UvRect {
        let size = Vec2::splat(self.visible_extent());
        UvRect {
            min: Vec2::splat(0.5) + self.pan - size / 2.0,
            size,
        }
    }

    /// Rotation of the viewport container; the crop rect itself is never rotated.
    pub fn container_rotation(&self) -> Affine2 {
        Affine2::from_angle(self.rotation.to_radians())
    }

    fn clamp_pan(&mut self) {
        let max = Vec2::splat(self.max_pan());
        self.pan = self.pan.clamp(-max, max);
    }
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Normalized sub-region of the source image handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UvRect {
    pub min: Vec2,
    pub size: Vec2,
}

impl UvRect {
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TwoPointerBaseline {
    distance: f32,
    angle: f32,
}

/// Signed difference `to - from` wrapped into (-180, 180].
fn delta_angle(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

pub struct GestureViewport {
    settings: ManipulatorSettings,
    size: Vec2,
    slots: PointerSlots,
    baseline: Option<TwoPointerBaseline>,
    pending: bool,
    transform: ViewportTransform,
    uv_rect: UvRect,
}

impl GestureViewport {
    pub fn new(size: Vec2, settings: ManipulatorSettings) -> Self {
        let mut viewport = Self {
            settings,
            size: Vec2::ZERO,
            slots: PointerSlots::default(),
            baseline: None,
            pending: false,
            transform: ViewportTransform::IDENTITY,
            uv_rect: ViewportTransform::IDENTITY.uv_rect(),
        };
        viewport.set_viewport_size(size);
        viewport.reset_transform();
        viewport
    }

    pub fn handle_event(&mut self, event: PointerEvent) {
        log::trace!("Pointer {}: {}", event.id(), event);
        match event {
            PointerEvent::Down { id, pos } => self.on_pointer_down(id, pos),
            PointerEvent::Move { id, pos } => self.on_pointer_move(id, pos),
            PointerEvent::Enter { id, pos } => self.on_pointer_enter(id, pos),
            PointerEvent::Up { id } => self.on_pointer_up(id),
        }
    }

    pub fn on_pointer_down(&mut self, id: PointerId, pos: Vec2) {
        if !pos.is_finite() {
            log::trace!("Pointer {}: ignoring non-finite press {}", id, pos);
            return;
        }
        if self.slots.slot_of(id).is_some() {
            log::trace!("Pointer {}: already pressed", id);
            return;
        }
        let Some(idx) = self.slots.free_slot() else {
            log::trace!("Pointer {}: both slots taken, ignoring", id);
            return;
        };

        self.slots.pointers[idx] = Pointer::pressed(id, pos);
        log::debug!("Pointer {}: pressed into slot {}", id, idx);

        if self.slots.both_active() {
            self.baseline = None;
            self.pending = true;
        }
    }

    pub fn on_pointer_move(&mut self, id: PointerId, pos: Vec2) {
        if !pos.is_finite() {
            log::trace!("Pointer {}: ignoring non-finite move {}", id, pos);
            return;
        }
        let Some(idx) = self.slots.slot_of(id) else {
            return;
        };
        self.slots.pointers[idx].inside = true;

        if self.slots.both_active() {
            if self.baseline.is_none() {
                // measure this move against where the pair stood when it formed
                self.two_pointer_step();
            }
            self.slots.pointers[idx].now = pos;
            self.pending = true;
            return;
        }

        let delta = self.slots.pointers[idx].advance(pos);
        if delta == Vec2::ZERO {
            return;
        }
        self.transform.pan += self.screen_to_uv(delta);
        self.apply_transform();
    }

    pub fn on_pointer_enter(&mut self, id: PointerId, pos: Vec2) {
        if !pos.is_finite() {
            return;
        }
        let Some(idx) = self.slots.slot_of(id) else {
            return;
        };
        let pointer = &mut self.slots.pointers[idx];
        pointer.now = pos;
        pointer.before = pos;
        pointer.inside = true;

        // the pair re-forms around the entry position on the next tick
        if self.slots.both_active() {
            self.baseline = None;
            self.pending = true;
        }
    }

    pub fn on_pointer_up(&mut self, id: PointerId) {
        let Some(idx) = self.slots.slot_of(id) else {
            return;
        };
        self.slots.release(idx);
        self.baseline = None;
        self.pending = false;

        // the survivor continues panning from where it stands
        let other = &mut self.slots.pointers[1 - idx];
        if other.active {
            other.before = other.now;
        }
        log::debug!("Pointer {}: released slot {}", id, idx);
    }

    pub(super) fn on_pointer_left(&mut self, id: PointerId) {
        if let Some(idx) = self.slots.slot_of(id) {
            self.slots.pointers[idx].inside = false;
        }
    }

    pub(super) fn is_inside(&self, id: PointerId) -> Option<bool> {
        self.slots
            .slot_of(id)
            .map(|idx| self.slots.pointers[idx].inside)
    }

    /// Runs the two-pointer step once per frame when there is something to process.
    pub fn tick(&mut self) {
        if !self.slots.both_active() {
            return;
        }
        if self.baseline.is_some() && !self.pending {
            return;
        }
        self.two_pointer_step();
    }

    pub fn reset_transform(&mut self) {
        self.transform = ViewportTransform {
            zoom: self.settings.clamp_zoom(1.0),
            ..ViewportTransform::IDENTITY
        };
        self.apply_transform();
    }

    pub const fn current_transform(&self) -> ViewportTransform {
        self.transform
    }

    pub const fn uv_rect(&self) -> UvRect {
        self.uv_rect
    }

    pub const fn settings(&self) -> &ManipulatorSettings {
        &self.settings
    }

    pub const fn viewport_size(&self) -> Vec2 {
        self.size
    }

    pub fn active_pointers(&self) -> usize {
        self.slots.active_count()
    }

    pub fn set_viewport_size(&mut self, size: Vec2) {
        let sanitize = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        self.size = Vec2::new(sanitize(size.x), sanitize(size.y));
    }

    pub fn set_pan_sensitivity(&mut self, value: f32) {
        if value.is_finite() {
            self.settings.pan_sensitivity = value;
        }
    }

    pub fn set_zoom_sensitivity(&mut self, value: f32) {
        if value.is_finite() {
            self.settings.zoom_sensitivity = value;
        }
    }

    pub fn set_rotation_sensitivity(&mut self, value: f32) {
        if value.is_finite() {
            self.settings.rotation_sensitivity = value;
        }
    }

    pub fn set_min_zoom(&mut self, value: f32) {
        self.settings.set_min_zoom(value);
        self.reclamp_zoom();
    }

    pub fn set_max_zoom(&mut self, value: f32) {
        self.settings.set_max_zoom(value);
        self.reclamp_zoom();
    }

    fn reclamp_zoom(&mut self) {
        let zoom = self.settings.clamp_zoom(self.transform.zoom);
        if zoom != self.transform.zoom {
            log::debug!("Zoom {} reclamped to {}", self.transform.zoom, zoom);
            self.transform.zoom = zoom;
        }
        self.apply_transform();
    }

    /// Screen delta to UV delta; dragging right moves the window left.
    fn screen_to_uv(&self, delta: Vec2) -> Vec2 {
        let extent = self.size * self.transform.zoom;
        if extent.x <= 0.0 || extent.y <= 0.0 {
            return Vec2::ZERO;
        }
        let uv = -delta / extent * self.settings.pan_sensitivity;
        if uv.is_finite() {
            uv
        } else {
            Vec2::ZERO
        }
    }

    fn two_pointer_step(&mut self) {
        self.pending = false;
        let [a, b] = self.slots.pointers;

        let mid_now = (a.now + b.now) / 2.0;
        let mid_before = (a.before + b.before) / 2.0;

        let span = b.now - a.now;
        let distance = span.length();
        let angle = span.y.atan2(span.x).to_degrees();

        let Some(baseline) = self.baseline else {
            if distance.is_finite() && angle.is_finite() {
                self.baseline = Some(TwoPointerBaseline { distance, angle });
                log::debug!("Two-pointer baseline: {:.2} @ {:.2}°", distance, angle);
            }
            self.settle_pointers();
            return;
        };

        let mut next = baseline;

        if distance.is_finite() {
            let distance_delta = distance - baseline.distance;
            if distance_delta.abs() > ZOOM_DEADZONE {
                let zoom_delta = distance_delta * self.settings.zoom_sensitivity * GESTURE_SCALE;
                self.transform.zoom = self.settings.clamp_zoom(self.transform.zoom + zoom_delta);
            }
            next.distance = distance;
        }

        if angle.is_finite() {
            let angle_delta = delta_angle(baseline.angle, angle);
            if angle_delta.abs() > ROTATION_DEADZONE {
                self.transform.rotation +=
                    angle_delta * self.settings.rotation_sensitivity * GESTURE_SCALE;
            }
            next.angle = angle;
        }

        let mid_delta = mid_now - mid_before;
        if mid_delta.is_finite() && mid_delta.length_squared() > PAN_DEADZONE_SQ {
            self.transform.pan += self.screen_to_uv(mid_delta);
        }

        self.baseline = Some(next);
        self.settle_pointers();
        self.apply_transform();
    }

    fn settle_pointers(&mut self) {
        for pointer in &mut self.slots.pointers {
            pointer.settle();
        }
    }

    fn apply_transform(&mut self) {
        self.transform.clamp_pan();
        self.uv_rect = self.transform.uv_rect();
    }
}
