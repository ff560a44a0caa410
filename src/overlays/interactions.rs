use glam::Vec2;

use crate::backend::input::PointerId;

use super::image::GestureViewport;

#[derive(Debug, Clone, Copy, Default)]
pub struct PointerHit {
    pub pointer: PointerId,
    /// Hit position on the image quad, (0,0) to (1,1).
    pub uv: Vec2,
    pub dist: f32,
}

/// Receives ray-pointer events resolved against one interactable quad.
pub trait InteractionHandler {
    fn on_hover(&mut self, hit: &PointerHit);
    fn on_left(&mut self, pointer: PointerId);
    fn on_pointer(&mut self, hit: &PointerHit, pressed: bool);
}

impl GestureViewport {
    fn hit_position(&self, hit: &PointerHit) -> Vec2 {
        hit.uv * self.viewport_size()
    }
}

impl InteractionHandler for GestureViewport {
    fn on_hover(&mut self, hit: &PointerHit) {
        let pos = self.hit_position(hit);
        match self.is_inside(hit.pointer) {
            Some(true) => self.on_pointer_move(hit.pointer, pos),
            Some(false) => self.on_pointer_enter(hit.pointer, pos),
            None => {}
        }
    }

    fn on_left(&mut self, pointer: PointerId) {
        // still pressed; the contact only ends on release
        self.on_pointer_left(pointer);
    }

    fn on_pointer(&mut self, hit: &PointerHit, pressed: bool) {
        log::trace!(
            "Pointer {}: {} at {} ({:.2}m)",
            hit.pointer,
            if pressed { "press" } else { "release" },
            hit.uv,
            hit.dist
        );
        if pressed {
            let pos = self.hit_position(hit);
            self.on_pointer_down(hit.pointer, pos);
        } else {
            self.on_pointer_up(hit.pointer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlays::image::ManipulatorSettings;

    fn hit(pointer: u32, u: f32, v: f32) -> PointerHit {
        PointerHit {
            pointer: PointerId(pointer),
            uv: Vec2::new(u, v),
            dist: 1.0,
        }
    }

    #[test]
    fn hover_while_pressed_drags() {
        let mut vp = GestureViewport::new(Vec2::new(400.0, 200.0), ManipulatorSettings::default());
        vp.set_min_zoom(2.0);

        vp.on_hover(&hit(0, 0.5, 0.5));
        assert_eq!(vp.active_pointers(), 0);

        vp.on_pointer(&hit(0, 0.5, 0.5), true);
        vp.on_hover(&hit(0, 0.5, 0.5));
        vp.on_hover(&hit(0, 0.6, 0.5));

        // 0.1 uv of a 400 wide quad is 40 units: -(40 / 800) * 0.5
        let pan = vp.current_transform().pan;
        assert!(pan.abs_diff_eq(Vec2::new(-0.025, 0.0), 1e-6), "{pan}");

        vp.on_pointer(&hit(0, 0.6, 0.5), false);
        assert_eq!(vp.active_pointers(), 0);
    }

    #[test]
    fn leaving_and_reentering_keeps_the_contact() {
        let mut vp = GestureViewport::new(Vec2::new(400.0, 400.0), ManipulatorSettings::default());
        vp.set_min_zoom(2.0);

        vp.on_pointer(&hit(4, 0.5, 0.5), true);
        vp.on_hover(&hit(4, 0.5, 0.5));
        vp.on_left(PointerId(4));
        assert_eq!(vp.active_pointers(), 1);

        // re-entry far away must not produce a jump
        vp.on_hover(&hit(4, 0.9, 0.9));
        assert_eq!(vp.current_transform().pan, Vec2::ZERO);

        vp.on_hover(&hit(4, 0.8, 0.9));
        let pan = vp.current_transform().pan;
        assert!(pan.abs_diff_eq(Vec2::new(0.025, 0.0), 1e-6), "{pan}");
    }

    #[test]
    fn two_rays_pinch() {
        let mut vp = GestureViewport::new(Vec2::new(100.0, 100.0), ManipulatorSettings::default());
        vp.on_pointer(&hit(0, 0.25, 0.5), true);
        vp.on_pointer(&hit(1, 0.75, 0.5), true);
        vp.tick();

        vp.on_hover(&hit(0, 0.0, 0.5));
        vp.on_hover(&hit(1, 1.0, 0.5));
        vp.tick();

        // distance 50 -> 100
        assert!((vp.current_transform().zoom - 2.0).abs() < 1e-5);
    }
}
