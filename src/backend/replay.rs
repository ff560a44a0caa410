//! Headless driver that feeds a recorded gesture script into a viewport.

use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;

use crate::overlays::{
    image::{GestureViewport, ViewportTransform},
    interactions::{InteractionHandler, PointerHit},
};

use super::input::{PointerEvent, PointerId};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("could not read script {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid gesture script: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Down { id: PointerId, pos: Vec2 },
    Move { id: PointerId, pos: Vec2 },
    Enter { id: PointerId, pos: Vec2 },
    Up { id: PointerId },
    /// Ray hits, in UV space of the image quad.
    Press { id: PointerId, uv: Vec2 },
    Hover { id: PointerId, uv: Vec2 },
    Release { id: PointerId, uv: Vec2 },
    Leave { id: PointerId },
    Tick,
    Reset,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GestureScript {
    #[serde(default)]
    pub viewport_size: Option<[f32; 2]>,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<ScriptStep>,
}

impl GestureScript {
    pub fn parse(yaml: &str) -> Result<Self, ReplayError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        log::info!("Loading gesture script {}", path.to_string_lossy());
        let yaml = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&yaml)
    }
}

fn hit(id: PointerId, uv: Vec2) -> PointerHit {
    PointerHit {
        pointer: id,
        uv,
        dist: 0.0,
    }
}

fn apply_step(viewport: &mut GestureViewport, step: &ScriptStep) {
    match *step {
        ScriptStep::Down { id, pos } => viewport.handle_event(PointerEvent::Down { id, pos }),
        ScriptStep::Move { id, pos } => viewport.handle_event(PointerEvent::Move { id, pos }),
        ScriptStep::Enter { id, pos } => viewport.handle_event(PointerEvent::Enter { id, pos }),
        ScriptStep::Up { id } => viewport.handle_event(PointerEvent::Up { id }),
        ScriptStep::Press { id, uv } => viewport.on_pointer(&hit(id, uv), true),
        ScriptStep::Hover { id, uv } => viewport.on_hover(&hit(id, uv)),
        ScriptStep::Release { id, uv } => viewport.on_pointer(&hit(id, uv), false),
        ScriptStep::Leave { id } => viewport.on_left(id),
        ScriptStep::Tick => viewport.tick(),
        ScriptStep::Reset => viewport.reset_transform(),
    }
}

/// Applies every step in order and returns the transform observed after each one.
pub fn replay(script: &GestureScript, viewport: &mut GestureViewport) -> Vec<ViewportTransform> {
    if let Some(size) = script.viewport_size {
        viewport.set_viewport_size(Vec2::from_array(size));
    }

    script
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            apply_step(viewport, step);
            let transform = viewport.current_transform();
            log::debug!(
                "Step {} {:?}: {:?} ({} pointers down)",
                i,
                step,
                transform,
                viewport.active_pointers()
            );
            transform
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlays::image::ManipulatorSettings;

    const PINCH: &str = r"
viewport_size: [500, 500]
steps:
  - down: { id: 1, pos: [100, 100] }
  - down: { id: 2, pos: [200, 100] }
  - tick
  - move: { id: 1, pos: [80, 100] }
  - move: { id: 2, pos: [220, 100] }
  - tick
  - up: { id: 2 }
  - reset
";

    #[test]
    fn pinch_script_replays() {
        let script = GestureScript::parse(PINCH).unwrap();
        assert_eq!(script.steps.len(), 8);
        assert_eq!(script.steps[2], ScriptStep::Tick);

        let mut viewport = GestureViewport::new(Vec2::ZERO, ManipulatorSettings::default());
        let frames = replay(&script, &mut viewport);

        assert_eq!(viewport.viewport_size(), Vec2::new(500.0, 500.0));
        assert_eq!(frames.len(), 8);
        assert_eq!(frames[2], ViewportTransform::IDENTITY);
        assert!((frames[5].zoom - 1.8).abs() < 1e-5);
        assert_eq!(frames[7], ViewportTransform::IDENTITY);
        assert_eq!(viewport.active_pointers(), 1);
    }

    #[test]
    fn ray_steps_go_through_the_interaction_handler() {
        let script = GestureScript::parse(
            r"
steps:
  - press: { id: 0, uv: [0.5, 0.5] }
  - hover: { id: 0, uv: [0.5, 0.5] }
  - leave: { id: 0 }
  - hover: { id: 0, uv: [0.4, 0.5] }
  - release: { id: 0, uv: [0.4, 0.5] }
",
        )
        .unwrap();

        let mut viewport =
            GestureViewport::new(Vec2::new(100.0, 100.0), ManipulatorSettings::default());
        let frames = replay(&script, &mut viewport);
        assert_eq!(frames.len(), 5);
        assert_eq!(viewport.active_pointers(), 0);
    }

    #[test]
    fn bad_scripts_are_reported() {
        let err = GestureScript::parse("steps:\n  - wiggle: { id: 1 }\n").unwrap_err();
        assert!(matches!(err, ReplayError::Parse(_)));

        let err = GestureScript::load(Path::new("/nonexistent/script.yaml")).unwrap_err();
        assert!(matches!(err, ReplayError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/script.yaml"));
    }
}
