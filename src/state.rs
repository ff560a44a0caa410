use std::path::PathBuf;

use crate::{
    config::{load_general, GeneralConfig},
    config_io::{self, CONFIG_ROOT_PATH},
    overlays::image::GestureViewport,
};

pub struct AppState {
    pub session: AppSession,
    pub viewport: GestureViewport,
}

impl AppState {
    pub fn new(session: AppSession) -> Self {
        let viewport =
            GestureViewport::new(session.config.viewport_size(), session.config.settings());
        Self { session, viewport }
    }
}

pub struct AppSession {
    pub config_root_path: PathBuf,
    pub config: GeneralConfig,
}

impl AppSession {
    pub fn load(config_root: Option<PathBuf>) -> Self {
        let config_root_path =
            config_io::ensure_config_root(&config_root.unwrap_or_else(|| CONFIG_ROOT_PATH.clone()));
        let config = load_general(&config_root_path);
        log::debug!("Loaded config: {:?}", config);

        Self {
            config_root_path,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn viewport_follows_loaded_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "viewport_size: [640, 480]\nmin_zoom: 2\n",
        )
        .unwrap();

        let app = AppState::new(AppSession::load(Some(dir.path().to_path_buf())));
        assert!(app.session.config_root_path.join("conf.d").is_dir());
        assert_eq!(app.viewport.viewport_size(), Vec2::new(640.0, 480.0));
        assert_eq!(app.viewport.settings().min_zoom(), 2.0);
        assert_eq!(app.viewport.current_transform().zoom, 2.0);
    }
}
