use std::path::Path;

use crate::config_io::get_conf_d_path;
use crate::overlays::image::{ManipulatorSettings, MIN_ZOOM_FLOOR};
use config::Config;
use config::File;
use glam::Vec2;
use log::error;
use serde::Deserialize;
use serde::Serialize;

fn def_half() -> f32 {
    0.5
}

fn def_two() -> f32 {
    2.0
}

fn def_hundred() -> f32 {
    100.0
}

fn def_one() -> f32 {
    1.0
}

fn def_five() -> f32 {
    5.0
}

fn def_viewport_size() -> [f32; 2] {
    [1000.0, 1000.0]
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeneralConfig {
    #[serde(default = "def_half")]
    pub pan_sensitivity: f32,

    #[serde(default = "def_two")]
    pub zoom_sensitivity: f32,

    #[serde(default = "def_hundred")]
    pub rotation_sensitivity: f32,

    #[serde(default = "def_one")]
    pub min_zoom: f32,

    #[serde(default = "def_five")]
    pub max_zoom: f32,

    /// Size of the image quad in pointer coordinates.
    #[serde(default = "def_viewport_size")]
    pub viewport_size: [f32; 2],
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            pan_sensitivity: def_half(),
            zoom_sensitivity: def_two(),
            rotation_sensitivity: def_hundred(),
            min_zoom: def_one(),
            max_zoom: def_five(),
            viewport_size: def_viewport_size(),
        }
    }
}

impl GeneralConfig {
    fn sanitize_sensitivity(name: &str, val: &mut f32, default: f32) {
        if !val.is_finite() {
            log::warn!("GeneralConfig: {} is not a number, using {}", name, default);
            *val = default;
        }
    }

    /// Clamps every value into its usable range instead of rejecting the file.
    pub fn sanitize(&mut self) {
        Self::sanitize_sensitivity("pan_sensitivity", &mut self.pan_sensitivity, def_half());
        Self::sanitize_sensitivity("zoom_sensitivity", &mut self.zoom_sensitivity, def_two());
        Self::sanitize_sensitivity(
            "rotation_sensitivity",
            &mut self.rotation_sensitivity,
            def_hundred(),
        );

        let min_zoom = self.min_zoom.max(MIN_ZOOM_FLOOR);
        if min_zoom != self.min_zoom {
            log::warn!(
                "GeneralConfig: min_zoom {} raised to {}",
                self.min_zoom,
                min_zoom
            );
            self.min_zoom = min_zoom;
        }

        let max_zoom = self.max_zoom.max(self.min_zoom);
        if max_zoom != self.max_zoom {
            log::warn!(
                "GeneralConfig: max_zoom {} raised to min_zoom {}",
                self.max_zoom,
                max_zoom
            );
            self.max_zoom = max_zoom;
        }

        for axis in &mut self.viewport_size {
            if !axis.is_finite() || *axis < 0.0 {
                log::warn!("GeneralConfig: viewport_size {} replaced with 0", axis);
                *axis = 0.0;
            }
        }
    }

    pub fn settings(&self) -> ManipulatorSettings {
        ManipulatorSettings::new(
            self.pan_sensitivity,
            self.zoom_sensitivity,
            self.rotation_sensitivity,
            self.min_zoom,
            self.max_zoom,
        )
    }

    pub fn viewport_size(&self) -> Vec2 {
        Vec2::from_array(self.viewport_size)
    }
}

pub fn load_general(root: &Path) -> GeneralConfig {
    let mut config = match build_general(root) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load settings, falling back to defaults.");
            error!("{:#}", e);
            GeneralConfig::default()
        }
    };
    config.sanitize();
    config
}

fn build_general(root: &Path) -> anyhow::Result<GeneralConfig> {
    let mut settings_builder = Config::builder();

    // Add files from conf.d directory
    let path_conf_d = get_conf_d_path(root);

    for base_conf in [root.to_path_buf(), path_conf_d.clone()] {
        let base_conf = base_conf.join("config.yaml");
        if base_conf.exists() {
            log::info!("Loading config file: {}", base_conf.to_string_lossy());
            settings_builder = settings_builder.add_source(File::from(base_conf));
        }
    }

    if let Ok(paths_unsorted) = std::fs::read_dir(&path_conf_d) {
        let mut paths: Vec<_> = paths_unsorted
            .filter_map(|r| match r {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    error!("Failed to read conf.d directory: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file() && !path.ends_with("config.yaml"))
            .collect();
        // Sort paths alphabetically
        paths.sort();
        for path in paths {
            log::info!("Loading config file: {}", path.to_string_lossy());
            settings_builder = settings_builder.add_source(File::from(path));
        }
    }

    let settings = settings_builder.build()?;
    Ok(settings.try_deserialize::<GeneralConfig>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_root_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_general(dir.path());
        assert_eq!(config, GeneralConfig::default());
    }

    #[test]
    fn conf_d_overrides_root_in_alphabetical_order() {
        let dir = tempfile::tempdir().unwrap();
        let conf_d = get_conf_d_path(dir.path());
        std::fs::create_dir(&conf_d).unwrap();

        std::fs::write(
            dir.path().join("config.yaml"),
            "pan_sensitivity: 0.25\nmax_zoom: 8\n",
        )
        .unwrap();
        std::fs::write(conf_d.join("10-zoom.yaml"), "max_zoom: 3\n").unwrap();
        std::fs::write(conf_d.join("20-zoom.yaml"), "max_zoom: 4\n").unwrap();

        let config = load_general(dir.path());
        assert_eq!(config.pan_sensitivity, 0.25);
        assert_eq!(config.max_zoom, 4.0);
        assert_eq!(config.zoom_sensitivity, 2.0);
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.yaml"), "min_zoom: [oops\n").unwrap();

        let config = load_general(dir.path());
        assert_eq!(config, GeneralConfig::default());
    }

    #[test]
    fn sanitize_clamps_zoom_bounds() {
        let mut config = GeneralConfig {
            min_zoom: 0.0,
            max_zoom: -3.0,
            ..Default::default()
        };
        config.sanitize();
        assert_eq!(config.min_zoom, MIN_ZOOM_FLOOR);
        assert_eq!(config.max_zoom, MIN_ZOOM_FLOOR);

        let mut config = GeneralConfig {
            min_zoom: 6.0,
            max_zoom: 2.0,
            ..Default::default()
        };
        config.sanitize();
        assert_eq!(config.min_zoom, 6.0);
        assert_eq!(config.max_zoom, 6.0);
    }

    #[test]
    fn sanitize_replaces_bad_sensitivities_and_sizes() {
        let mut config = GeneralConfig {
            zoom_sensitivity: f32::NAN,
            rotation_sensitivity: f32::INFINITY,
            viewport_size: [-10.0, f32::NAN],
            ..Default::default()
        };
        config.sanitize();
        assert_eq!(config.zoom_sensitivity, 2.0);
        assert_eq!(config.rotation_sensitivity, 100.0);
        assert_eq!(config.viewport_size, [0.0, 0.0]);
    }
}
