//! Daemon configuration, layered from device presets, the main config file
//! and drop-in snippets.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::control::DeviceInfo;
use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "/etc/ipts-touch/config.toml";
pub const CONFIG_DIR: &str = "/etc/ipts-touch/config.d";
pub const PRESET_DIR: &str = "/usr/share/ipts-touch/presets";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Physical screen width in cm.
    pub width: f64,
    /// Physical screen height in cm.
    pub height: f64,

    pub invert_x: bool,
    pub invert_y: bool,

    /// Lift all contacts while any of them is flagged as a palm.
    pub disable_on_palm: bool,
}

/// Where configuration is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config_file: PathBuf,
    pub config_dir: PathBuf,
    pub preset_dir: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    device: Option<DeviceMatch>,
    touch: TouchSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeviceMatch {
    vendor: u16,
    product: u16,
}

impl DeviceMatch {
    fn matches(&self, info: &DeviceInfo) -> bool {
        self.vendor == info.vendor && self.product == info.product
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TouchSection {
    width: Option<f64>,
    height: Option<f64>,
    invert_x: Option<bool>,
    invert_y: Option<bool>,
    disable_on_palm: Option<bool>,
}

impl Config {
    /// Load the configuration for the given device.
    ///
    /// Presets whose `[device]` table matches `info` are applied first, then
    /// the main config file, then every `*.toml` in the drop-in directory.
    /// Later files override earlier ones key by key. Missing files are skipped.
    pub fn load(paths: &Paths, info: &DeviceInfo) -> Result<Self> {
        let mut config = Config::default();

        for path in toml_files(&paths.preset_dir)? {
            let file = parse(&path)?;
            if file.device.as_ref().is_some_and(|d| d.matches(info)) {
                log::info!("Using preset {}", path.display());
                config.apply(file.touch);
            }
        }

        if paths.config_file.is_file() {
            log::debug!("Loading {}", paths.config_file.display());
            config.apply(parse(&paths.config_file)?.touch);
        }

        for path in toml_files(&paths.config_dir)? {
            log::debug!("Loading {}", path.display());
            config.apply(parse(&path)?.touch);
        }

        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, touch: TouchSection) {
        if let Some(width) = touch.width {
            self.width = width;
        }
        if let Some(height) = touch.height {
            self.height = height;
        }
        if let Some(invert_x) = touch.invert_x {
            self.invert_x = invert_x;
        }
        if let Some(invert_y) = touch.invert_y {
            self.invert_y = invert_y;
        }
        if let Some(disable_on_palm) = touch.disable_on_palm {
            self.disable_on_palm = disable_on_palm;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.width > 0.0 && self.height > 0.0 {
            return Ok(());
        }

        Err(Error::InvalidSize {
            width: self.width,
            height: self.height,
        })
    }
}

fn parse(path: &Path) -> Result<ConfigFile> {
    let text = fs::read_to_string(path).map_err(|source| Error::Config {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&text).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// All `*.toml` files in `dir`, sorted by name. A missing directory is empty.
fn toml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(Error::Config {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| Error::Config {
                path: dir.to_path_buf(),
                source,
            })?
            .path();

        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
