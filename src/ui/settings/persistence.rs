use super::data::UiSettings;
use anyhow::{Context, Result};
use std::{
    cell::{Ref, RefCell},
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};
use tracing::{debug, info, warn};

fn config_dir() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ribbonmeter")
}

#[derive(Debug)]
pub struct SettingsManager {
    path: PathBuf,
    pub data: UiSettings,
    // What is known to be on disk; `None` until the file has been read or written.
    stored: Option<UiSettings>,
}

impl SettingsManager {
    pub fn load_or_default() -> Self {
        Self::load_from(config_dir().join("settings.json"))
    }

    pub fn load_from(path: PathBuf) -> Self {
        let stored: Option<UiSettings> = fs::read_to_string(&path).ok().and_then(|s| {
            serde_json::from_str(&s)
                .map_err(|e| warn!("[settings] parse error {path:?}: {e}"))
                .ok()
        });
        let mut data = stored.clone().unwrap_or_default();
        data.sanitize();
        if stored.is_some() {
            debug!("[settings] loaded {path:?}");
        }
        // Out-of-range values on disk count as a change worth writing back.
        if stored.as_ref().is_some_and(|raw| *raw != data) {
            info!("[settings] clamped out-of-range values from {path:?}");
        }
        Self { path, data, stored }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &UiSettings {
        &self.data
    }

    pub fn set_window_size(&mut self, width: f32, height: f32) {
        self.data.window.width = width;
        self.data.window.height = height;
        self.data.window.sanitize();
    }

    pub fn is_dirty(&self) -> bool {
        self.stored.as_ref() != Some(&self.data)
    }

    pub fn save(&mut self) -> Result<()> {
        self.data.sanitize();
        let json = serde_json::to_string_pretty(&self.data).context("serialising settings")?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating settings directory {parent:?}"))?;
        }
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &json)
            .and_then(|()| fs::rename(&temp_path, &self.path))
            .with_context(|| format!("writing settings {:?}", self.path))?;
        self.stored = Some(self.data.clone());
        Ok(())
    }

    /// Writes the file only when the in-memory settings differ from it.
    pub fn save_if_changed(&mut self) -> Result<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.save()?;
        debug!("[settings] saved {:?}", self.path);
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct SettingsHandle(Rc<RefCell<SettingsManager>>);

impl SettingsHandle {
    pub fn new(manager: SettingsManager) -> Self {
        Self(Rc::new(RefCell::new(manager)))
    }
    pub fn load_or_default() -> Self {
        Self::new(SettingsManager::load_or_default())
    }
    pub fn borrow(&self) -> Ref<'_, SettingsManager> {
        self.0.borrow()
    }
    pub fn update<F: FnOnce(&mut SettingsManager) -> R, R>(&self, mutate: F) -> R {
        let mut manager = self.0.borrow_mut();
        let result = mutate(&mut manager);
        manager.data.sanitize();
        result
    }
    pub fn persist(&self) -> Result<bool> {
        self.0.borrow_mut().save_if_changed()
    }
}
