use crate::error::AppError;
use crate::storage::KeyValueStore;
use std::path::{Path, PathBuf};

const STORE_DIR_ENV_VAR: &str = "OHH_STORE_DIR";
const APP_DIR_NAME: &str = "ohh";

pub fn store_dir() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    app_dir()
}

pub(crate) fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

/// One JSON document per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(store_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(AppError::invalid_input(format!("invalid storage key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
        Ok(Some(content))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|err| AppError::io(err.to_string()))?;

        // Write next to the target and rename so readers never see half a document.
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, value).map_err(|err| AppError::io(err.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&staging, permissions)
                .map_err(|err| AppError::io(err.to_string()))?;
        }

        if let Err(err) = std::fs::rename(&staging, &path) {
            std::fs::remove_file(&staging).ok();
            return Err(AppError::io(err.to_string()));
        }

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::io(err.to_string())),
        }
    }
}
