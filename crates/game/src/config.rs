use std::path::Path;

use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Reads and deserializes a RON file.
pub fn load_ron<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    let value = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: display.clone(),
        source,
    })?;
    log::info!("Loaded {}", display);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::BalanceConfig;

    #[test]
    fn missing_file_reports_read_error() {
        let err = load_ron::<BalanceConfig>(Path::new("/definitely/not/here.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn bad_ron_reports_parse_error() {
        let path = std::env::temp_dir().join(format!("vanguard-bad-{}.ron", std::process::id()));
        std::fs::write(&path, "{{not valid}}").unwrap();
        let err = load_ron::<BalanceConfig>(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
