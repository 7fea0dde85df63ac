use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use erp_account_core::AccountConfig;

/// Read a JSON or YAML file (by extension) into a typed struct.
pub fn read_input<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value = parse(&canonical, &contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    debug!(path = %canonical.display(), "input loaded");
    Ok(value)
}

/// Configuration from `--config`, or defaults when no file is given.
pub fn read_config(path: Option<&str>) -> Result<AccountConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => read_input(path),
        None => Ok(AccountConfig::default()),
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn parse<T: DeserializeOwned>(path: &Path, contents: &str) -> Result<T, Box<dyn std::error::Error>> {
    if is_yaml(path) {
        Ok(serde_yaml::from_str(contents)?)
    } else {
        Ok(serde_json::from_str(contents)?)
    }
}

fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }
    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use erp_account_core::Locale;

    #[test]
    fn test_yaml_config() {
        let config: AccountConfig = parse(
            Path::new("acct.yaml"),
            "today: 2024-03-31\nlocale: fr\ncurrency_scales:\n  JPY: 0\n",
        )
        .unwrap();
        assert_eq!(config.locale, Locale::Fr);
        assert_eq!(config.today.unwrap().to_string(), "2024-03-31");
        assert_eq!(config.computation_scaling, 10);
    }

    #[test]
    fn test_json_by_default() {
        let config: AccountConfig = parse(Path::new("acct.json"), r#"{"locale":"en"}"#).unwrap();
        assert_eq!(config.locale, Locale::En);
    }

    #[test]
    fn test_missing_config_defaults() {
        let config = read_config(None).unwrap();
        assert!(config.today.is_none());
    }
}
