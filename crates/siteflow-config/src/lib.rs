pub mod error;

pub use error::*;

use std::path::{Path, PathBuf};

/// Environment variable naming the site file directly
pub const CONFIG_ENV: &str = "SITEFLOW_CONFIG";

/// Project-local directory holding site files and deploy state
pub const PROJECT_DIR: &str = ".siteflow";

/// Site file names, in priority order
pub const SITE_FILE_CANDIDATES: [&str; 4] =
    ["site.local.yml", ".site.local.yml", "site.yml", ".site.yml"];

/// Find the project's site file
///
/// Search order:
/// 1. `SITEFLOW_CONFIG` (direct path)
/// 2. current directory: site.local.yml, .site.local.yml, site.yml, .site.yml
/// 3. `./.siteflow/`, same order
/// 4. `~/.config/siteflow/site.yml`
pub fn find_site_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(&config_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::ConfiguredFileMissing(config_path));
    }

    let current_dir = std::env::current_dir()?;
    if let Some(path) = find_site_file_in(&current_dir) {
        return Ok(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("siteflow").join("site.yml");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::SiteFileNotFound)
}

/// Project-level lookup in `dir` and `dir/.siteflow`
pub fn find_site_file_in(dir: &Path) -> Option<PathBuf> {
    let project_dir = dir.join(PROJECT_DIR);
    [dir.to_path_buf(), project_dir]
        .iter()
        .filter(|d| d.is_dir())
        .flat_map(|d| SITE_FILE_CANDIDATES.iter().map(move |name| d.join(name)))
        .find(|path| path.exists())
}

/// Project root for a site file: a file inside `.siteflow/` belongs to the
/// directory above it
pub fn project_root(site_file: &Path) -> PathBuf {
    let parent = site_file.parent().unwrap_or_else(|| Path::new("."));
    match parent.file_name() {
        Some(name) if name == PROJECT_DIR => parent
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| parent.to_path_buf()),
        _ => parent.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_find_site_file_in_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("site.yml"), "src: .").unwrap();

        let found = find_site_file_in(temp_dir.path()).unwrap();
        assert!(found.ends_with("site.yml"));
    }

    #[test]
    fn test_local_file_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("site.yml"), "src: .").unwrap();
        fs::write(temp_dir.path().join(".site.local.yml"), "src: .").unwrap();

        let found = find_site_file_in(temp_dir.path()).unwrap();
        assert!(found.ends_with(".site.local.yml"));
    }

    #[test]
    fn test_project_dir_is_searched_last() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_dir = temp_dir.path().join(".siteflow");
        fs::create_dir(&project_dir).unwrap();
        fs::write(project_dir.join("site.local.yml"), "src: .").unwrap();

        let found = find_site_file_in(temp_dir.path()).unwrap();
        assert!(found.ends_with(".siteflow/site.local.yml"));

        fs::write(temp_dir.path().join(".site.yml"), "src: .").unwrap();
        let found = find_site_file_in(temp_dir.path()).unwrap();
        assert_eq!(found, temp_dir.path().join(".site.yml"));
    }

    #[test]
    fn test_nothing_found_in_empty_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(find_site_file_in(temp_dir.path()).is_none());
    }

    #[test]
    fn test_project_root() {
        assert_eq!(
            project_root(Path::new("/srv/blog/site.yml")),
            PathBuf::from("/srv/blog")
        );
        assert_eq!(
            project_root(Path::new("/srv/blog/.siteflow/site.yml")),
            PathBuf::from("/srv/blog")
        );
    }

    #[test]
    #[serial]
    fn test_find_site_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yml");
        fs::write(&config_path, "src: .").unwrap();

        temp_env::with_var(CONFIG_ENV, Some(config_path.as_os_str()), || {
            assert_eq!(find_site_file().unwrap(), config_path);
        });
    }

    #[test]
    #[serial]
    fn test_find_site_file_env_var_missing() {
        temp_env::with_var(CONFIG_ENV, Some("/nonexistent/site.yml"), || {
            assert!(matches!(
                find_site_file(),
                Err(ConfigError::ConfiguredFileMissing(_))
            ));
        });
    }

    #[test]
    #[serial]
    fn test_find_site_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        fs::write(temp_dir.path().join("site.yml"), "src: .").unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();
        let result = temp_env::with_var_unset(CONFIG_ENV, find_site_file);
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().ends_with("site.yml"));
    }
}
