use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "No site file found. Looked for:\n\
        - current directory: site.local.yml, .site.local.yml, site.yml, .site.yml\n\
        - the ./.siteflow/ directory\n\
        - ~/.config/siteflow/site.yml\n\
        A path can also be given with the SITEFLOW_CONFIG environment variable"
    )]
    SiteFileNotFound,

    #[error("SITEFLOW_CONFIG points at a missing file: {0}")]
    ConfiguredFileMissing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
