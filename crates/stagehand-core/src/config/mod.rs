//! Project configuration loading

mod loader;

pub use loader::{
    discover_project_root, find_project_root, parse_project_config, LoadedProjectConfig,
    ProjectConfigLoader, CONFIG_FILE_ENV, CONFIG_FILE_NAMES, LICENSE_DOMAIN_ENV,
    PROJECT_ROOT_ENV,
};
