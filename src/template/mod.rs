//! Per-kind templates and startup config generation
//!
//! Each node kind owns a directory below the templates root
//! (`/etc/containerlab/templates` by default):
//!
//! ```text
//! <root>/crpd/juniper.conf    default startup config, rendered per node
//! <root>/crpd/sshd_config     copied verbatim into each node
//! ```
//!
//! Startup configs are tera templates; the node's resolved attributes
//! (`short_name`, `long_name`, `kind`, `image`, `env`, ...) form the context.

mod builtin;
mod registry;
mod render;

pub use builtin::{
    install, BUILTIN_FILES, CRPD_DEFAULT_IMAGE, CRPD_KIND, DEFAULT_TEMPLATES_ROOT,
    SSHD_CONFIG_FILE, STARTUP_CONFIG_FILE,
};
pub use registry::{KindTemplates, TemplateError, TemplateRegistry};
pub use render::{generate_config, render, ConfigGenerationError, Generated};
