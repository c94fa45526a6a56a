pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::http::ReqwestTransport;
pub use crate::adapters::sesame::SesameResolver;
pub use crate::config::toml_config::TomlConfig;
pub use crate::core::{
    cone::ConeSearch, http::QuerySettings, query_loop::FailurePolicy, votable::DecodeResult,
};
pub use crate::domain::model::{
    ConeParams, CoordsInput, PositionInput, RadiusInput, ServiceDescriptor, ServiceInput, SkyPosition,
};
pub use crate::domain::ports::{NameResolver, Transport};
pub use crate::domain::table::Table;
pub use crate::utils::error::{ConeError, Result};
