// Adapters layer: concrete implementations for external systems (http, name resolver, table output).

pub mod http;
pub mod output;
pub mod sesame;
