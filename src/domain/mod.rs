// Domain layer: positions, services, result tables and the HTTP port.

pub mod model;
pub mod ports;
pub mod table;
