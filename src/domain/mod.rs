// Domain layer: models, the env file format and the ports checks talk through.

pub mod env_file;
pub mod model;
pub mod ports;
