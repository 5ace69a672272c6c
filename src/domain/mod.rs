// Domain layer: models and the ports implemented by the adapters.

pub mod model;
pub mod ports;
