// Domain layer: core models and the cloud port. Nothing here talks to AWS directly.

pub mod model;
pub mod ports;
