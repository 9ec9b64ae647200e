// Domain layer: value model and the conversion ports. No I/O here.

pub mod model;
pub mod ports;
