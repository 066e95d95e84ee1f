// Domain layer: records, levels and the ports the analysis pipeline is built on.

pub mod model;
pub mod ports;
