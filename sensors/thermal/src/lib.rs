pub mod thermal;

pub use thermal::ThermalSensor;
