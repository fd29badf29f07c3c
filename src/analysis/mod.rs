pub mod devices;
pub mod recent;
pub mod series;
