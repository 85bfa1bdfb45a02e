pub mod device;
pub mod main;
pub mod runtime_builder;

pub use device::{Device, DeviceConfig};
