//! Модуль для работы с OpenCL
//!
//! Содержит низкоуровневые привязки, обнаружение устройств и владеющие
//! обертки над объектами OpenCL

pub mod bindings;
pub mod callbacks;
pub mod device;
pub mod resources;
pub mod types;
pub mod utils;

pub use bindings::OpenCl;
pub use device::{list_devices, list_platforms, select_device, Device, Platform};
