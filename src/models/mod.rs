pub mod printer;
pub mod replacement;

pub use printer::{Device, DeviceId, DeviceStatusRecord};
pub use replacement::{NewReplacementEvent, ReplacementEvent, ReplacementSource};
