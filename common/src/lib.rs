pub mod config;
pub mod controller;
pub mod display;
pub mod hal;
pub mod hysteresis;
pub mod thermistor;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{RuntimeConfig, SetpointConfig, ThermistorConfig, TimingConfig};
pub use controller::{CycleReport, FridgeController};
pub use hal::{AnalogInput, Delay, DigitalOutputs, DisplaySink, Hardware, NoDisplay};
pub use hysteresis::next_state;
pub use thermistor::{SensorError, TemperatureEstimator, Thermistor};
pub use types::{ControllerState, Measurement, OutputCommand, OutputLine};
