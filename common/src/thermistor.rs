//! NTC thermistor model and the temperature estimator built on it.
//!
//! The thermistor sits in a divider against a fixed reference resistor; the
//! ADC samples the mid-point. Temperature follows the B-parameter equation
//! `T = B / ln(R / R_inf)` with `R_inf = R_ref * exp(-B / T0)`, where `T0` is
//! the 25 °C calibration point at which the thermistor equals `R_ref`.

use thiserror::Error;

use crate::{
    config::ThermistorConfig,
    hal::{AnalogInput, Delay, DigitalOutputs},
    types::{Measurement, OutputLine},
};

const CALIBRATION_KELVIN: f64 = 298.15;
const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("analog read failed: {0}")]
    Read(String),
    #[error("thermistor disconnected (no divider voltage)")]
    Disconnected,
    #[error("raw sample {0} exceeds the ADC range")]
    OutOfRange(u16),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thermistor {
    config: ThermistorConfig,
    r_inf: f64,
}

impl Thermistor {
    pub fn new(config: ThermistorConfig) -> Self {
        let r_inf = config.reference_resistance_ohms * (config.b_value / -CALIBRATION_KELVIN).exp();
        Self { config, r_inf }
    }

    pub fn config(&self) -> &ThermistorConfig {
        &self.config
    }

    /// Resistance the thermistor would have at infinite temperature.
    pub fn r_inf(&self) -> f64 {
        self.r_inf
    }

    pub fn max_raw(&self) -> u16 {
        self.config.adc_full_scale.saturating_sub(1)
    }

    pub fn voltage(&self, raw: u16) -> f64 {
        self.config.reference_voltage * f64::from(raw) / f64::from(self.config.adc_full_scale)
    }

    /// Divider equation solved for the thermistor. `None` when the mid-point
    /// voltage is zero, which means the thermistor side is open.
    pub fn resistance(&self, voltage: f64) -> Option<f64> {
        if !(voltage.is_finite() && voltage > 0.0) {
            return None;
        }
        let vref = self.config.reference_voltage;
        let resistance = self.config.reference_resistance_ohms * (vref - voltage) / voltage;
        resistance.is_finite().then_some(resistance)
    }

    pub fn celsius(&self, resistance: f64) -> Option<f64> {
        let kelvin = self.config.b_value / (resistance / self.r_inf).ln();
        let celsius = kelvin - KELVIN_OFFSET;
        celsius.is_finite().then_some(celsius)
    }

    pub fn measure(&self, raw: u16) -> Result<Measurement, SensorError> {
        if raw > self.max_raw() {
            return Err(SensorError::OutOfRange(raw));
        }

        let voltage = self.voltage(raw);
        let resistance_ohms = self.resistance(voltage).ok_or(SensorError::Disconnected)?;
        let temperature_c = self
            .celsius(resistance_ohms)
            .ok_or(SensorError::Disconnected)?;

        Ok(Measurement {
            raw,
            voltage,
            resistance_ohms,
            temperature_c,
        })
    }

    pub fn resistance_for_celsius(&self, celsius: f64) -> f64 {
        self.r_inf * (self.config.b_value / (celsius + KELVIN_OFFSET)).exp()
    }

    pub fn voltage_for_resistance(&self, resistance: f64) -> f64 {
        let rref = self.config.reference_resistance_ohms;
        self.config.reference_voltage * rref / (resistance + rref)
    }

    /// ADC code the divider would produce at `celsius`, saturated to the
    /// converter range.
    pub fn raw_for_celsius(&self, celsius: f64) -> u16 {
        let voltage = self.voltage_for_resistance(self.resistance_for_celsius(celsius));
        let raw = (voltage * f64::from(self.config.adc_full_scale) / self.config.reference_voltage)
            .round();
        if raw.is_nan() {
            return 0;
        }
        raw.clamp(0.0, f64::from(self.max_raw())) as u16
    }
}

/// Keeps the sensor supply energized; switching it off again on drop.
struct SensorPower<'a, O: DigitalOutputs> {
    outputs: &'a mut O,
}

impl<'a, O: DigitalOutputs> SensorPower<'a, O> {
    fn energize(outputs: &'a mut O) -> Self {
        outputs.set_line(OutputLine::SensorPower, true);
        Self { outputs }
    }
}

impl<O: DigitalOutputs> Drop for SensorPower<'_, O> {
    fn drop(&mut self) {
        self.outputs.set_line(OutputLine::SensorPower, false);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureEstimator {
    thermistor: Thermistor,
    settle_delay_ms: u64,
}

impl TemperatureEstimator {
    pub fn new(thermistor: Thermistor, settle_delay_ms: u64) -> Self {
        Self {
            thermistor,
            settle_delay_ms,
        }
    }

    pub fn thermistor(&self) -> &Thermistor {
        &self.thermistor
    }

    pub fn settle_delay_ms(&self) -> u64 {
        self.settle_delay_ms
    }

    /// Powers the divider, waits for it to settle, samples once and powers it
    /// down again. The supply is switched off on every return path.
    pub fn estimate<A, O, D>(
        &self,
        adc: &mut A,
        outputs: &mut O,
        delay: &mut D,
    ) -> Result<Measurement, SensorError>
    where
        A: AnalogInput,
        O: DigitalOutputs,
        D: Delay,
    {
        let _power = SensorPower::energize(outputs);
        delay.delay_ms(self.settle_delay_ms);

        let raw = adc
            .read_raw()
            .map_err(|err| SensorError::Read(err.to_string()))?;
        self.thermistor.measure(raw)
    }
}
