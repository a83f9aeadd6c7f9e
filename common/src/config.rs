use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetpointConfig {
    #[serde(rename = "setpointC")]
    pub setpoint_c: f64,
    #[serde(rename = "hysteresisC")]
    pub hysteresis_c: f64,
}

impl Default for SetpointConfig {
    fn default() -> Self {
        Self {
            setpoint_c: -18.0,
            hysteresis_c: 3.0,
        }
    }
}

impl SetpointConfig {
    /// Temperature above which an idle compressor is started.
    pub fn upper_threshold_c(&self) -> f64 {
        self.setpoint_c + self.hysteresis_c
    }

    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        if !self.setpoint_c.is_finite() {
            self.setpoint_c = defaults.setpoint_c;
        }
        if !self.hysteresis_c.is_finite() {
            self.hysteresis_c = defaults.hysteresis_c;
        }
        self.setpoint_c = self.setpoint_c.clamp(-40.0, 20.0);
        self.hysteresis_c = self.hysteresis_c.clamp(0.5, 10.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermistorConfig {
    #[serde(rename = "bValue")]
    pub b_value: f64,
    #[serde(rename = "referenceResistanceOhms")]
    pub reference_resistance_ohms: f64,
    #[serde(rename = "referenceVoltage")]
    pub reference_voltage: f64,
    #[serde(rename = "adcFullScale")]
    pub adc_full_scale: u16,
}

impl Default for ThermistorConfig {
    fn default() -> Self {
        Self {
            b_value: 3450.0,
            reference_resistance_ohms: 10_000.0,
            reference_voltage: 3.3,
            adc_full_scale: 4096,
        }
    }
}

impl ThermistorConfig {
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        if !(self.b_value.is_finite() && self.b_value > 0.0) {
            self.b_value = defaults.b_value;
        }
        if !(self.reference_resistance_ohms.is_finite() && self.reference_resistance_ohms > 0.0) {
            self.reference_resistance_ohms = defaults.reference_resistance_ohms;
        }
        if !(self.reference_voltage.is_finite() && self.reference_voltage > 0.0) {
            self.reference_voltage = defaults.reference_voltage;
        }
        if self.adc_full_scale < 2 {
            self.adc_full_scale = defaults.adc_full_scale;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    #[serde(rename = "sampleIntervalMs")]
    pub sample_interval_ms: u64,
    #[serde(rename = "settleDelayMs")]
    pub settle_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 10_000,
            settle_delay_ms: 500,
        }
    }
}

impl TimingConfig {
    pub fn sanitize(&mut self) {
        self.sample_interval_ms = self.sample_interval_ms.clamp(1_000, 3_600_000);
        self.settle_delay_ms = self.settle_delay_ms.min(5_000);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub setpoint: SetpointConfig,
    pub thermistor: ThermistorConfig,
    pub timing: TimingConfig,
}

impl RuntimeConfig {
    pub fn sanitize(&mut self) {
        self.setpoint.sanitize();
        self.thermistor.sanitize();
        self.timing.sanitize();
    }
}
