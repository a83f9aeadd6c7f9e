use std::{thread, time::Duration};

use anyhow::Context;
use esp_idf_hal::{
    adc::{
        attenuation::DB_11,
        oneshot::{config::AdcChannelConfig, AdcChannelDriver, AdcDriver},
        ADC1,
    },
    delay::FreeRtos,
    gpio::{AnyOutputPin, Gpio34, Output, OutputPin, PinDriver},
    prelude::Peripherals,
};
use esp_idf_svc::log::EspLogger;
use log::{debug, info, warn};

use fridge_common::{
    AnalogInput, CycleReport, Delay, DigitalOutputs, FridgeController, Hardware, OutputLine,
    RuntimeConfig,
};

const THERMISTOR_ADC_PIN: u8 = 34;
const COMPRESSOR_RELAY_PIN: u8 = 22;
const STATUS_LED_PIN: u8 = 21;
const SENSOR_POWER_PIN: u8 = 27;

struct ThermistorInput {
    channel: AdcChannelDriver<'static, Gpio34, AdcDriver<'static, ADC1>>,
}

impl ThermistorInput {
    fn new(adc: ADC1, pin: Gpio34) -> anyhow::Result<Self> {
        let driver = AdcDriver::new(adc).context("failed to take ADC1")?;
        let config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };
        let channel = AdcChannelDriver::new(driver, pin, &config)
            .context("failed to configure thermistor ADC channel")?;
        Ok(Self { channel })
    }
}

impl AnalogInput for ThermistorInput {
    type Error = esp_idf_sys::EspError;

    fn read_raw(&mut self) -> Result<u16, Self::Error> {
        self.channel.read_raw()
    }
}

struct BoardOutputs {
    compressor_relay: PinDriver<'static, AnyOutputPin, Output>,
    status_led: PinDriver<'static, AnyOutputPin, Output>,
    sensor_power: PinDriver<'static, AnyOutputPin, Output>,
}

impl BoardOutputs {
    fn new(
        compressor_relay: impl OutputPin + 'static,
        status_led: impl OutputPin + 'static,
        sensor_power: impl OutputPin + 'static,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            compressor_relay: PinDriver::output(compressor_relay.downgrade_output())?,
            status_led: PinDriver::output(status_led.downgrade_output())?,
            sensor_power: PinDriver::output(sensor_power.downgrade_output())?,
        })
    }

    fn pin(&self, line: OutputLine) -> &PinDriver<'static, AnyOutputPin, Output> {
        match line {
            OutputLine::CompressorRelay => &self.compressor_relay,
            OutputLine::StatusIndicator => &self.status_led,
            OutputLine::SensorPower => &self.sensor_power,
        }
    }

    fn pin_mut(&mut self, line: OutputLine) -> &mut PinDriver<'static, AnyOutputPin, Output> {
        match line {
            OutputLine::CompressorRelay => &mut self.compressor_relay,
            OutputLine::StatusIndicator => &mut self.status_led,
            OutputLine::SensorPower => &mut self.sensor_power,
        }
    }
}

impl DigitalOutputs for BoardOutputs {
    fn set_line(&mut self, line: OutputLine, on: bool) {
        let pin = self.pin_mut(line);
        let result = if on { pin.set_high() } else { pin.set_low() };
        if let Err(err) = result {
            warn!("failed to drive {}: {err:?}", line.as_str());
        }
    }

    fn line(&self, line: OutputLine) -> bool {
        self.pin(line).is_set_high()
    }
}

struct RtosDelay;

impl Delay for RtosDelay {
    fn delay_ms(&mut self, ms: u64) {
        FreeRtos::delay_ms(u32::try_from(ms).unwrap_or(u32::MAX));
    }
}

pub fn run() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    let mut config = RuntimeConfig::default();
    config.sanitize();

    let Peripherals { adc1, pins, .. } = Peripherals::take()?;

    let adc = ThermistorInput::new(adc1, pins.gpio34)?;
    let outputs = BoardOutputs::new(pins.gpio22, pins.gpio21, pins.gpio27)
        .context("failed to initialize output pins")?;

    info!(
        "fridge controller, thermistor on GPIO{THERMISTOR_ADC_PIN}, relay GPIO{COMPRESSOR_RELAY_PIN}, led GPIO{STATUS_LED_PIN}, sensor power GPIO{SENSOR_POWER_PIN}"
    );
    info!(
        "setpoint {:.1} C, hysteresis {:.1} C, interval {} ms",
        config.setpoint.setpoint_c, config.setpoint.hysteresis_c, config.timing.sample_interval_ms
    );

    let mut controller = FridgeController::new(
        Hardware::without_display(adc, outputs, RtosDelay),
        &config,
    );
    let setpoint = controller.setpoint();
    let estimator = controller.estimator();
    info!(
        "compressor on above {:.1} C, off below {:.1} C, thermistor B {:.0}, settle {} ms",
        setpoint.upper_threshold_c(),
        setpoint.setpoint_c,
        estimator.thermistor().config().b_value,
        estimator.settle_delay_ms()
    );
    let interval = Duration::from_millis(config.timing.sample_interval_ms);

    loop {
        let report = controller.run_cycle();
        log_report(&report);
        thread::sleep(interval);
    }
}

fn log_report(report: &CycleReport) {
    match &report.measurement {
        Ok(measurement) => {
            debug!(
                "raw value: {:#05x}, voltage: {:.4} V, resistance: {:.0} ohm",
                measurement.raw, measurement.voltage, measurement.resistance_ohms
            );
            info!(
                "temperature: {:.2} C, state: {}",
                measurement.temperature_c,
                report.state.as_str()
            );
        }
        Err(err) => warn!(
            "temperature measurement failed ({} in a row), holding {}: {err}",
            report.consecutive_faults,
            report.state.as_str()
        ),
    }

    if report.state_changed() {
        info!(
            "controller state {} -> {}",
            report.previous_state.as_str(),
            report.state.as_str()
        );
    }
}
