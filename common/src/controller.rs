use crate::{
    config::{RuntimeConfig, SetpointConfig},
    display,
    hal::{AnalogInput, Delay, DigitalOutputs, DisplaySink, Hardware},
    hysteresis::next_state,
    thermistor::{SensorError, TemperatureEstimator, Thermistor},
    types::{ControllerState, Measurement, OutputCommand, OutputLine},
};

/// Outcome of one estimate → decide → act pass, for the caller to log.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub measurement: Result<Measurement, SensorError>,
    pub previous_state: ControllerState,
    pub state: ControllerState,
    pub command: OutputCommand,
    pub consecutive_faults: u32,
    pub display_error: Option<String>,
}

impl CycleReport {
    pub fn temperature_c(&self) -> Option<f64> {
        self.measurement
            .as_ref()
            .ok()
            .map(|measurement| measurement.temperature_c)
    }

    pub fn state_changed(&self) -> bool {
        self.previous_state != self.state
    }
}

pub struct FridgeController<A, O, D, S> {
    hardware: Hardware<A, O, D, S>,
    estimator: TemperatureEstimator,
    setpoint: SetpointConfig,
    state: ControllerState,
    consecutive_faults: u32,
}

impl<A, O, D, S> FridgeController<A, O, D, S>
where
    A: AnalogInput,
    O: DigitalOutputs,
    D: Delay,
    S: DisplaySink,
{
    /// Takes ownership of the board and drives every output line low.
    pub fn new(mut hardware: Hardware<A, O, D, S>, config: &RuntimeConfig) -> Self {
        for line in OutputLine::ALL {
            hardware.outputs.set_line(line, false);
        }

        Self {
            hardware,
            estimator: TemperatureEstimator::new(
                Thermistor::new(config.thermistor),
                config.timing.settle_delay_ms,
            ),
            setpoint: config.setpoint,
            state: ControllerState::Idle,
            consecutive_faults: 0,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn setpoint(&self) -> &SetpointConfig {
        &self.setpoint
    }

    pub fn estimator(&self) -> &TemperatureEstimator {
        &self.estimator
    }

    pub fn hardware(&self) -> &Hardware<A, O, D, S> {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut Hardware<A, O, D, S> {
        &mut self.hardware
    }

    /// Runs one control cycle. A failed measurement leaves the state and the
    /// outputs untouched so the next cycle can retry.
    pub fn run_cycle(&mut self) -> CycleReport {
        let previous_state = self.state;
        let measurement = self.estimator.estimate(
            &mut self.hardware.adc,
            &mut self.hardware.outputs,
            &mut self.hardware.delay,
        );

        match &measurement {
            Ok(reading) => {
                let (state, command) =
                    next_state(self.state, reading.temperature_c, &self.setpoint);
                self.state = state;
                self.consecutive_faults = 0;
                self.apply(command);
            }
            Err(_) => {
                self.consecutive_faults = self.consecutive_faults.saturating_add(1);
            }
        }

        let temperature_c = measurement.as_ref().ok().map(|m| m.temperature_c);
        let compressor_on = self.hardware.outputs.line(OutputLine::CompressorRelay);
        let display_error = display::render(&mut self.hardware.display, temperature_c, compressor_on)
            .err()
            .map(|err| err.to_string());

        CycleReport {
            measurement,
            previous_state,
            state: self.state,
            command: self.state.output_command(),
            consecutive_faults: self.consecutive_faults,
            display_error,
        }
    }

    fn apply(&mut self, command: OutputCommand) {
        let outputs = &mut self.hardware.outputs;
        outputs.set_line(OutputLine::CompressorRelay, command.compressor_on);
        outputs.set_line(OutputLine::StatusIndicator, command.indicator_on);
    }
}
