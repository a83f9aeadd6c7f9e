use std::{
    io::ErrorKind,
    num::NonZeroU64,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use thiserror::Error;
use tracing::{debug, info, warn};

use fridge_common::{
    AnalogInput, CycleReport, Delay, DigitalOutputs, DisplaySink, FridgeController, Hardware,
    OutputLine, RuntimeConfig, Thermistor,
};

const DISPLAY_ROWS: usize = 2;
const DISPLAY_COLS: usize = 16;

const AMBIENT_C: f64 = 22.0;
const LEAK_PER_S: f64 = 0.000_5;
const COOLING_C_PER_S: f64 = 0.05;
const EVAPORATOR_C: f64 = -30.0;

/// Thermal model of the compartment: warms toward ambient through the
/// cabinet walls and is pulled down at a fixed rate while the compressor runs.
#[derive(Debug)]
struct Plant {
    temperature_c: f64,
    compressor_relay: bool,
    status_indicator: bool,
    sensor_power: bool,
    last_update: Instant,
}

impl Plant {
    fn new(temperature_c: f64) -> Self {
        Self {
            temperature_c,
            compressor_relay: false,
            status_indicator: false,
            sensor_power: false,
            last_update: Instant::now(),
        }
    }

    fn advance(&mut self, elapsed_s: f64) {
        let mut rate = LEAK_PER_S * (AMBIENT_C - self.temperature_c);
        if self.compressor_relay {
            rate -= COOLING_C_PER_S;
        }
        self.temperature_c = (self.temperature_c + rate * elapsed_s).max(EVAPORATOR_C);
    }

    fn advance_to(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_update);
        self.advance(elapsed.as_secs_f64());
        self.last_update = now;
    }

    fn level_mut(&mut self, line: OutputLine) -> &mut bool {
        match line {
            OutputLine::CompressorRelay => &mut self.compressor_relay,
            OutputLine::StatusIndicator => &mut self.status_indicator,
            OutputLine::SensorPower => &mut self.sensor_power,
        }
    }

    fn level(&self, line: OutputLine) -> bool {
        match line {
            OutputLine::CompressorRelay => self.compressor_relay,
            OutputLine::StatusIndicator => self.status_indicator,
            OutputLine::SensorPower => self.sensor_power,
        }
    }
}

type SharedPlant = Arc<Mutex<Plant>>;

fn lock(plant: &SharedPlant) -> MutexGuard<'_, Plant> {
    plant.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Error)]
enum SimulationError {
    #[error("injected ADC fault on read {0}")]
    InjectedFault(u64),
}

struct SimulatedThermistor {
    plant: SharedPlant,
    thermistor: Thermistor,
    fault_every: Option<NonZeroU64>,
    reads: u64,
}

impl SimulatedThermistor {
    fn new(plant: SharedPlant, thermistor: Thermistor, fault_every: Option<NonZeroU64>) -> Self {
        Self {
            plant,
            thermistor,
            fault_every,
            reads: 0,
        }
    }
}

impl AnalogInput for SimulatedThermistor {
    type Error = SimulationError;

    fn read_raw(&mut self) -> Result<u16, Self::Error> {
        self.reads = self.reads.saturating_add(1);
        if let Some(every) = self.fault_every {
            if self.reads % every.get() == 0 {
                return Err(SimulationError::InjectedFault(self.reads));
            }
        }

        let mut plant = lock(&self.plant);
        plant.advance_to(Instant::now());

        // An unpowered divider leaves the ADC input at ground.
        if !plant.sensor_power {
            return Ok(0);
        }
        Ok(self.thermistor.raw_for_celsius(plant.temperature_c))
    }
}

struct SimulatedOutputs {
    plant: SharedPlant,
}

impl DigitalOutputs for SimulatedOutputs {
    fn set_line(&mut self, line: OutputLine, on: bool) {
        let mut plant = lock(&self.plant);
        plant.advance_to(Instant::now());
        let level = plant.level_mut(line);
        if *level != on {
            debug!("{} -> {}", line.as_str(), if on { "on" } else { "off" });
        }
        *level = on;
    }

    fn line(&self, line: OutputLine) -> bool {
        lock(&self.plant).level(line)
    }
}

struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay_ms(&mut self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
enum DisplayError {
    #[error("cursor ({row}, {col}) is outside the 16x2 panel")]
    CursorOutOfRange { row: u8, col: u8 },
}

/// 16x2 character panel mirrored to the log.
struct ConsoleDisplay {
    cells: [[char; DISPLAY_COLS]; DISPLAY_ROWS],
    row: usize,
    col: usize,
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self {
            cells: [[' '; DISPLAY_COLS]; DISPLAY_ROWS],
            row: 0,
            col: 0,
        }
    }
}

impl ConsoleDisplay {
    fn row_text(&self, row: usize) -> String {
        self.cells[row].iter().collect::<String>().trim_end().to_string()
    }
}

impl DisplaySink for ConsoleDisplay {
    type Error = DisplayError;

    fn clear(&mut self) -> Result<(), Self::Error> {
        *self = Self::default();
        Ok(())
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Self::Error> {
        let (r, c) = (usize::from(row), usize::from(col));
        if r >= DISPLAY_ROWS || c >= DISPLAY_COLS {
            return Err(DisplayError::CursorOutOfRange { row, col });
        }
        self.row = r;
        self.col = c;
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<(), Self::Error> {
        for ch in text.chars() {
            if self.col >= DISPLAY_COLS {
                break;
            }
            self.cells[self.row][self.col] = ch;
            self.col += 1;
        }
        info!("[display] {}", self.row_text(self.row));
        Ok(())
    }
}

struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    fn new() -> Self {
        let data_dir = std::env::var("FRIDGE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.fridge"));
        Self::at(data_dir.join("config.json"))
    }

    fn at(path: PathBuf) -> Self {
        Self { path }
    }

    async fn load(&self) -> anyhow::Result<RuntimeConfig> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => serde_json::from_slice::<RuntimeConfig>(&raw)
                .with_context(|| format!("invalid config file {}", self.path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
            Err(err) => Err(err.into()),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = ConfigStore::new();
    let mut config = store.load().await.unwrap_or_else(|err| {
        warn!("failed to load config from {}: {err:#}", store.path.display());
        RuntimeConfig::default()
    });
    config.sanitize();

    let start_c = std::env::var("FRIDGE_SIM_START_C")
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(4.0);
    let fault_every = std::env::var("FRIDGE_SIM_FAULT_EVERY")
        .ok()
        .and_then(|value| value.parse::<NonZeroU64>().ok());
    let display_enabled = std::env::var("FRIDGE_DISPLAY")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    info!(
        "fridge controller starting: setpoint {:.1} C, hysteresis {:.1} C, interval {} ms, simulated compartment at {:.1} C",
        config.setpoint.setpoint_c,
        config.setpoint.hysteresis_c,
        config.timing.sample_interval_ms,
        start_c
    );

    let plant = Arc::new(Mutex::new(Plant::new(start_c)));
    let hardware = Hardware::without_display(
        SimulatedThermistor::new(
            plant.clone(),
            Thermistor::new(config.thermistor),
            fault_every,
        ),
        SimulatedOutputs { plant },
        ThreadDelay,
    );

    if display_enabled {
        control_loop(hardware.with_display(ConsoleDisplay::default()), config).await
    } else {
        control_loop(hardware, config).await
    }
}

async fn control_loop<S>(
    hardware: Hardware<SimulatedThermistor, SimulatedOutputs, ThreadDelay, S>,
    config: RuntimeConfig,
) -> anyhow::Result<()>
where
    S: DisplaySink + Send + 'static,
{
    let mut controller = FridgeController::new(hardware, &config);
    log_regulation(&controller);
    let interval = Duration::from_millis(config.timing.sample_interval_ms);

    loop {
        // The cycle blocks for the sensor settle delay.
        let (returned, report) = tokio::task::spawn_blocking(move || {
            let report = controller.run_cycle();
            (controller, report)
        })
        .await
        .context("control cycle task failed")?;
        controller = returned;

        log_report(&report);
        tokio::time::sleep(interval).await;
    }
}

fn log_regulation<A, O, D, S>(controller: &FridgeController<A, O, D, S>)
where
    A: AnalogInput,
    O: DigitalOutputs,
    D: Delay,
    S: DisplaySink,
{
    let setpoint = controller.setpoint();
    let estimator = controller.estimator();
    info!(
        "compressor on above {:.1} C, off below {:.1} C, thermistor B {:.0}, settle {} ms",
        setpoint.upper_threshold_c(),
        setpoint.setpoint_c,
        estimator.thermistor().config().b_value,
        estimator.settle_delay_ms()
    );
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
            "controller state {} -> {} (compressor {})",
            report.previous_state.as_str(),
            report.state.as_str(),
            if report.command.compressor_on { "on" } else { "off" }
        );
    }

    if let Some(err) = &report.display_error {
        warn!("display update failed: {err}");
    }
}
