#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControllerState {
    #[default]
    Idle,
    Running,
}

impl ControllerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Running => "RUNNING",
        }
    }

    pub fn output_command(self) -> OutputCommand {
        match self {
            Self::Idle => OutputCommand::OFF,
            Self::Running => OutputCommand::ON,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputCommand {
    pub compressor_on: bool,
    pub indicator_on: bool,
}

impl OutputCommand {
    pub const ON: Self = Self {
        compressor_on: true,
        indicator_on: true,
    };

    pub const OFF: Self = Self {
        compressor_on: false,
        indicator_on: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputLine {
    CompressorRelay,
    StatusIndicator,
    SensorPower,
}

impl OutputLine {
    pub const ALL: [Self; 3] = [
        Self::CompressorRelay,
        Self::StatusIndicator,
        Self::SensorPower,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompressorRelay => "compressor-relay",
            Self::StatusIndicator => "status-indicator",
            Self::SensorPower => "sensor-power",
        }
    }
}

/// Intermediate values of one temperature estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub raw: u16,
    pub voltage: f64,
    pub resistance_ohms: f64,
    pub temperature_c: f64,
}
