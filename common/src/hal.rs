//! Collaborator traits the control core drives, plus the hardware context
//! that bundles one implementation of each.

use core::{convert::Infallible, fmt};

use crate::types::OutputLine;

pub trait AnalogInput {
    type Error: fmt::Display;

    /// One 12-bit conversion of the thermistor divider mid-point.
    fn read_raw(&mut self) -> Result<u16, Self::Error>;
}

pub trait DigitalOutputs {
    fn set_line(&mut self, line: OutputLine, on: bool);

    /// Reads back the level last driven onto `line`.
    fn line(&self, line: OutputLine) -> bool;
}

pub trait Delay {
    fn delay_ms(&mut self, ms: u64);
}

pub trait DisplaySink {
    type Error: fmt::Display;

    fn clear(&mut self) -> Result<(), Self::Error>;
    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Self::Error>;
    fn write_text(&mut self, text: &str) -> Result<(), Self::Error>;
}

/// Display sink for boards without a character display.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDisplay;

impl DisplaySink for NoDisplay {
    type Error = Infallible;

    fn clear(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_cursor(&mut self, _row: u8, _col: u8) -> Result<(), Self::Error> {
        Ok(())
    }

    fn write_text(&mut self, _text: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Everything the control loop touches, passed in explicitly at start.
#[derive(Debug)]
pub struct Hardware<A, O, D, S = NoDisplay> {
    pub adc: A,
    pub outputs: O,
    pub delay: D,
    pub display: S,
}

impl<A, O, D> Hardware<A, O, D, NoDisplay> {
    pub fn without_display(adc: A, outputs: O, delay: D) -> Self {
        Self {
            adc,
            outputs,
            delay,
            display: NoDisplay,
        }
    }
}

impl<A, O, D, S> Hardware<A, O, D, S> {
    pub fn with_display<T>(self, display: T) -> Hardware<A, O, D, T> {
        Hardware {
            adc: self.adc,
            outputs: self.outputs,
            delay: self.delay,
            display,
        }
    }
}
