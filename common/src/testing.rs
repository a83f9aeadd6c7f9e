use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use crate::{
    hal::{AnalogInput, Delay, DigitalOutputs, DisplaySink},
    types::OutputLine,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Line(OutputLine, bool),
    Delay(u64),
    Read,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub struct ScriptedAdc {
    log: EventLog,
    samples: VecDeque<Result<u16, &'static str>>,
}

impl ScriptedAdc {
    pub fn new(
        log: &EventLog,
        samples: impl IntoIterator<Item = Result<u16, &'static str>>,
    ) -> Self {
        Self {
            log: log.clone(),
            samples: samples.into_iter().collect(),
        }
    }
}

impl AnalogInput for ScriptedAdc {
    type Error = &'static str;

    fn read_raw(&mut self) -> Result<u16, Self::Error> {
        self.log.push(Event::Read);
        self.samples.pop_front().unwrap_or(Err("script exhausted"))
    }
}

pub struct FakeOutputs {
    log: EventLog,
    levels: HashMap<OutputLine, bool>,
}

impl FakeOutputs {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            levels: HashMap::new(),
        }
    }

    pub fn with_levels(log: &EventLog, levels: &[(OutputLine, bool)]) -> Self {
        Self {
            log: log.clone(),
            levels: levels.iter().copied().collect(),
        }
    }
}

impl DigitalOutputs for FakeOutputs {
    fn set_line(&mut self, line: OutputLine, on: bool) {
        self.log.push(Event::Line(line, on));
        self.levels.insert(line, on);
    }

    fn line(&self, line: OutputLine) -> bool {
        self.levels.get(&line).copied().unwrap_or(false)
    }
}

pub struct FakeDelay {
    log: EventLog,
}

impl FakeDelay {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl Delay for FakeDelay {
    fn delay_ms(&mut self, ms: u64) {
        self.log.push(Event::Delay(ms));
    }
}

/// Two-row character display that keeps what was written.
#[derive(Debug, Default)]
pub struct FakeDisplay {
    pub rows: [String; 2],
    cursor_row: usize,
    pub clears: usize,
    pub fail: bool,
}

impl FakeDisplay {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl DisplaySink for FakeDisplay {
    type Error = &'static str;

    fn clear(&mut self) -> Result<(), Self::Error> {
        if self.fail {
            return Err("display not responding");
        }
        self.rows = Default::default();
        self.cursor_row = 0;
        self.clears += 1;
        Ok(())
    }

    fn set_cursor(&mut self, row: u8, _col: u8) -> Result<(), Self::Error> {
        let row = usize::from(row);
        if row >= self.rows.len() {
            return Err("cursor out of range");
        }
        self.cursor_row = row;
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<(), Self::Error> {
        self.rows[self.cursor_row].push_str(text);
        Ok(())
    }
}
