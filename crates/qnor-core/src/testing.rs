//! Recording transport for unit tests

use std::collections::VecDeque;
use std::vec::Vec;

use maybe_async::maybe_async;

use crate::qspi::QspiCommand;
use crate::transport::{BusFeatures, QspiTransport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(QspiCommand, u32),
    Transmit(Vec<u8>),
    Receive(usize),
    Delay(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

/// Plays back queued receive data and records every call
///
/// Receives with nothing queued read as zeros, which decodes as an idle
/// chip with every status bit clear.
pub struct ScriptedBus {
    pub features: BusFeatures,
    pub events: Vec<Event>,
    pub responses: VecDeque<Vec<u8>>,
    pub fail_command_on: Option<u8>,
    pub fail_data_on: Option<u8>,
    last_opcode: u8,
}

impl ScriptedBus {
    pub fn new(features: BusFeatures) -> Self {
        Self {
            features,
            events: Vec::new(),
            responses: VecDeque::new(),
            fail_command_on: None,
            fail_data_on: None,
            last_opcode: 0,
        }
    }

    pub fn push_response(&mut self, data: &[u8]) {
        self.responses.push_back(data.to_vec());
    }

    /// Opcodes of every command phase, in order
    pub fn opcodes(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Command(cmd, _) => Some(cmd.opcode),
                _ => None,
            })
            .collect()
    }

    /// Every command descriptor, in order
    pub fn commands(&self) -> Vec<QspiCommand> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Command(cmd, _) => Some(*cmd),
                _ => None,
            })
            .collect()
    }
}

#[maybe_async(AFIT)]
impl QspiTransport for ScriptedBus {
    type Error = BusFault;

    fn features(&self) -> BusFeatures {
        self.features
    }

    async fn command(&mut self, cmd: &QspiCommand, timeout_ms: u32) -> Result<(), BusFault> {
        self.events.push(Event::Command(*cmd, timeout_ms));
        self.last_opcode = cmd.opcode;
        if self.fail_command_on == Some(cmd.opcode) {
            return Err(BusFault);
        }
        Ok(())
    }

    async fn transmit(&mut self, data: &[u8], _timeout_ms: u32) -> Result<(), BusFault> {
        self.events.push(Event::Transmit(data.to_vec()));
        if self.fail_data_on == Some(self.last_opcode) {
            return Err(BusFault);
        }
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<(), BusFault> {
        self.events.push(Event::Receive(buf.len()));
        if self.fail_data_on == Some(self.last_opcode) {
            return Err(BusFault);
        }
        match self.responses.pop_front() {
            Some(data) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                buf[n..].fill(0);
            }
            None => buf.fill(0),
        }
        Ok(())
    }

    async fn delay_us(&mut self, us: u32) {
        self.events.push(Event::Delay(us));
    }
}
