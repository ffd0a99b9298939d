//! In-memory serial bus used by the unit tests
//!
//! Every call to [`MockPort::read`] advances a [`ManualClock`] by one poll
//! interval, so the transport's timeouts run against simulated time.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::ErrorKind;
use std::rc::Rc;
use std::time::Duration;

use crate::serial::{Clock, SerialPort, SerialSettings};

const POLL_INTERVAL: Duration = Duration::from_millis(1);
const RESPONSE_LATENCY: Duration = Duration::from_millis(10);
const CHARACTER_TIME: Duration = Duration::from_millis(2);

#[derive(Clone, Debug, Default)]
pub(crate) struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// What the simulated bus does after a request is written
#[derive(Clone, Debug)]
pub(crate) enum Reply {
    Bytes {
        data: Vec<u8>,
        latency: Duration,
        spacing: Duration,
    },
    Silence,
    Error(ErrorKind),
}

impl Reply {
    /// bytes arriving back-to-back shortly after the request
    pub(crate) fn frame(data: &[u8]) -> Self {
        Reply::Bytes {
            data: data.to_vec(),
            latency: RESPONSE_LATENCY,
            spacing: CHARACTER_TIME,
        }
    }

    /// bytes arriving every `gap`, the first one `gap` after the request
    pub(crate) fn paced(data: &[u8], gap: Duration) -> Self {
        Reply::Bytes {
            data: data.to_vec(),
            latency: gap,
            spacing: gap,
        }
    }

    /// a well formed read input registers response from `unit`
    pub(crate) fn registers(unit: u8, data: &[u8]) -> Self {
        Self::frame(&response_frame(unit, data))
    }
}

/// complete RTU response frame with a valid CRC
pub(crate) fn response_frame(unit: u8, data: &[u8]) -> Vec<u8> {
    let mut frame = vec![unit, 0x04, data.len() as u8];
    frame.extend_from_slice(data);
    let crc = crate::serial::frame::CRC.checksum(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

#[derive(Debug, Default)]
pub(crate) struct PortLog {
    pub(crate) writes: Vec<Vec<u8>>,
    pub(crate) open_count: usize,
    pub(crate) close_count: usize,
}

type Responder = Box<dyn FnMut(&[u8]) -> Reply>;

pub(crate) struct MockPort {
    clock: ManualClock,
    replies: VecDeque<Reply>,
    responder: Option<Responder>,
    pending: VecDeque<(Duration, u8)>,
    pending_error: Option<ErrorKind>,
    open_error: Option<ErrorKind>,
    close_error: Option<ErrorKind>,
    max_write: Option<usize>,
    log: Rc<RefCell<PortLog>>,
}

impl MockPort {
    pub(crate) fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            replies: VecDeque::new(),
            responder: None,
            pending: VecDeque::new(),
            pending_error: None,
            open_error: None,
            close_error: None,
            max_write: None,
            log: Default::default(),
        }
    }

    /// queue the reply to the next request that has no reply yet
    pub(crate) fn with_reply(mut self, reply: Reply) -> Self {
        self.replies.push_back(reply);
        self
    }

    /// answer every request by calling `responder` with the request frame
    pub(crate) fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Reply + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    pub(crate) fn fail_open(mut self, kind: ErrorKind) -> Self {
        self.open_error = Some(kind);
        self
    }

    pub(crate) fn fail_close(mut self, kind: ErrorKind) -> Self {
        self.close_error = Some(kind);
        self
    }

    pub(crate) fn accept_at_most(mut self, count: usize) -> Self {
        self.max_write = Some(count);
        self
    }

    pub(crate) fn log(&self) -> Rc<RefCell<PortLog>> {
        self.log.clone()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.log.borrow().close_count
    }

    fn schedule(&mut self, reply: Reply) {
        let now = self.clock.now();
        match reply {
            Reply::Bytes {
                data,
                latency,
                spacing,
            } => {
                let mut at = now + latency;
                for byte in data {
                    self.pending.push_back((at, byte));
                    at += spacing;
                }
            }
            Reply::Silence => {}
            Reply::Error(kind) => self.pending_error = Some(kind),
        }
    }
}

impl SerialPort for MockPort {
    fn open(&mut self, _settings: &SerialSettings) -> std::io::Result<()> {
        if let Some(kind) = self.open_error {
            return Err(kind.into());
        }
        self.log.borrow_mut().open_count += 1;
        Ok(())
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.log.borrow_mut().close_count += 1;
        self.pending.clear();
        match self.close_error {
            Some(kind) => Err(kind.into()),
            None => Ok(()),
        }
    }

    fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
        self.clock.advance(POLL_INTERVAL);

        if let Some(kind) = self.pending_error.take() {
            return Err(kind.into());
        }

        let now = self.clock.now();
        let ready = matches!(self.pending.front(), Some((at, _)) if *at <= now);
        if !ready {
            return Ok(0);
        }

        match (self.pending.pop_front(), buffer.first_mut()) {
            (Some((_, byte)), Some(slot)) => {
                *slot = byte;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        let accepted = self.max_write.map_or(data.len(), |max| max.min(data.len()));
        self.log.borrow_mut().writes.push(data.to_vec());

        // anything still in flight from a previous request is lost
        self.pending.clear();

        let reply = match self.responder.as_mut() {
            Some(responder) => responder(data),
            None => self.replies.pop_front().unwrap_or(Reply::Silence),
        };
        self.schedule(reply);

        Ok(accepted)
    }
}
