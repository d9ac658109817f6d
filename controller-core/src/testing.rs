//! Host test doubles shared by the unit tests.

extern crate std;

use core::cell::Cell;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
use std::rc::Rc;
use std::vec::Vec;

use controller_proto::{InputReport, Rgb};
use embedded_hal::digital::{Error, ErrorKind, ErrorType, InputPin, OutputPin};

use crate::output::{OutputError, PixelSink, ReportSink};

/// Run a future that never waits to completion.
pub fn block_on<F: Future>(mut f: F) -> F::Output {
    fn noop_raw_waker() -> RawWaker {
        fn noop(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            noop_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
        RawWaker::new(core::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut cx = Context::from_waker(&waker);

    // SAFETY: f is not moved after pinning
    let mut f = unsafe { Pin::new_unchecked(&mut f) };

    match f.as_mut().poll(&mut cx) {
        Poll::Ready(result) => result,
        Poll::Pending => panic!("Mock future returned Pending unexpectedly"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Pin whose level is shared between clones, so a test can hold one clone
/// while the code under test owns another.
#[derive(Clone, Debug)]
pub struct MockPin {
    high: Rc<Cell<bool>>,
    writes: Rc<Cell<u32>>,
    failing: bool,
}

impl MockPin {
    pub fn new(high: bool) -> Self {
        Self {
            high: Rc::new(Cell::new(high)),
            writes: Rc::new(Cell::new(0)),
            failing: false,
        }
    }

    /// A pin whose every read and write fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new(true)
        }
    }

    pub fn set_level(&self, high: bool) {
        self.high.set(high);
    }

    pub fn level(&self) -> bool {
        self.high.get()
    }

    pub fn writes(&self) -> u32 {
        self.writes.get()
    }

    fn check(&self) -> Result<(), MockPinError> {
        if self.failing {
            Err(MockPinError)
        } else {
            Ok(())
        }
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.check()?;
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.check()?;
        Ok(!self.high.get())
    }
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.check()?;
        self.high.set(false);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.check()?;
        self.high.set(true);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// Report sink recording everything sent.
#[derive(Clone, Debug)]
pub struct MockSink {
    pub sent: Rc<core::cell::RefCell<Vec<InputReport>>>,
    pub ready: Rc<Cell<bool>>,
    pub fail_with: Option<OutputError>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            sent: Rc::new(core::cell::RefCell::new(Vec::new())),
            ready: Rc::new(Cell::new(true)),
            fail_with: None,
        }
    }

    pub fn take(&self) -> Vec<InputReport> {
        self.sent.borrow_mut().drain(..).collect()
    }
}

impl ReportSink for MockSink {
    fn send(&mut self, report: &InputReport) -> impl Future<Output = Result<(), OutputError>> {
        let result = match self.fail_with {
            Some(e) => Err(e),
            None => {
                self.sent.borrow_mut().push(*report);
                Ok(())
            }
        };
        core::future::ready(result)
    }

    fn is_ready(&self) -> bool {
        self.ready.get()
    }
}

/// Pixel sink keeping the last frame.
#[derive(Default, Debug)]
pub struct MockStrip {
    pub frames: Vec<Vec<Rgb>>,
}

impl PixelSink for MockStrip {
    fn write(&mut self, pixels: &[Rgb]) -> impl Future<Output = ()> {
        self.frames.push(pixels.to_vec());
        core::future::ready(())
    }
}
