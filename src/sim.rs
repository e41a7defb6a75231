//! Deterministic line and clock doubles for protocol tests.
//!
//! [`scripted`] builds a [`SimLine`]/[`SimClock`] pair over one shared
//! virtual-time state. The line follows a scripted edge timeline, each level
//! poll costs [`POLL_COST_US`] of virtual time, delays advance it by exactly
//! the requested amount, and `now_us` observes it without advancing it. With
//! edges on whole microseconds every measured pulse width comes out exactly
//! equal to the scripted one, so tests assert timing behavior without
//! tolerance windows.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

use crate::clock::Clock;
use crate::line::{Direction, Level, Line};

/// Virtual cost of one `read_level` poll, in microseconds.
pub const POLL_COST_US: u64 = 1;

/// A line operation observed by the sim, for asserting protocol order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineOp {
    SetDirection(Direction),
    WriteLevel(Level),
}

#[derive(Debug)]
struct SimState {
    now_us: u64,
    idle: Level,
    edges: Vec<(u64, Level)>,
    ops: Vec<LineOp>,
    reads: u64,
}

impl SimState {
    fn level_at(&self, t: u64) -> Level {
        self.edges
            .iter()
            .take_while(|(at, _)| *at <= t)
            .last()
            .map(|(_, level)| *level)
            .unwrap_or(self.idle)
    }
}

/// Scripted digital line sharing virtual time with a [`SimClock`].
#[derive(Debug)]
pub struct SimLine {
    state: Rc<RefCell<SimState>>,
}

/// Virtual-time clock sharing state with a [`SimLine`].
#[derive(Debug)]
pub struct SimClock {
    state: Rc<RefCell<SimState>>,
}

/// Builds a line/clock pair over one edge timeline.
///
/// `idle` is the level before the first edge; `edges` are `(time_us, level)`
/// transitions and must be sorted ascending.
pub fn scripted(idle: Level, edges: Vec<(u64, Level)>) -> (SimLine, SimClock) {
    debug_assert!(edges.windows(2).all(|pair| pair[0].0 <= pair[1].0));

    let state = Rc::new(RefCell::new(SimState {
        now_us: 0,
        idle,
        edges,
        ops: Vec::new(),
        reads: 0,
    }));

    (
        SimLine {
            state: Rc::clone(&state),
        },
        SimClock { state },
    )
}

impl SimLine {
    /// Direction changes and writes recorded so far, in order.
    pub fn ops(&self) -> Vec<LineOp> {
        self.state.borrow().ops.clone()
    }

    /// Number of level polls performed so far.
    pub fn reads(&self) -> u64 {
        self.state.borrow().reads
    }
}

impl Line for SimLine {
    type Error = Infallible;

    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        self.state
            .borrow_mut()
            .ops
            .push(LineOp::SetDirection(direction));
        Ok(())
    }

    fn write_level(&mut self, level: Level) -> Result<(), Self::Error> {
        self.state.borrow_mut().ops.push(LineOp::WriteLevel(level));
        Ok(())
    }

    fn read_level(&mut self) -> Result<Level, Self::Error> {
        let mut state = self.state.borrow_mut();
        state.now_us += POLL_COST_US;
        state.reads += 1;
        let t = state.now_us;
        Ok(state.level_at(t))
    }
}

impl SimClock {
    /// Current virtual time, without advancing it.
    pub fn time_us(&self) -> u64 {
        self.state.borrow().now_us
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.state.borrow_mut().now_us += u64::from(ns) / 1_000;
    }
}

impl Clock for SimClock {
    fn now_us(&mut self) -> u64 {
        self.state.borrow().now_us
    }
}
