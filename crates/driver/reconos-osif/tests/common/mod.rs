//! Simulated ReconOS system for host integration tests.
//!
//! One register file behind a mutex backs every port. The HWT side is
//! driven directly by tests: [`Sim::hw_push`] enqueues words for software
//! to read, and [`Sim::fire`] raises the shared interrupt line by calling
//! the connected handler on the current thread.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use reconos_osif::hal::{
    FifoPort, IntcPort, InterruptHandler, IrqLine, Platform, ProcControlPort, ProcFeatures,
    RecvStatus, SendStatus,
};
use reconos_osif::{Osif, OsifError};

/// Capacity reported by a send FIFO that is not full.
const SEND_CAPACITY: u32 = 16;

// ---------------------------------------------------------------------------
// Register file
// ---------------------------------------------------------------------------

/// Every register of the simulated system plus write logs.
pub struct SimState {
    pub hwts: u32,
    pub features: ProcFeatures,
    pub line_available: bool,

    /// HWT-to-software words per channel.
    pub rx: Vec<VecDeque<u32>>,
    /// Software-to-HWT words per channel.
    pub tx: Vec<Vec<u32>>,
    /// Send status polls left to report full, per channel.
    pub full_polls: Vec<u32>,
    /// Raw receive status to report instead of the queue state.
    pub recv_status_override: Vec<Option<u32>>,

    /// Channels that read as pending regardless of their FIFO.
    pub force_pending: u32,
    pub enable: u32,
    pub enable_writes: Vec<u32>,

    pub reset_words: Vec<u32>,
    pub reset_writes: Vec<(usize, u32)>,
    pub sys_resets: u32,

    pub tlb_hits: u32,
    pub tlb_misses: u32,
    pub page_fault_addr: u32,
    pub pgd_addr: u32,

    pub acks: u32,
    pub unmasked: bool,
    pub handler: Option<&'static dyn InterruptHandler>,

    /// Signals in creation order, which is channel order.
    pub signals: Vec<Arc<SignalState>>,
}

impl SimState {
    fn raw_pending(&self) -> u32 {
        (0..self.rx.len()).fold(self.force_pending, |acc, ch| {
            let has_data = match self.recv_status_override[ch] {
                Some(raw) => raw & RecvStatus::EMPTY.bits() == 0,
                None => !self.rx[ch].is_empty(),
            };
            if has_data { acc | (1 << ch) } else { acc }
        })
    }
}

/// Handle to the simulated system; cheap to clone.
#[derive(Clone)]
pub struct Sim(Arc<Mutex<SimState>>);

impl Sim {
    /// A system with `hwts` HWTs and working interrupt hardware.
    pub fn new(hwts: u32) -> Self {
        let n = hwts as usize;
        Self(Arc::new(Mutex::new(SimState {
            hwts,
            features: ProcFeatures::empty(),
            line_available: true,
            rx: vec![VecDeque::new(); n],
            tx: vec![Vec::new(); n],
            full_polls: vec![0; n],
            recv_status_override: vec![None; n],
            force_pending: 0,
            enable: 0,
            enable_writes: Vec::new(),
            reset_words: vec![0; n.div_ceil(32)],
            reset_writes: Vec::new(),
            sys_resets: 0,
            tlb_hits: 0,
            tlb_misses: 0,
            page_fault_addr: 0,
            pgd_addr: 0,
            acks: 0,
            unmasked: false,
            handler: None,
            signals: Vec::new(),
        })))
    }

    pub fn state(&self) -> MutexGuard<'_, SimState> {
        self.0.lock().unwrap()
    }

    /// Builds the driver, leaks it to `'static`, and starts the line.
    pub fn boot(&self) -> &'static Osif<Sim> {
        let osif: &'static Osif<Sim> = Box::leak(Box::new(Osif::new(self).unwrap()));
        osif.start().unwrap();
        osif
    }

    /// Like [`boot`](Self::boot) but returns the construction error.
    pub fn try_boot(&self) -> Result<&'static Osif<Sim>, OsifError> {
        let osif: &'static Osif<Sim> = Box::leak(Box::new(Osif::new(self)?));
        osif.start()?;
        Ok(osif)
    }

    /// HWT `ch` produces `words`.
    pub fn hw_push(&self, ch: usize, words: &[u32]) {
        self.state().rx[ch].extend(words.iter().copied());
    }

    /// Words software has written to HWT `ch`.
    pub fn hw_received(&self, ch: usize) -> Vec<u32> {
        self.state().tx[ch].clone()
    }

    /// Raises the shared line once, as the trap glue would.
    pub fn fire(&self) {
        let handler = {
            let state = self.state();
            assert!(state.unmasked, "interrupt fired on a masked line");
            state.handler
        };
        handler.expect("no handler connected").handle_interrupt();
    }

    /// Number of times channel `ch`'s signal was posted.
    pub fn posts(&self, ch: usize) -> u32 {
        let signal = Arc::clone(&self.state().signals[ch]);
        *signal.posts.lock().unwrap()
    }

    /// Starts a thread that reads `count` words from channel `ch` and
    /// returns once that reader has armed the channel and parked.
    pub fn park_reader(
        &self,
        osif: &'static Osif<Sim>,
        ch: usize,
        count: usize,
    ) -> JoinHandle<Vec<u32>> {
        let reader = std::thread::spawn(move || {
            let channel = osif.open(ch).unwrap();
            (0..count).map(|_| channel.read()).collect()
        });
        self.wait_until_armed(ch);
        reader
    }

    /// Blocks until channel `ch`'s enable bit is set in hardware.
    pub fn wait_until_armed(&self, ch: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.state().enable & (1 << ch) == 0 {
            assert!(Instant::now() < deadline, "channel {ch} never armed");
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

pub struct SimFifo {
    sim: Sim,
    ch: usize,
}

impl FifoPort for SimFifo {
    fn recv_data(&self) -> u32 {
        self.sim.state().rx[self.ch]
            .pop_front()
            .expect("read from an empty receive FIFO")
    }

    fn set_send_data(&self, word: u32) {
        self.sim.state().tx[self.ch].push(word);
    }

    fn recv_status(&self) -> RecvStatus {
        let state = self.sim.state();
        if let Some(raw) = state.recv_status_override[self.ch] {
            return RecvStatus::from_bits_retain(raw);
        }
        match state.rx[self.ch].len() {
            0 => RecvStatus::EMPTY,
            n => RecvStatus::from_bits_retain(n as u32),
        }
    }

    fn send_status(&self) -> SendStatus {
        let mut state = self.sim.state();
        let polls = &mut state.full_polls[self.ch];
        if *polls > 0 {
            *polls -= 1;
            SendStatus::FULL
        } else {
            SendStatus::from_bits_retain(SEND_CAPACITY)
        }
    }
}

pub struct SimIntc(Sim);

impl IntcPort for SimIntc {
    fn set_enable(&self, mask: u32) {
        let mut state = self.0.state();
        state.enable = mask;
        state.enable_writes.push(mask);
    }

    fn pending(&self) -> u32 {
        self.0.state().raw_pending()
    }
}

pub struct SimProcControl(Sim);

impl ProcControlPort for SimProcControl {
    fn num_hwts(&self) -> u32 {
        self.0.state().hwts
    }

    fn features(&self) -> ProcFeatures {
        self.0.state().features
    }

    fn set_sys_reset(&self, _value: u32) {
        let mut state = self.0.state();
        state.sys_resets += 1;
        state.reset_words.fill(u32::MAX);
    }

    fn set_hwt_reset(&self, word: usize, value: u32) {
        let mut state = self.0.state();
        state.reset_words[word] = value;
        state.reset_writes.push((word, value));
    }

    fn tlb_hits(&self) -> u32 {
        self.0.state().tlb_hits
    }

    fn tlb_misses(&self) -> u32 {
        self.0.state().tlb_misses
    }

    fn page_fault_addr(&self) -> u32 {
        self.0.state().page_fault_addr
    }

    fn set_page_fault_addr(&self, value: u32) {
        self.0.state().page_fault_addr = value;
    }

    fn set_pgd_addr(&self, addr: u32) {
        self.0.state().pgd_addr = addr;
    }
}

pub struct SimLine(Sim);

impl IrqLine for SimLine {
    fn is_available(&self) -> bool {
        self.0.state().line_available
    }

    fn connect(&self, handler: &'static dyn InterruptHandler) {
        self.0.state().handler = Some(handler);
    }

    fn unmask(&self) {
        self.0.state().unmasked = true;
    }

    fn mask(&self) {
        self.0.state().unmasked = false;
    }

    fn acknowledge(&self) {
        self.0.state().acks += 1;
    }
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct SignalState {
    count: Mutex<u32>,
    posts: Mutex<u32>,
    cv: Condvar,
}

pub struct SimSignal(Arc<SignalState>);

impl reconos_osif::hal::Signal for SimSignal {
    fn post(&self) {
        *self.0.posts.lock().unwrap() += 1;
        *self.0.count.lock().unwrap() += 1;
        self.0.cv.notify_all();
    }

    fn wait(&self) {
        let mut count = self.0.count.lock().unwrap();
        while *count == 0 {
            count = self.0.cv.wait(count).unwrap();
        }
        *count -= 1;
    }
}

impl Platform for Sim {
    type Fifo = SimFifo;
    type Intc = SimIntc;
    type ProcControl = SimProcControl;
    type Line = SimLine;
    type Signal = SimSignal;

    fn proc_control(&self) -> SimProcControl {
        SimProcControl(self.clone())
    }

    fn intc(&self) -> SimIntc {
        SimIntc(self.clone())
    }

    fn irq_line(&self) -> SimLine {
        SimLine(self.clone())
    }

    fn fifo(&self, index: usize) -> SimFifo {
        SimFifo {
            sim: self.clone(),
            ch: index,
        }
    }

    fn signal(&self) -> SimSignal {
        let state = Arc::new(SignalState::default());
        self.state().signals.push(Arc::clone(&state));
        SimSignal(state)
    }
}
