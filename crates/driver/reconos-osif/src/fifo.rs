//! Per-HWT FIFO endpoint.
//!
//! A [`ChannelFifo`] caches how many words the receive FIFO holds so that
//! consecutive reads touch only the data register. The cache is refreshed
//! from the status register by the reader when it runs dry, or by the
//! interrupt handler after the channel fires.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::hal::{FifoPort, Signal};

/// One HWT's FIFO pair, fill cache, and wait primitive.
pub struct ChannelFifo<F, S> {
    id: usize,
    port: F,
    /// Words known to be waiting. Shared with the interrupt handler, which
    /// only writes it while the channel is armed.
    cached_fill: AtomicU32,
    wait: S,
}

impl<F: FifoPort, S: Signal> ChannelFifo<F, S> {
    /// Creates the endpoint for channel `id`. No hardware access.
    pub fn new(id: usize, port: F, wait: S) -> Self {
        Self {
            id,
            port,
            cached_fill: AtomicU32::new(0),
            wait,
        }
    }

    /// Returns the channel index.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the software fill estimate.
    pub fn cached_fill(&self) -> u32 {
        self.cached_fill.load(Ordering::Acquire)
    }

    /// Reloads the fill cache from the receive status register.
    fn refresh(&self) -> u32 {
        let fill = self.port.recv_status().available();
        self.cached_fill.store(fill, Ordering::Release);
        fill
    }

    /// Interrupt path: reload the fill cache, then wake the reader.
    pub(crate) fn refresh_and_signal(&self) {
        self.refresh();
        self.wait.post();
    }

    /// Reads one word, blocking until the HWT produces one.
    ///
    /// `arm` must enable this channel's interrupt; it is called each time
    /// the reader is about to park. Single consumer per channel.
    pub(crate) fn read(&self, arm: impl Fn()) -> u32 {
        if self.cached_fill() == 0 {
            self.refresh();
            // A wake without data re-arms and parks again.
            while self.cached_fill() == 0 {
                arm();
                self.wait.wait();
            }
        }

        let consumed = self
            .cached_fill
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |fill| fill.checked_sub(1));
        debug_assert!(consumed.is_ok(), "channel {} read with empty cache", self.id);

        self.port.recv_data()
    }

    /// Writes one word, spinning while the send FIFO is full.
    ///
    /// There is no "send not full" interrupt: the HWT is expected to drain
    /// its input faster than software dispatches, so the spin is short.
    pub(crate) fn write(&self, word: u32) {
        while self.port.send_status().is_full() {
            core::hint::spin_loop();
        }
        self.port.set_send_data(word);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{RecvStatus, SendStatus};
    use core::cell::Cell;
    use reconos_core::sync::Semaphore;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct LoopbackFifo {
        rx: Mutex<VecDeque<u32>>,
        tx: Mutex<Vec<u32>>,
        full_polls: Mutex<u32>,
    }

    impl FifoPort for LoopbackFifo {
        fn recv_data(&self) -> u32 {
            self.rx.lock().unwrap().pop_front().unwrap_or(0xDEAD_BEEF)
        }

        fn set_send_data(&self, word: u32) {
            self.tx.lock().unwrap().push(word);
        }

        fn recv_status(&self) -> RecvStatus {
            let len = self.rx.lock().unwrap().len() as u32;
            if len == 0 {
                RecvStatus::EMPTY
            } else {
                RecvStatus::from_bits_retain(len)
            }
        }

        fn send_status(&self) -> SendStatus {
            let mut polls = self.full_polls.lock().unwrap();
            if *polls > 0 {
                *polls -= 1;
                SendStatus::FULL
            } else {
                SendStatus::from_bits_retain(16)
            }
        }
    }

    fn channel(words: &[u32]) -> ChannelFifo<LoopbackFifo, Semaphore> {
        let port = LoopbackFifo::default();
        port.rx.lock().unwrap().extend(words.iter().copied());
        ChannelFifo::new(0, port, Semaphore::new(0))
    }

    #[test]
    fn read_refreshes_cache_once() {
        let ch = channel(&[10, 20, 30]);
        assert_eq!(ch.cached_fill(), 0);
        assert_eq!(ch.read(|| panic!("must not arm")), 10);
        assert_eq!(ch.cached_fill(), 2);
        assert_eq!(ch.read(|| panic!("must not arm")), 20);
        assert_eq!(ch.read(|| panic!("must not arm")), 30);
        assert_eq!(ch.cached_fill(), 0);
    }

    #[test]
    fn cache_ignores_words_arriving_after_refresh() {
        let ch = channel(&[1, 2]);
        ch.read(|| {});
        ch.port.rx.lock().unwrap().extend([3, 4, 5]);
        assert_eq!(ch.cached_fill(), 1);
        assert_eq!(ch.read(|| {}), 2);
        assert_eq!(ch.cached_fill(), 0);
        // Dry cache: the next read goes back to hardware.
        assert_eq!(ch.read(|| panic!("data is present")), 3);
        assert_eq!(ch.cached_fill(), 2);
    }

    #[test]
    fn empty_read_arms_and_parks() {
        let ch = channel(&[]);
        let arms = Cell::new(0);
        // Stand in for the interrupt path on the first arm.
        let word = ch.read(|| {
            arms.set(arms.get() + 1);
            ch.port.rx.lock().unwrap().push_back(77);
            ch.refresh_and_signal();
        });
        assert_eq!(word, 77);
        assert_eq!(arms.get(), 1);
    }

    #[test]
    fn spurious_wake_rearms() {
        let ch = channel(&[]);
        let arms = Cell::new(0);
        let word = ch.read(|| {
            arms.set(arms.get() + 1);
            if arms.get() == 2 {
                ch.port.rx.lock().unwrap().push_back(5);
            }
            ch.refresh_and_signal();
        });
        assert_eq!(word, 5);
        assert_eq!(arms.get(), 2);
    }

    #[test]
    fn write_waits_for_space() {
        let ch = channel(&[]);
        *ch.port.full_polls.lock().unwrap() = 3;
        ch.write(0xABCD);
        assert_eq!(*ch.port.full_polls.lock().unwrap(), 0);
        assert_eq!(*ch.port.tx.lock().unwrap(), vec![0xABCD]);
    }
}
