//! The OSIF context object.
//!
//! [`Osif`] owns the reset registry, the interrupt demultiplexer, and one
//! [`ChannelFifo`] per HWT. It is constructed once at boot, promoted to
//! `'static` by the caller (a `static` cell or a leaked box), and then
//! [`start`](Osif::start)ed, which hands it to the physical line as the
//! interrupt handler.
//!
//! ```ignore
//! let osif = OSIF.init(Osif::new(&board)?);
//! osif.start()?;
//!
//! let ch = osif.open(0)?;
//! ch.write(0x0000_0001);
//! let reply = ch.read();
//! ch.close();
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::error::OsifError;
use crate::fifo::ChannelFifo;
use crate::hal::{InterruptHandler, Platform};
use crate::intc::InterruptDemux;
use crate::reset::ResetRegistry;
use crate::{oerr, oinfo};

type Fifo<P> = ChannelFifo<<P as Platform>::Fifo, <P as Platform>::Signal>;

/// OSIF driver state for one ReconOS system.
pub struct Osif<P: Platform> {
    resets: ResetRegistry<P::ProcControl>,
    demux: InterruptDemux<P::Intc, P::Line>,
    channels: Box<[Fifo<P>]>,
}

impl<P: Platform> Osif<P> {
    /// Discovers the HWTs, holds them all in reset, and builds the
    /// channel array. The interrupt line stays masked until
    /// [`start`](Self::start).
    pub fn new(platform: &P) -> Result<Self, OsifError> {
        let resets = ResetRegistry::discover(platform.proc_control())?;
        resets.system_reset();

        let count = resets.num_hwts();
        let demux = InterruptDemux::new(platform.intc(), platform.irq_line(), count)?;

        let mut channels = Vec::new();
        if channels.try_reserve_exact(count).is_err() {
            oerr!("osif: cannot allocate {} channels", count);
            return Err(OsifError::AllocationFailure);
        }
        for id in 0..count {
            channels.push(ChannelFifo::new(id, platform.fifo(id), platform.signal()));
        }

        oinfo!("osif: initialized {} channel(s)", count);
        Ok(Self {
            resets,
            demux,
            channels: channels.into_boxed_slice(),
        })
    }

    /// Installs `self` as the line's handler and unmasks the line.
    ///
    /// Fails with [`OsifError::AlreadyStarted`] on a second call.
    pub fn start(&'static self) -> Result<(), OsifError>
    where
        P: 'static,
    {
        self.demux.start(self)
    }

    /// Masks the physical line. Blocked readers stay blocked until the
    /// line is started again.
    pub fn stop(&self) {
        self.demux.stop();
    }

    /// Returns a handle to channel `id`.
    ///
    /// Accepts any integer type; negative or out-of-range values fail with
    /// [`OsifError::InvalidChannel`]. No hardware is touched.
    pub fn open<I: TryInto<usize>>(&self, id: I) -> Result<Channel<'_, P>, OsifError> {
        let fifo = id
            .try_into()
            .ok()
            .and_then(|id| self.channels.get(id))
            .ok_or(OsifError::InvalidChannel)?;
        Ok(Channel { osif: self, fifo })
    }

    /// Returns the HWT count discovered at boot.
    pub fn num_hwts(&self) -> usize {
        self.channels.len()
    }

    /// Returns the reset registry and process control pass-throughs.
    pub fn resets(&self) -> &ResetRegistry<P::ProcControl> {
        &self.resets
    }

    /// Returns the interrupt demultiplexer.
    pub fn demux(&self) -> &InterruptDemux<P::Intc, P::Line> {
        &self.demux
    }

    /// Returns the software mirror of the interrupt enable mask.
    pub fn enable_mask(&self) -> u32 {
        self.demux.enable_mask()
    }

    /// Returns how many channels are armed.
    pub fn enabled_count(&self) -> u32 {
        self.demux.enabled_count()
    }

    /// Returns how many interrupt handler passes have run.
    pub fn interrupt_count(&self) -> u32 {
        self.demux.interrupt_count()
    }

    /// Returns channel `id`'s fill estimate.
    pub fn cached_fill(&self, id: usize) -> Result<u32, OsifError> {
        self.channels
            .get(id)
            .map(ChannelFifo::cached_fill)
            .ok_or(OsifError::InvalidChannel)
    }
}

impl<P: Platform> InterruptHandler for Osif<P> {
    fn handle_interrupt(&self) {
        self.demux.dispatch(|id| {
            if let Some(fifo) = self.channels.get(id) {
                fifo.refresh_and_signal();
            }
        });
    }
}

impl<P: Platform> fmt::Debug for Osif<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Osif")
            .field("hwts", &self.num_hwts())
            .field("enable_mask", &format_args!("{:#010x}", self.enable_mask()))
            .field("interrupts", &self.interrupt_count())
            .finish_non_exhaustive()
    }
}

/// An open channel to one HWT.
///
/// At most one thread may read from a channel at a time. Writes may come
/// from any thread.
pub struct Channel<'a, P: Platform> {
    osif: &'a Osif<P>,
    fifo: &'a Fifo<P>,
}

impl<P: Platform> Channel<'_, P> {
    /// Returns the channel index.
    pub fn id(&self) -> usize {
        self.fifo.id()
    }

    /// Reads one word, parking until the HWT produces it.
    ///
    /// Words come back in the order the HWT wrote them. There is no
    /// timeout.
    pub fn read(&self) -> u32 {
        let id = self.fifo.id();
        self.fifo.read(|| self.osif.demux.arm(id))
    }

    /// Writes one word, spinning while the HWT's input FIFO is full.
    pub fn write(&self, word: u32) {
        self.fifo.write(word);
    }

    /// Returns the channel's fill estimate.
    pub fn cached_fill(&self) -> u32 {
        self.fifo.cached_fill()
    }

    /// Closes the handle. The hardware FIFO and any buffered words persist.
    pub fn close(self) {}
}

impl<P: Platform> fmt::Debug for Channel<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id())
            .field("cached_fill", &self.cached_fill())
            .finish()
    }
}
