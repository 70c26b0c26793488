//! HWT reset bitmap and process control pass-throughs.
//!
//! Every HWT has a reset line; a set bit holds the HWT in reset. The
//! bitmap is split into 32-bit words, one hardware register per word, and
//! a software copy of each word is kept so single bits can be changed with
//! one register write.

use alloc::vec::Vec;

use reconos_core::sync::IrqSpinLock;

use crate::error::OsifError;
use crate::hal::{ProcControlPort, ProcFeatures};
use crate::{odebug, oerr, oinfo};

/// HWTs covered by one reset word.
const HWTS_PER_WORD: usize = 32;

/// Reset bitmap sized from the hardware-reported HWT count.
pub struct ResetRegistry<C> {
    port: C,
    hwts: usize,
    words: IrqSpinLock<Vec<u32>>,
}

impl<C: ProcControlPort> ResetRegistry<C> {
    /// Reads the HWT count once and allocates `ceil(count / 32)` words.
    ///
    /// The words start cleared; [`system_reset`](Self::system_reset) is
    /// expected before any channel traffic.
    pub fn discover(port: C) -> Result<Self, OsifError> {
        let hwts = port.num_hwts() as usize;
        let len = hwts.div_ceil(HWTS_PER_WORD);

        let mut words = Vec::new();
        if words.try_reserve_exact(len).is_err() {
            oerr!("osif: cannot allocate reset bitmap for {} HWTs", hwts);
            return Err(OsifError::AllocationFailure);
        }
        words.resize(len, 0);

        oinfo!("osif: {} HWTs, {} reset word(s)", hwts, len);
        Ok(Self {
            port,
            hwts,
            words: IrqSpinLock::new(words),
        })
    }

    /// Returns the number of HWTs discovered at boot.
    pub fn num_hwts(&self) -> usize {
        self.hwts
    }

    /// Returns the number of reset words.
    pub fn word_count(&self) -> usize {
        self.words.lock().len()
    }

    /// Returns the software copy of reset word `index`.
    pub fn word(&self, index: usize) -> Option<u32> {
        self.words.lock().get(index).copied()
    }

    /// Holds every HWT in reset with a single write to the trigger register.
    pub fn system_reset(&self) {
        let mut words = self.words.lock();
        words.fill(u32::MAX);
        self.port.set_sys_reset(0);
        drop(words);

        odebug!("osif: system reset");
    }

    /// Holds (`held = true`) or releases HWT `id`.
    ///
    /// Only the register of the word containing `id` is written.
    pub fn set_reset(&self, id: usize, held: bool) -> Result<(), OsifError> {
        let (index, bit) = self.locate(id)?;

        let mut words = self.words.lock();
        let Some(word) = words.get_mut(index) else {
            return Err(OsifError::InvalidChannel);
        };
        if held {
            *word |= bit;
        } else {
            *word &= !bit;
        }
        self.port.set_hwt_reset(index, *word);
        drop(words);

        odebug!("osif: HWT {} {}", id, if held { "held in reset" } else { "released" });
        Ok(())
    }

    /// Returns `true` if HWT `id` is held in reset.
    pub fn is_reset(&self, id: usize) -> Result<bool, OsifError> {
        let (index, bit) = self.locate(id)?;
        self.word(index)
            .map(|word| word & bit != 0)
            .ok_or(OsifError::InvalidChannel)
    }

    /// Reads the TLB hit counter.
    pub fn tlb_hits(&self) -> Result<u32, OsifError> {
        self.require(ProcFeatures::TLB_COUNTERS)?;
        Ok(self.port.tlb_hits())
    }

    /// Reads the TLB miss counter.
    pub fn tlb_misses(&self) -> Result<u32, OsifError> {
        self.require(ProcFeatures::TLB_COUNTERS)?;
        Ok(self.port.tlb_misses())
    }

    /// Returns the address of the last HWT page fault.
    pub fn fault_addr(&self) -> Result<u32, OsifError> {
        self.require(ProcFeatures::MMU)?;
        Ok(self.port.page_fault_addr())
    }

    /// Acknowledges the pending HWT page fault.
    pub fn clear_page_fault(&self) -> Result<(), OsifError> {
        self.require(ProcFeatures::MMU)?;
        self.port.set_page_fault_addr(0);
        Ok(())
    }

    /// Points the HWT MMU at the page global directory `addr`.
    pub fn set_pgd(&self, addr: u32) -> Result<(), OsifError> {
        self.require(ProcFeatures::MMU)?;
        self.port.set_pgd_addr(addr);
        Ok(())
    }

    fn locate(&self, id: usize) -> Result<(usize, u32), OsifError> {
        if id >= self.hwts {
            return Err(OsifError::InvalidChannel);
        }
        Ok((id / HWTS_PER_WORD, 1 << (id % HWTS_PER_WORD)))
    }

    fn require(&self, feature: ProcFeatures) -> Result<(), OsifError> {
        if self.port.features().contains(feature) {
            Ok(())
        } else {
            Err(OsifError::FeatureUnavailable)
        }
    }
}
