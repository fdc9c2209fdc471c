//! Stand-in BCH engine
//!
//! The "code" is a column-wise XOR of the chunk folded into the ECC bytes.
//! It detects most corruption and corrects none; it exists to exercise the
//! request routing, not to protect data.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use jznand_core::{BoxError, EccEngine, EccParams, EccStatus};

/// Counters shared between a [`DummyEccEngine`] and the test
#[derive(Debug, Default)]
pub struct EngineStats {
    acquired: AtomicUsize,
    released: AtomicUsize,
    calculated: Mutex<Vec<EccParams>>,
    corrected: Mutex<Vec<EccParams>>,
}

impl EngineStats {
    /// Fresh counters
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Times the engine was handed out
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Times the engine was given back
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Parameters of every calculate request
    pub fn calculated(&self) -> Vec<EccParams> {
        self.calculated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Parameters of every correct request
    pub fn corrected(&self) -> Vec<EccParams> {
        self.corrected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Column-wise XOR of `data` into `code`
pub fn fold(data: &[u8], code: &mut [u8]) {
    code.fill(0);
    if code.is_empty() {
        return;
    }
    for (i, &byte) in data.iter().enumerate() {
        code[i % code.len()] ^= byte;
    }
}

/// The engine object handed to the controller
///
/// Counts as released when dropped.
#[derive(Debug)]
pub struct DummyEccEngine {
    stats: Arc<EngineStats>,
}

impl DummyEccEngine {
    /// Hand out an engine, counting the acquisition
    pub fn acquire(stats: Arc<EngineStats>) -> Self {
        stats.acquired.fetch_add(1, Ordering::SeqCst);
        log::debug!("dummy: bch engine acquired");
        Self { stats }
    }
}

impl EccEngine for DummyEccEngine {
    fn calculate(
        &self,
        params: &EccParams,
        data: &[u8],
        ecc_code: &mut [u8],
    ) -> Result<(), BoxError> {
        self.stats
            .calculated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*params);
        let len = (params.bytes as usize).min(ecc_code.len());
        fold(data, &mut ecc_code[..len]);
        Ok(())
    }

    fn correct(
        &self,
        params: &EccParams,
        data: &mut [u8],
        read_ecc: &[u8],
    ) -> Result<EccStatus, BoxError> {
        self.stats
            .corrected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*params);

        let len = (params.bytes as usize).min(read_ecc.len());
        let mut expected = vec![0u8; len];
        fold(data, &mut expected);
        if expected == read_ecc[..len] {
            Ok(EccStatus::Corrected(0))
        } else {
            Ok(EccStatus::Uncorrectable)
        }
    }
}

impl Drop for DummyEccEngine {
    fn drop(&mut self) {
        self.stats.released.fetch_add(1, Ordering::SeqCst);
        log::debug!("dummy: bch engine released");
    }
}
