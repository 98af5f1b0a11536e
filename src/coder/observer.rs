//! Per-bin observation hooks.
//!
//! Coders report every bin to an optional [`BinObserver`] handed over at
//! construction. The bin index is counted per coder instance, so traces from
//! an encoder and its decoder line up one-to-one.

use tracing::trace;

/// How a bin was coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinKind {
    /// Context-coded; the context state before its update.
    Context { state: u8, mps: bool },
    /// Equiprobable bypass bin.
    Bypass,
    /// Terminating bin.
    Terminate,
}

/// One coded bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinEvent {
    /// Position of the bin since the coder was created
    pub index: u64,
    pub kind: BinKind,
    pub bin: bool,
}

/// Receives every bin a coder processes.
pub trait BinObserver: Send {
    fn on_bin(&mut self, event: &BinEvent);
}

impl<F> BinObserver for F
where
    F: FnMut(&BinEvent) + Send,
{
    fn on_bin(&mut self, event: &BinEvent) {
        self(event);
    }
}

/// Forwards bins to a consumer thread.
#[cfg(feature = "parallel")]
#[cfg_attr(docsrs, doc(cfg(feature = "parallel")))]
impl BinObserver for crossbeam_channel::Sender<BinEvent> {
    fn on_bin(&mut self, event: &BinEvent) {
        // A gone receiver only means nobody is listening anymore.
        let _ = self.send(*event);
    }
}

/// Emits each bin as a `tracing` TRACE event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceObserver {
    label: &'static str,
}

impl TraceObserver {
    /// Tag events with a label, e.g. `"enc"` or `"dec"`.
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl BinObserver for TraceObserver {
    fn on_bin(&mut self, event: &BinEvent) {
        match event.kind {
            BinKind::Context { state, mps } => trace!(
                target: "hevc_cabac::bins",
                coder = self.label,
                index = event.index,
                state,
                mps,
                bin = event.bin,
            ),
            BinKind::Bypass => trace!(
                target: "hevc_cabac::bins",
                coder = self.label,
                index = event.index,
                bypass = true,
                bin = event.bin,
            ),
            BinKind::Terminate => trace!(
                target: "hevc_cabac::bins",
                coder = self.label,
                index = event.index,
                terminate = true,
                bin = event.bin,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_closure_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut observer = move |event: &BinEvent| sink.lock().unwrap().push(*event);

        let event = BinEvent {
            index: 3,
            kind: BinKind::Bypass,
            bin: true,
        };
        observer.on_bin(&event);
        assert_eq!(seen.lock().unwrap().as_slice(), &[event]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_channel_observer() {
        let (mut tx, rx) = crossbeam_channel::unbounded();
        let event = BinEvent {
            index: 0,
            kind: BinKind::Terminate,
            bin: false,
        };
        tx.on_bin(&event);
        assert_eq!(rx.try_recv(), Ok(event));
    }
}
