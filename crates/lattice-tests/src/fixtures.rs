//! Deterministic inputs and a warning counter shared by the tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lattice_core::DenseArray;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// 32-bit xorshift generator (13, 17, 5).
pub struct XorShift(u32);

impl XorShift {
    pub fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Uniform value in `[lo, hi]`.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_u32() as f64 / u32::MAX as f64
    }
}

/// Array of uniform values in `[-1, 1]`.
pub fn random_array(w: usize, h: usize, d: usize, c: usize, seed: u32) -> DenseArray<f64> {
    let mut rng = XorShift::new(seed);
    DenseArray::from_fn(w, h, d, c, |_, _, _, _| rng.uniform(-1.0, 1.0))
}

/// Random symmetric `n x n` matrix.
pub fn random_symmetric(n: usize, seed: u32) -> DenseArray<f64> {
    let a = random_array(n, n, 1, 1, seed);
    DenseArray::from_fn(n, n, 1, 1, |x, y, _, _| 0.5 * (a.at(x, y, 0, 0) + a.at(y, x, 0, 0)))
}

struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Runs `f` and returns its result with the number of `WARN` events it emitted.
pub fn count_warnings<R>(f: impl FnOnce() -> R) -> (R, usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(count.clone()));
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, count.load(Ordering::SeqCst))
}
