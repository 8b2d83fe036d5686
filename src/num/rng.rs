use rand::rngs::SmallRng;
use rand::SeedableRng;

use std::sync::{Mutex, OnceLock};

// All randomized array construction draws from a single process-wide generator
// so that two matrices built back to back never share a seed.
static GLOBAL: OnceLock<Mutex<SmallRng>> = OnceLock::new();

fn global() -> &'static Mutex<SmallRng> {
    GLOBAL.get_or_init(|| Mutex::new(SmallRng::from_entropy()))
}

/// Run a closure with exclusive access to the process-wide generator.
pub fn with_rng<T, F>(f: F) -> T
where
    F: FnOnce(&mut SmallRng) -> T,
{
    let mut rng = global().lock().unwrap_or_else(|e| e.into_inner());
    f(&mut rng)
}

/// Reseed the process-wide generator. Mainly useful to make tests
/// reproducible, normal operation seeds from entropy once at startup.
pub fn reseed(seed: u64) {
    let mut rng = global().lock().unwrap_or_else(|e| e.into_inner());
    *rng = SmallRng::seed_from_u64(seed);
}
