use rayon::ThreadPoolBuilder;
use std::sync::Once;

static INIT_THREADPOOL_ONCE: Once = Once::new();

/// Initialize the global rayon threadpool used for parallel row hashing
/// during groupification (spec.md section 5). Safe to call more than
/// once; only the first call takes effect.
pub fn init_threadpool(num_threads: usize) {
    INIT_THREADPOOL_ONCE.call_once(|| {
        ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .expect("cannot build groupifier threadpool");
    });
}

/// Calculates the chunk size to use for an iterable input so that it
/// splits evenly across all available rayon threads. Used by the
/// groupifier to partition rows before parallel hash-insertion; the
/// merge step afterwards runs in fixed chunk order so the result is
/// identical to the sequential baseline (spec.md section 5).
pub fn chunk_size(input_length: usize) -> usize {
    let num_threads = rayon::current_num_threads();
    let minimum_factor = std::cmp::min(input_length, num_threads).max(1);
    input_length.div_ceil(minimum_factor)
}
