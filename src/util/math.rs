//! Small numeric helpers shared by the search kernels.

/// Finalizer of the splitmix64 generator.
///
/// Used to derive independent, reproducible RNG seeds for each
/// `(seed, stream, row)` triple.
pub(crate) fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Derives the seed for one row of one random stream.
pub(crate) fn row_seed(seed: u64, stream: u64, row: usize) -> u64 {
    splitmix64(splitmix64(seed ^ splitmix64(stream)) ^ row as u64)
}

/// Returns `(x, y)` scaled to unit length, or zero when the length is zero.
pub(crate) fn normalize2(x: f32, y: f32) -> (f32, f32) {
    let dot = x * x + y * y;
    if dot == 0.0 {
        (0.0, 0.0)
    } else {
        let len = dot.sqrt();
        (x / len, y / len)
    }
}
