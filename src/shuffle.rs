use rand::Rng;

/// In-place Fisher-Yates shuffle.
///
/// Walks `i` from the last index down to 1 and swaps slot `i` with a uniformly
/// drawn slot in `[0, i]`. Slices of length 0 or 1 are left untouched and draw
/// nothing from `rng`.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
