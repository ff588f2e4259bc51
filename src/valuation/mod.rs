pub mod currency;

pub use currency::format_currency;

// Samples up to this size are averaged as-is
pub const SMALL_SAMPLE_MAX: usize = 5;

// Votes dropped from each end of the sorted sample once it is larger than SMALL_SAMPLE_MAX.
// This is a count, not a percentage: six votes keep only the middle two.
pub const TRIM_PER_TAIL: usize = 2;

// Trimmed mean of the votes: plain average up to SMALL_SAMPLE_MAX votes,
// otherwise the middle after dropping TRIM_PER_TAIL from each end. Unrounded.
pub fn valuation(votes: &[f64]) -> f64 {
    if votes.is_empty() {
        return 0.0;
    }

    // Summing in sorted order keeps the float result identical across permutations
    let mut sorted = votes.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let kept = if sorted.len() <= SMALL_SAMPLE_MAX {
        &sorted[..]
    } else {
        &sorted[TRIM_PER_TAIL..sorted.len() - TRIM_PER_TAIL]
    };

    mean(kept)
}

fn mean(values: &[f64]) -> f64 {
    let sum: f64 = values.iter().sum();
    sum / values.len() as f64
}
