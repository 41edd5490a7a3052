use crate::models::domain::{Difficulty, DifficultyMix};

/// Turns a requested total and mix into the ordered generation schedule:
/// exactly `total` labels grouped easy, then medium, then hard.
pub fn build_schedule(total: usize, mix: &DifficultyMix) -> Vec<Difficulty> {
    // Weights are widened so that no mix can overflow the sum.
    let weights = Difficulty::ALL.map(|d| mix.count(d).max(0) as u128);
    let sum: u128 = weights.iter().sum();

    let counts = if sum == 0 {
        [0, total, 0]
    } else if sum == total as u128 {
        weights.map(|weight| weight as usize)
    } else {
        rescale(weights, sum, total)
    };

    Difficulty::ALL
        .iter()
        .zip(counts)
        .flat_map(|(difficulty, count)| std::iter::repeat(*difficulty).take(count))
        .collect()
}

fn rescale(weights: [u128; 3], sum: u128, total: usize) -> [usize; 3] {
    // Ties round to even, matching the rounding the weights were tuned with.
    let mut scaled = weights.map(|weight| {
        let share = (weight as f64 * total as f64 / sum as f64).round_ties_even();
        (share as usize).min(total)
    });

    while counts_total(&scaled) < total {
        for i in 0..scaled.len() {
            if counts_total(&scaled) == total {
                break;
            }
            scaled[i] += 1;
        }
    }

    while counts_total(&scaled) > total {
        for i in (0..scaled.len()).rev() {
            if counts_total(&scaled) == total {
                break;
            }
            if scaled[i] > 0 {
                scaled[i] -= 1;
            }
        }
    }

    scaled
}

fn counts_total(counts: &[usize; 3]) -> usize {
    counts.iter().sum()
}
