use std::cmp::Ordering;

use log::debug;
use ndarray::{ArrayView1, Axis};
use rand::Rng;

use crate::{Result, arch::Rbm, dataset::rating_vector};

/// The amount of items returned by default.
pub const DEFAULT_TOP_K: usize = 10;

/// The score given to items that must never be recommended.
const MASKED: f32 = -1.;

/// Recommends up to `k` items the user hasn't rated yet.
///
/// The user's ratings are passed once through the model, the reconstruction scores every item
/// and the already rated ones are masked out before ranking.
///
/// # Arguments
/// * `rbm` - The trained model.
/// * `ratings` - The `(item, rating)` pairs known for the user.
/// * `max_rating` - The highest rating of the scale.
/// * `k` - The maximum amount of items to recommend.
/// * `rng` - The random source for the hidden sample.
///
/// # Returns
/// The recommended item indices, best first.
pub fn recommend<R: Rng + ?Sized>(
    rbm: &Rbm,
    ratings: &[(usize, f32)],
    max_rating: f32,
    k: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let v = rating_vector(rbm.visible_count(), max_rating, ratings)?;
    let v = v.insert_axis(Axis(0));

    let mut scores = rbm.reconstruct(v.view(), rng)?.remove_axis(Axis(0));
    for &(item, _) in ratings {
        scores[item] = MASKED;
    }

    let top = rank_top_k(scores.view(), k);
    debug!(rated = ratings.len(), k = k; "recommended {top:?}");
    Ok(top)
}

/// Ranks the scores in descending order and returns the indices of the first `k`.
///
/// Negative scores are treated as masked and never returned. Ties go to the lower index.
pub fn rank_top_k(scores: ArrayView1<f32>, k: usize) -> Vec<usize> {
    let mut ranked: Vec<_> = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, score)| score >= 0.)
        .collect();

    ranked.sort_by(|(i, a), (j, b)| match b.total_cmp(a) {
        Ordering::Equal => i.cmp(j),
        ord => ord,
    });

    ranked.into_iter().take(k).map(|(i, _)| i).collect()
}
