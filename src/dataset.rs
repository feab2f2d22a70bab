use std::num::NonZeroUsize;

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::{Rng, seq::SliceRandom};

use crate::{RbmErr, Result};

/// Builds the dense rating vector of a single user.
///
/// Ratings are divided by `max_rating` so every rated item lies in `(0, 1]`, unrated items are
/// left at zero. Repeated items keep their last rating.
///
/// # Arguments
/// * `visible_count` - The total amount of items.
/// * `max_rating` - The highest rating of the scale.
/// * `ratings` - The `(item, rating)` pairs known for the user.
///
/// # Returns
/// The rating vector or an error if an item or a rating is out of range.
pub fn rating_vector(
    visible_count: usize,
    max_rating: f32,
    ratings: &[(usize, f32)],
) -> Result<Array1<f32>> {
    if !max_rating.is_finite() || max_rating <= 0. {
        return Err(RbmErr::InvalidConfig(format!(
            "max_rating must be a positive number, got {max_rating}"
        )));
    }

    let mut v = Array1::zeros(visible_count);

    for &(item, rating) in ratings {
        if item >= visible_count {
            return Err(RbmErr::ItemOutOfRange {
                item,
                visible_count,
            });
        }

        if !rating.is_finite() || rating <= 0. || rating > max_rating {
            return Err(RbmErr::InvalidRating { item, rating });
        }

        v[item] = rating / max_rating;
    }

    Ok(v)
}

/// An in-memory collection of rating vectors, one row per user.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingDataset {
    rows: Array2<f32>,
}

impl RatingDataset {
    /// Creates a new `RatingDataset` from dense, already normalized, rows.
    ///
    /// # Arguments
    /// * `rows` - The rating vectors shaped `(users, visible_count)`, every value in `[0, 1]`.
    ///
    /// # Returns
    /// A new `RatingDataset` or an error if a value is out of range.
    pub fn new(rows: Array2<f32>) -> Result<Self> {
        if !rows.iter().all(|x| x.is_finite()) {
            return Err(RbmErr::NonFiniteInput { what: "dataset" });
        }

        if rows.iter().any(|&x| !(0. ..=1.).contains(&x)) {
            return Err(RbmErr::InvalidConfig(
                "dataset values must be normalized to [0, 1]".into(),
            ));
        }

        Ok(Self { rows })
    }

    /// Creates a new `RatingDataset` from each user's sparse ratings.
    ///
    /// # Arguments
    /// * `visible_count` - The total amount of items.
    /// * `max_rating` - The highest rating of the scale.
    /// * `users` - The `(item, rating)` pairs of every user.
    ///
    /// # Returns
    /// A new `RatingDataset` or an error if any rating is invalid.
    pub fn from_user_ratings<'a, I>(
        visible_count: usize,
        max_rating: f32,
        users: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [(usize, f32)]>,
    {
        let vectors = users
            .into_iter()
            .map(|ratings| rating_vector(visible_count, max_rating, ratings))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Array2::zeros((vectors.len(), visible_count));
        for (mut row, v) in rows.outer_iter_mut().zip(&vectors) {
            row.assign(v);
        }

        Ok(Self { rows })
    }

    /// Returns the amount of users.
    pub fn len(&self) -> usize {
        self.rows.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.nrows() == 0
    }

    /// Returns the amount of items.
    pub fn visible_count(&self) -> usize {
        self.rows.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.rows.view()
    }

    /// Randomly permutes the users.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut order: Vec<_> = (0..self.len()).collect();
        order.shuffle(rng);
        self.rows = self.rows.select(Axis(0), &order);
    }

    /// Iterates the users in batches of `batch_size` rows, the last one may be smaller.
    pub fn batches(
        &self,
        batch_size: NonZeroUsize,
    ) -> impl Iterator<Item = ArrayView2<'_, f32>> {
        self.rows.axis_chunks_iter(Axis(0), batch_size.get())
    }

    /// Shuffles the users and splits them into a train and a test dataset.
    ///
    /// # Arguments
    /// * `test_ratio` - The portion of users that go into the test dataset, in `[0, 1]`.
    /// * `rng` - The random source for the shuffle.
    ///
    /// # Returns
    /// A `(train, test)` tuple or an error if the ratio is invalid.
    pub fn split<R>(self, test_ratio: f32, rng: &mut R) -> Result<(Self, Self)>
    where
        R: Rng + ?Sized,
    {
        if !(0. ..=1.).contains(&test_ratio) {
            return Err(RbmErr::InvalidConfig(format!(
                "test_ratio must be in [0, 1], got {test_ratio}"
            )));
        }

        let mut order: Vec<_> = (0..self.len()).collect();
        order.shuffle(rng);

        let ntest = (self.len() as f32 * test_ratio).round() as usize;
        let (train, test) = order.split_at(self.len() - ntest.min(self.len()));

        Ok((
            Self {
                rows: self.rows.select(Axis(0), train),
            },
            Self {
                rows: self.rows.select(Axis(0), test),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    fn tagged(users: usize) -> RatingDataset {
        // Each row is tagged by its first column so permutations can be traced.
        let rows = Array2::from_shape_fn((users, 3), |(i, j)| match j {
            0 => i as f32 / 100.,
            _ => 0.,
        });
        RatingDataset::new(rows).unwrap()
    }

    #[test]
    fn rating_vector_normalizes_known_items() {
        let v = rating_vector(5, 5., &[(1, 5.), (3, 2.5)]).unwrap();
        assert_eq!(v, array![0., 1., 0., 0.5, 0.]);
    }

    #[test]
    fn rating_vector_rejects_invalid_ratings() {
        assert_eq!(
            rating_vector(3, 5., &[(3, 1.)]),
            Err(RbmErr::ItemOutOfRange {
                item: 3,
                visible_count: 3
            })
        );
        assert_eq!(
            rating_vector(3, 5., &[(0, 6.)]),
            Err(RbmErr::InvalidRating { item: 0, rating: 6. })
        );
        assert!(rating_vector(3, 5., &[(0, 0.)]).is_err());
        assert!(rating_vector(3, 0., &[]).is_err());
    }

    #[test]
    fn from_user_ratings_builds_one_row_per_user() {
        let users: [&[(usize, f32)]; 3] = [&[(0, 4.)], &[], &[(2, 2.), (1, 1.)]];
        let ds = RatingDataset::from_user_ratings(3, 4., users).unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.visible_count(), 3);
        assert_eq!(ds.view(), array![[1., 0., 0.], [0., 0., 0.], [0., 0.25, 0.5]]);
    }

    #[test]
    fn new_rejects_unnormalized_rows() {
        assert!(RatingDataset::new(array![[0., 2.]]).is_err());
        assert!(RatingDataset::new(array![[f32::NAN, 0.]]).is_err());
    }

    #[test]
    fn batches_cover_every_row_and_the_last_one_may_be_smaller() {
        let ds = tagged(5);
        let sizes: Vec<_> = ds
            .batches(NonZeroUsize::new(2).unwrap())
            .map(|b| b.nrows())
            .collect();
        assert_eq!(sizes, [2, 2, 1]);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut ds = tagged(20);
        ds.shuffle(&mut StdRng::seed_from_u64(3));

        let mut tags: Vec<_> = ds
            .view()
            .column(0)
            .iter()
            .map(|t| (t * 100.).round() as usize)
            .collect();
        assert_ne!(tags, (0..20).collect::<Vec<_>>());

        tags.sort();
        assert_eq!(tags, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn split_follows_the_ratio() {
        let (train, test) = tagged(10).split(0.2, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);

        assert!(tagged(3).split(1.5, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn split_allows_either_side_to_be_empty() {
        let cases = [(3, 0., 3, 0), (3, 0.1, 3, 0), (3, 1., 0, 3), (5, 0.95, 0, 5)];

        for (users, ratio, ntrain, ntest) in cases {
            let (train, test) = tagged(users)
                .split(ratio, &mut StdRng::seed_from_u64(0))
                .unwrap();

            assert_eq!((train.len(), test.len()), (ntrain, ntest), "ratio = {ratio}");
            assert_eq!(train.visible_count(), 3);
            assert_eq!(test.visible_count(), 3);
        }
    }

    #[test]
    fn split_keeps_every_user_exactly_once() {
        let (train, test) = tagged(9).split(0.3, &mut StdRng::seed_from_u64(4)).unwrap();

        let mut tags: Vec<_> = train
            .view()
            .column(0)
            .iter()
            .chain(test.view().column(0).iter())
            .map(|t| (t * 100.).round() as usize)
            .collect();
        tags.sort();

        assert_eq!(tags, (0..9).collect::<Vec<_>>());
    }
}
