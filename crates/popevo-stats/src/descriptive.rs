use serde::Serialize;

/// Summary of a sample of rewards or fitness scores.
///
/// Variance is the population variance (divided by `count`, not
/// `count - 1`): the sample is always the whole generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub min: f32,
    pub max: f32,
    pub sum: f32,
    pub mean: f32,
    /// Middle value; the average of the two middle values for even counts.
    pub median: f32,
    pub variance: f32,
    pub std_dev: f32,
    /// `std_dev / (max - min)`, or 0 when every value is the same.
    pub normalized_std_dev: f32,
}

impl DescriptiveStats {
    /// Summarizes `values`, returning `None` for an empty sample.
    ///
    /// ```
    /// # use popevo_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::new([5.0, 2.0, 4.0, 1.0, 3.0]).unwrap();
    /// assert_eq!((stats.min, stats.max), (1.0, 5.0));
    /// assert_eq!(stats.sum, 15.0);
    /// assert_eq!(stats.median, 3.0);
    ///
    /// assert!(DescriptiveStats::new(std::iter::empty()).is_none());
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f32>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f32::total_cmp);
        Self::from_sorted(&values)
    }

    /// Summarizes a sample that is already in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `sorted` is not in ascending order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted: &[f32]) -> Option<Self> {
        assert!(
            sorted.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );
        let (&min, &max) = (sorted.first()?, sorted.last()?);

        let count = sorted.len();
        let n = count as f32;
        let sum = sorted.iter().sum::<f32>();
        let mean = sum / n;
        let mid = count / 2;
        let median = if count % 2 == 0 {
            f32::midpoint(sorted[mid - 1], sorted[mid])
        } else {
            sorted[mid]
        };
        let variance = sorted.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
        let std_dev = variance.sqrt();
        let spread = max - min;
        let normalized_std_dev = if spread > mean.abs() * f32::EPSILON {
            std_dev / spread
        } else {
            0.0
        };

        Some(Self {
            count,
            min,
            max,
            sum,
            mean,
            median,
            variance,
            std_dev,
            normalized_std_dev,
        })
    }
}
