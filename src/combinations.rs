// Lazy Cartesian product over capacity buckets

// One item per bucket, depth-first: the last bucket varies fastest.
// Zero buckets yield a single empty combination; any empty bucket yields none.
pub struct CartesianProduct<'a, T> {
    buckets: &'a [Vec<T>],
    indices: Vec<usize>,
    exhausted: bool,
}

impl<'a, T> CartesianProduct<'a, T> {
    pub fn new(buckets: &'a [Vec<T>]) -> Self {
        Self {
            buckets,
            indices: vec![0; buckets.len()],
            exhausted: buckets.iter().any(Vec::is_empty),
        }
    }

    // n1 * n2 * ... * nk, saturating
    pub fn len_hint(&self) -> usize {
        self.buckets
            .iter()
            .fold(1usize, |acc, bucket| acc.saturating_mul(bucket.len()))
    }

    // Odometer step; returns false once every position has rolled over
    fn advance(&mut self) -> bool {
        for position in (0..self.indices.len()).rev() {
            self.indices[position] += 1;
            if self.indices[position] < self.buckets[position].len() {
                return true;
            }
            self.indices[position] = 0;
        }
        false
    }
}

impl<'a, T> Iterator for CartesianProduct<'a, T> {
    type Item = Vec<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let buckets = self.buckets;
        let combination = self
            .indices
            .iter()
            .zip(buckets)
            .map(|(&index, bucket)| &bucket[index])
            .collect();

        if !self.advance() {
            self.exhausted = true;
        }

        Some(combination)
    }
}
