//! Cumulative slot offsets with lazy invalidation
//!
//! Sizes are authoritative; offsets are derived on demand. Changing the size
//! of slot `i` only moves the validity watermark back to `i + 1`, and every
//! query first recomputes offsets up to the highest index it reads, so a
//! query can never observe a stale cascade.

/// Prefix offsets over a sequence of slot sizes
#[derive(Clone, Debug, Default)]
pub struct OffsetIndex {
    sizes: Vec<f64>,
    offsets: Vec<f64>,
    /// `offsets[..valid]` agree with `sizes`
    valid: usize,
}

impl OffsetIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every slot size
    pub fn rebuild(&mut self, sizes: Vec<f64>) {
        self.offsets.clear();
        self.offsets.resize(sizes.len(), 0.0);
        self.sizes = sizes;
        self.valid = 0;
    }

    pub fn clear(&mut self) {
        self.rebuild(Vec::new());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Update one slot. Returns false when the size is unchanged.
    pub fn set_size(&mut self, index: usize, size: f64) -> bool {
        let Some(current) = self.sizes.get_mut(index) else {
            return false;
        };
        if *current == size {
            return false;
        }
        *current = size;
        // offsets[index] itself depends only on earlier slots
        self.valid = self.valid.min(index + 1);
        true
    }

    #[must_use]
    pub fn size_of(&self, index: usize) -> Option<f64> {
        self.sizes.get(index).copied()
    }

    /// Exact start offset of `index`
    pub fn offset_of(&mut self, index: usize) -> Option<f64> {
        if index >= self.sizes.len() {
            return None;
        }
        self.ensure(index);
        Some(self.offsets[index])
    }

    /// Sum of all slot sizes
    pub fn total_size(&mut self) -> f64 {
        let Some(last) = self.sizes.len().checked_sub(1) else {
            return 0.0;
        };
        self.ensure(last);
        self.offsets[last] + self.sizes[last]
    }

    /// Inclusive index range of slots overlapping
    /// `[scroll - overscan*avg, scroll + height + overscan*avg]`, where `avg`
    /// is the mean slot size.
    pub fn range_for_viewport(
        &mut self,
        scroll_offset: f64,
        viewport_height: f64,
        overscan: usize,
    ) -> Option<(usize, usize)> {
        let count = self.sizes.len();
        if count == 0 {
            return None;
        }

        let total = self.total_size();
        let margin = overscan as f64 * (total / count as f64);
        let low = scroll_offset - margin;
        let high = scroll_offset + viewport_height.max(0.0) + margin;

        let first = self
            .partition(|offset, size| offset + size <= low)
            .min(count - 1);
        let last = self
            .partition(|offset, _| offset < high)
            .saturating_sub(1)
            .max(first);

        Some((first, last))
    }

    /// Fully recomputed offsets followed by the total, for comparisons
    pub fn snapshot(&mut self) -> (Vec<f64>, f64) {
        let total = self.total_size();
        (self.offsets.clone(), total)
    }

    /// First index for which `pred(offset, size)` is false.
    ///
    /// `pred` must be monotonic over the offset sequence and all offsets must
    /// already be valid.
    fn partition(&self, pred: impl Fn(f64, f64) -> bool) -> usize {
        debug_assert_eq!(self.valid, self.sizes.len());
        let (mut lo, mut hi) = (0, self.sizes.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if pred(self.offsets[mid], self.sizes[mid]) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    fn ensure(&mut self, upto: usize) {
        if upto < self.valid {
            return;
        }
        for i in self.valid..=upto {
            self.offsets[i] = match i.checked_sub(1) {
                Some(prev) => self.offsets[prev] + self.sizes[prev],
                None => 0.0,
            };
        }
        self.valid = upto + 1;
    }
}
