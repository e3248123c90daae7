//! Growable indexed container for incremental result accumulation.
//!
//! Runner subsystems build result buffers before their final size is known;
//! [`GrowableVec`] gives them amortized O(1) cursor appends plus direct
//! positional writes for callers that know indices in advance, without a
//! reallocation on every write.
//!
//! Single-owner and unsynchronized: not for concurrent writers.

/// Capacity allocated on first write.
const INITIAL_CAPACITY: usize = 8;

/// An ordered sequence with geometric growth and two addressing modes:
/// explicit positional writes ([`put`](Self::put)) and cursor-based appends
/// ([`append`](Self::append)).
///
/// Backing capacity only ever grows. [`reset`](Self::reset) rewinds the
/// cursor without clearing storage, so re-population cycles overwrite old
/// slots in place.
///
/// # Logical length vs. capacity
/// [`list`](Self::list) exposes the FULL backing storage, including
/// default-valued slots that were never written and stale slots left over
/// from before a `reset`. Callers must bound meaningful data with
/// [`index`](Self::index); do not treat `list().len()` as an element count.
///
/// # Example
/// ```rust
/// use dbprobe::vector::GrowableVec;
///
/// let mut buffer = GrowableVec::new();
/// buffer.append("a");
/// buffer.append("b");
///
/// assert_eq!(buffer.index(), 2);
/// assert_eq!(&buffer.list()[..buffer.index()], &["a", "b"]);
/// ```
#[derive(Debug, Clone)]
pub struct GrowableVec<T> {
    data: Vec<T>,
    index: usize,
}

impl<T> Default for GrowableVec<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            index: 0,
        }
    }
}

impl<T: Default + Clone> GrowableVec<T> {
    /// Creates an empty container with zero capacity; storage is allocated
    /// lazily on the first write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `item` at position `i`.
    ///
    /// This is positional assignment, not insertion: existing elements are
    /// never shifted. Writing within current capacity overwrites in place;
    /// writing beyond it grows capacity by 75% steps until `i` fits,
    /// preserving every previously written value at its original index.
    pub fn put(&mut self, i: usize, item: T) {
        if self.data.is_empty() {
            self.data = vec![T::default(); INITIAL_CAPACITY];
        }

        if i >= self.data.len() {
            let mut capacity = self.data.len();
            while i >= capacity {
                capacity += (capacity * 3) / 4;
            }
            self.data.resize(capacity, T::default());
        }

        self.data[i] = item;
    }

    /// Writes `item` at the cursor and advances the cursor.
    ///
    /// Equivalent to `put(index(), item)` followed by a cursor increment;
    /// the primary mode for sequential accumulation.
    pub fn append(&mut self, item: T) {
        self.put(self.index, item);
        self.index += 1;
    }

    /// Rewinds the cursor to zero.
    ///
    /// Backing storage and its contents are untouched; subsequent appends
    /// overwrite previously appended slots starting from index 0.
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// The full backing storage, length equal to current capacity.
    ///
    /// Includes never-written default slots and stale values beyond the
    /// cursor; pair with [`index`](Self::index) to bound meaningful data.
    pub fn list(&self) -> &[T] {
        &self.data
    }

    /// The current cursor: the count of appends since creation or the last
    /// [`reset`](Self::reset).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current backing capacity.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}
