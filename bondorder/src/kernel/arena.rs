use crate::Error;

/// Returned by [`Arena::push`] when the arena is full and needs to grow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaFull;

/// Contiguous growable buffer with an explicit capacity.
///
/// Entries are addressed by their integer index. The capacity only changes
/// through [`Arena::start`] and [`Arena::grow`], and never shrinks. Growth
/// doubles the capacity, and is limited both by a hard maximum number of
/// entries and by a maximal number of doubling steps per calculation.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    name: &'static str,
    data: Vec<T>,
    capacity: usize,
    maximum: usize,
    growth_steps: usize,
    max_growth_steps: usize,
}

impl<T> Arena<T> {
    pub fn new(name: &'static str) -> Arena<T> {
        Arena {
            name: name,
            data: Vec::new(),
            capacity: 0,
            maximum: usize::MAX,
            growth_steps: 0,
            max_growth_steps: usize::MAX,
        }
    }

    /// Prepare the arena for a new calculation: remove all entries, make sure
    /// the capacity is at least `initial` (within the hard `maximum`), and
    /// reset the growth budget to `max_growth_steps`
    pub fn start(&mut self, initial: usize, maximum: usize, max_growth_steps: usize) {
        self.data.clear();
        self.maximum = maximum;
        self.growth_steps = 0;
        self.max_growth_steps = max_growth_steps;
        self.reserve(initial);
    }

    /// Remove all entries, keeping the capacity
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Current capacity of the arena
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries that can be stored without growing, accounting for
    /// the hard maximum of the current calculation
    fn available_capacity(&self) -> usize {
        usize::min(self.capacity, self.maximum)
    }

    fn reserve(&mut self, capacity: usize) {
        let capacity = usize::min(capacity, self.maximum);
        if capacity > self.capacity {
            self.data.reserve_exact(capacity - self.data.len());
            self.capacity = capacity;
        }
    }

    /// Double the capacity until it can hold at least `required` entries
    pub fn grow(&mut self, required: usize) -> Result<(), Error> {
        if required > self.maximum {
            return Err(Error::CapacityExceeded {
                buffer: self.name,
                requested: required,
                maximum: self.maximum,
                growth_steps: None,
            });
        }

        while self.available_capacity() < required {
            if self.growth_steps >= self.max_growth_steps {
                return Err(Error::CapacityExceeded {
                    buffer: self.name,
                    requested: required,
                    maximum: self.capacity,
                    growth_steps: Some(self.growth_steps),
                });
            }
            self.growth_steps += 1;

            let new_capacity = usize::max(2 * self.capacity, 1);
            log::debug!(
                "growing {} buffer from {} to {} entries",
                self.name, self.capacity, usize::min(new_capacity, self.maximum)
            );
            self.reserve(new_capacity);
        }

        return Ok(());
    }

    /// Add a new entry at the end of the arena, if there is space left for it
    pub fn push(&mut self, value: T) -> Result<(), ArenaFull> {
        if self.data.len() >= self.available_capacity() {
            return Err(ArenaFull);
        }
        self.data.push(value);
        return Ok(());
    }
}

impl<T> std::ops::Deref for Arena<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> std::ops::DerefMut for Arena<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}
