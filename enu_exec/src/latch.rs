//! # Latch
//!
//! A value which starts unset and may be set exactly once. Used for state which is established
//! during operation and then fixed for the rest of the process, such as the datum.

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Latch<T> {
    Unset,
    Set(T),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T> Default for Latch<T> {
    fn default() -> Self {
        Latch::Unset
    }
}

impl<T> Latch<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Latch::Set(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Latch::Set(v) => Some(v),
            Latch::Unset => None,
        }
    }

    /// Set the latch.
    ///
    /// If the latch is already set it is left unchanged and `value` is handed back as the error.
    pub fn set(&mut self, value: T) -> Result<(), T> {
        match self {
            Latch::Set(_) => Err(value),
            Latch::Unset => {
                *self = Latch::Set(value);
                Ok(())
            }
        }
    }
}

impl<T: Copy> Latch<T> {
    /// Get the value, setting it to the output of `f` first if the latch is unset.
    pub fn get_or_set_with<F>(&mut self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        match *self {
            Latch::Set(v) => v,
            Latch::Unset => {
                let v = f();
                *self = Latch::Set(v);
                v
            }
        }
    }

    /// Get the value, attempting to set it with `f` first if the latch is unset.
    ///
    /// A failed attempt leaves the latch unset, so a later call will try again.
    pub fn get_or_try_set_with<F, E>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        match *self {
            Latch::Set(v) => Ok(v),
            Latch::Unset => {
                let v = f()?;
                *self = Latch::Set(v);
                Ok(v)
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
