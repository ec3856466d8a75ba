//! Exclusive ownership of PWM slices
//!
//! Two drivers programming the same slice would silently clobber each
//! other's registers, so every driver claims its slice here first. Place one
//! [`SliceClaims`] in a `static` and hand it to every driver:
//!
//! ```no_run
//! use rp2040_cpwm::claims::SliceClaims;
//!
//! static PWM_CLAIMS: SliceClaims = SliceClaims::new();
//! ```

use core::cell::Cell;

use critical_section::Mutex;

use crate::slice::SliceId;
use crate::Error;

/// Registry of slices currently owned by a driver
pub struct SliceClaims {
    claimed: Mutex<Cell<u8>>,
}

impl SliceClaims {
    /// An empty registry
    pub const fn new() -> Self {
        SliceClaims {
            claimed: Mutex::new(Cell::new(0)),
        }
    }

    #[inline]
    fn mask(id: SliceId) -> u8 {
        // `SliceId` is always below `SliceId::COUNT`, which fits the bitmap
        1 << id.num()
    }

    /// Take ownership of `id`, failing if somebody else holds it
    pub fn claim(&self, id: SliceId) -> Result<(), Error> {
        let mask = Self::mask(id);
        critical_section::with(|cs| {
            let claimed = self.claimed.borrow(cs);
            if claimed.get() & mask != 0 {
                return Err(Error::ResourceConflict(id));
            }
            claimed.set(claimed.get() | mask);
            Ok(())
        })
    }

    /// Give up ownership of `id`
    pub fn release(&self, id: SliceId) {
        let mask = Self::mask(id);
        critical_section::with(|cs| {
            let claimed = self.claimed.borrow(cs);
            claimed.set(claimed.get() & !mask);
        })
    }

    /// Whether a driver currently owns `id`
    pub fn is_claimed(&self, id: SliceId) -> bool {
        let mask = Self::mask(id);
        critical_section::with(|cs| self.claimed.borrow(cs).get() & mask != 0)
    }
}

impl Default for SliceClaims {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(num: u8) -> SliceId {
        SliceId::new(num).unwrap()
    }

    #[test]
    fn second_claim_conflicts() {
        let claims = SliceClaims::new();
        let id = slice(3);
        assert_eq!(claims.claim(id), Ok(()));
        assert!(claims.is_claimed(id));
        assert_eq!(claims.claim(id), Err(Error::ResourceConflict(id)));
        assert!(!claims.is_claimed(slice(4)));
    }

    #[test]
    fn every_slice_has_its_own_claim() {
        let claims = SliceClaims::new();
        for num in 0..SliceId::COUNT {
            assert_eq!(claims.claim(slice(num)), Ok(()), "slice {}", num);
        }
        claims.release(slice(1));
        for num in 0..SliceId::COUNT {
            assert_eq!(claims.is_claimed(slice(num)), num != 1, "slice {}", num);
        }
    }

    #[test]
    fn release_frees_the_slice() {
        let claims = SliceClaims::new();
        let id = slice(7);
        claims.claim(id).unwrap();
        claims.release(id);
        assert!(!claims.is_claimed(id));
        assert_eq!(claims.claim(id), Ok(()));
    }

    #[test]
    fn upper_and_lower_bank_pins_share_claims() {
        let claims = SliceClaims::new();
        claims.claim(SliceId::for_pin(2).unwrap()).unwrap();
        assert_eq!(
            claims.claim(SliceId::for_pin(18).unwrap()),
            Err(Error::ResourceConflict(slice(1)))
        );
    }
}
