//! Coupon code generation.
//!
//! Codes are `HASH-` followed by six symbols from a 36-character uppercase
//! alphanumeric alphabet (36^6 ≈ 2.2 billion combinations). Uniqueness is
//! enforced by checking the store before accepting a code and regenerating
//! on collision.

use rand::Rng;
use tracing::debug;

use patron_core::constants::{CODE_ALPHABET, CODE_PREFIX, CODE_SUFFIX_LEN};
use patron_core::error::StoreError;
use patron_core::traits::CouponStore;

/// Attempts before giving up on finding an unused code. At any plausible
/// coupon volume a single attempt virtually always succeeds.
const MAX_CODE_ATTEMPTS: usize = 32;

/// Generate a candidate coupon code, e.g. `HASH-7QX41A`.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut code = String::with_capacity(CODE_PREFIX.len() + CODE_SUFFIX_LEN);
    code.push_str(CODE_PREFIX);
    for _ in 0..CODE_SUFFIX_LEN {
        let idx = rng.gen_range(0..CODE_ALPHABET.len());
        code.push(CODE_ALPHABET[idx] as char);
    }
    code
}

/// Generate a code that is not yet present in the store.
///
/// Regenerates on collision, up to [`MAX_CODE_ATTEMPTS`] times.
pub fn unique_code<R: Rng + ?Sized>(
    store: &dyn CouponStore,
    rng: &mut R,
) -> Result<String, StoreError> {
    for attempt in 0..MAX_CODE_ATTEMPTS {
        let code = generate_code(rng);
        if !store.code_exists(&code)? {
            if attempt > 0 {
                debug!(attempt, "coupon: code collision resolved by regeneration");
            }
            return Ok(code);
        }
    }

    Err(StoreError::Internal(format!(
        "no unused coupon code after {MAX_CODE_ATTEMPTS} attempts"
    )))
}
