//! Small builders shared by the deck and duel lifecycles.

use rand::{Rng, RngCore};

/// Record ID with a kind prefix, e.g. `"DK-1A2B3C4D"` for decks, `"DU-..."` for duels.
pub fn make_record_id(prefix: &str, rng: &mut impl RngCore) -> String {
    format!("{}-{:08X}", prefix, rng.next_u32())
}

/// Fisher-Yates shuffle in place.
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Render seconds as `m:ss` for the quiz countdown.
pub fn clock_str(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
