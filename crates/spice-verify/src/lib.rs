//! # spice-verify
//!
//! Kani harnesses for the orderings and aggregates the search core relies
//! on. Run with `cargo kani -p spice-verify`.
//!
//! - Canonical days and meal times form a total order, and any value
//!   outside the vocabulary sorts after all of them.
//! - The mean of valid ratings is itself a valid rating.

extern crate spice_core;

#[cfg(kani)]
mod proofs {
    use spice_core::{is_valid_rating, mean_rating, Day, MealTime, RATING_MAX, RATING_MIN};

    fn any_day() -> Day {
        let index: usize = kani::any();
        kani::assume(index < Day::NAMES.len());
        Day::parse(Day::NAMES[index])
    }

    fn any_time() -> MealTime {
        let index: usize = kani::any();
        kani::assume(index < MealTime::NAMES.len());
        MealTime::parse(MealTime::NAMES[index])
    }

    fn any_rating() -> i32 {
        let rating: i32 = kani::any();
        kani::assume(is_valid_rating(rating));
        rating
    }

    /// Ordering agrees with position in the canonical sequence.
    #[kani::proof]
    fn verify_day_order_matches_rank() {
        let a = any_day();
        let b = any_day();
        assert_eq!(a.cmp(&b), a.rank().cmp(&b.rank()));
        assert!(a.is_canonical());
    }

    #[kani::proof]
    fn verify_meal_time_transitivity() {
        let a = any_time();
        let b = any_time();
        let c = any_time();
        if a <= b && b <= c {
            assert!(a <= c);
        }
    }

    /// An imported value outside the vocabulary sorts last.
    #[kani::proof]
    fn verify_other_day_sorts_last() {
        let known = any_day();
        let other = Day::Other(String::from("Holiday"));
        assert!(known < other);
        assert_eq!(other.rank(), Day::NAMES.len());
    }

    #[kani::proof]
    #[kani::unwind(5)]
    fn verify_mean_rating_stays_in_range() {
        let ratings = [any_rating(), any_rating(), any_rating()];
        let count: usize = kani::any();
        kani::assume(count >= 1 && count <= ratings.len());

        let mean = match mean_rating(ratings[..count].iter().copied()) {
            Some(mean) => mean,
            None => panic!("non-empty input has a mean"),
        };
        assert!(mean >= f64::from(RATING_MIN));
        assert!(mean <= f64::from(RATING_MAX));
    }

    #[kani::proof]
    fn verify_mean_of_nothing_is_none() {
        assert!(mean_rating(core::iter::empty()).is_none());
    }
}
