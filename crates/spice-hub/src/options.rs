//! # Dining Options Resolver
//!
//! Lists the options of one restaurant in canonical schedule order
//! (day, then meal time), optionally narrowed to one day and/or time.

use spice_core::text::selection;
use spice_core::{Day, DiningOption, MealTime, RestaurantId};

use crate::error::SpiceResult;
use crate::store::{EntityStore, SlotFilter};

/// Options of `restaurant`, filtered by `day` and `time`.
///
/// `None`, blank, or `All` leave that dimension unconstrained. An absent
/// restaurant id yields an empty list.
pub async fn options_for(
    store: &EntityStore,
    restaurant: Option<RestaurantId>,
    day: Option<&str>,
    time: Option<&str>,
) -> SpiceResult<Vec<DiningOption>> {
    let Some(id) = restaurant else {
        return Ok(Vec::new());
    };

    let slot = SlotFilter {
        day: selection(day).map(Day::parse),
        time: selection(time).map(MealTime::parse),
    };

    let mut options = store.options_for(id, &slot).await?;
    options.sort_by(DiningOption::schedule_cmp);
    Ok(options)
}
