//! # Canonical Schedule Ordering
//!
//! Days and meal times are small closed vocabularies with a fixed order
//! (Monday..Sunday, Brunch < Lunch < Dinner). Imported data may still carry
//! a value outside the vocabulary; it is kept verbatim as `Other` and sorts
//! after every canonical value.

use core::cmp::Ordering;
use core::fmt;

use serde::{Deserialize, Serialize};

macro_rules! canonical_slot {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// A value outside the canonical sequence, kept verbatim.
            Other(String),
        }

        impl $name {
            /// Canonical spellings, in canonical order.
            pub const NAMES: &'static [&'static str] = &[$(stringify!($variant)),+];

            /// Parse a value, matching canonical names case-insensitively.
            pub fn parse(raw: &str) -> Self {
                let trimmed = raw.trim();
                $(
                    if trimmed.eq_ignore_ascii_case(stringify!($variant)) {
                        return Self::$variant;
                    }
                )+
                Self::Other(trimmed.to_string())
            }

            /// Every canonical value, in canonical order.
            pub fn canonical() -> impl Iterator<Item = Self> {
                Self::NAMES.iter().map(|name| Self::parse(name))
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                    Self::Other(raw) => raw,
                }
            }

            pub fn is_canonical(&self) -> bool {
                !matches!(self, Self::Other(_))
            }

            /// Position in the canonical sequence; `Other` ranks last.
            #[inline]
            pub fn rank(&self) -> usize {
                match self {
                    Self::Other(_) => Self::NAMES.len(),
                    known => Self::NAMES
                        .iter()
                        .position(|name| *name == known.as_str())
                        .unwrap_or(Self::NAMES.len()),
                }
            }
        }

        impl Ord for $name {
            #[inline]
            fn cmp(&self, other: &Self) -> Ordering {
                self.rank()
                    .cmp(&other.rank())
                    .then_with(|| self.as_str().cmp(other.as_str()))
            }
        }

        impl PartialOrd for $name {
            #[inline]
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::parse(&raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::parse(raw)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(raw) => raw,
                    known => known.as_str().to_string(),
                }
            }
        }
    };
}

canonical_slot! {
    /// Day of the week a dining option is offered.
    Day { Monday, Tuesday, Wednesday, Thursday, Friday, Saturday, Sunday }
}

canonical_slot! {
    /// Meal service a dining option belongs to.
    MealTime { Brunch, Lunch, Dinner }
}
