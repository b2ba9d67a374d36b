//! Latent consumer-mindset dimensions and their ordered states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a dimension-state enum with stable ordering and snake_case names.
macro_rules! state_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// All states in axis order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            /// State labels in axis order.
            pub const NAMES: &'static [&'static str] = &[$($label),+];

            /// Position of this state along its axis.
            pub fn index(self) -> usize {
                self as usize
            }

            pub fn from_index(i: usize) -> Option<Self> {
                Self::ALL.get(i).copied()
            }

            pub fn name(self) -> &'static str {
                Self::NAMES[self as usize]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

state_enum!(
    /// Whether the consumer currently shops the category.
    Market {
        InMarket => "in_market",
        OutOfMarket => "out_of_market",
    }
);

state_enum!(
    /// Whether a recent purchase has temporarily removed the need.
    Satiation {
        Unsatiated => "unsatiated",
        Satiated => "satiated",
    }
);

state_enum!(
    /// Purchase-funnel activity; only meaningful in-market and unsatiated.
    Activity {
        Inactive => "inactive",
        Exploration => "exploration",
        Purchase => "purchase",
    }
);

state_enum!(
    /// Opinion of the advertiser's brand, ordered from worst to best.
    Favorability {
        Unaware => "unaware",
        Unfavorable => "unfavorable",
        Neutral => "neutral",
        SomewhatFavorable => "somewhat_favorable",
        Favorable => "favorable",
    }
);

state_enum!(
    /// Brand loyalty. `Loyal` requires a `Favorable` opinion.
    Loyalty {
        Switcher => "switcher",
        Loyal => "loyal",
        CompetitorLoyal => "competitor_loyal",
    }
);

state_enum!(
    /// How easily the consumer can get hold of the brand.
    Availability {
        Low => "low",
        Average => "average",
        High => "high",
    }
);

/// The six latent axes, in the fixed axis order of the segment array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Market,
    Satiation,
    Activity,
    Favorability,
    Loyalty,
    Availability,
}

impl Dimension {
    pub const COUNT: usize = 6;
    pub const ALL: [Dimension; Dimension::COUNT] = [
        Dimension::Market,
        Dimension::Satiation,
        Dimension::Activity,
        Dimension::Favorability,
        Dimension::Loyalty,
        Dimension::Availability,
    ];

    /// Axis position in the segment array.
    pub fn axis(self) -> usize {
        self as usize
    }

    /// Number of states along this axis.
    pub fn size(self) -> usize {
        self.state_names().len()
    }

    pub fn name(self) -> &'static str {
        match self {
            Dimension::Market => "market",
            Dimension::Satiation => "satiation",
            Dimension::Activity => "activity",
            Dimension::Favorability => "favorability",
            Dimension::Loyalty => "loyalty",
            Dimension::Availability => "availability",
        }
    }

    pub fn state_names(self) -> &'static [&'static str] {
        match self {
            Dimension::Market => Market::NAMES,
            Dimension::Satiation => Satiation::NAMES,
            Dimension::Activity => Activity::NAMES,
            Dimension::Favorability => Favorability::NAMES,
            Dimension::Loyalty => Loyalty::NAMES,
            Dimension::Availability => Availability::NAMES,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
