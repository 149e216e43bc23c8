use derive_more::Display;

/// Value outside of the known variants of a text enum.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
#[display(fmt = "Invalid {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl std::error::Error for UnknownVariant {}

/// Enum persisted as TEXT and exchanged as a lowercase string.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant { kind: $kind, value: s.into() }),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

text_enum! {
    Role, "role" {
        Customer => "customer",
        Producer => "producer",
        Admin => "admin",
    }
}

text_enum! {
    ProducerStatus, "producer status" {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Suspended => "suspended",
    }
}

text_enum! {
    /// Lifecycle of an order, from checkout to delivery.
    OrderStatus, "status" {
        New => "new",
        Accepted => "accepted",
        Preparing => "preparing",
        Ready => "ready",
        Dispatched => "dispatched",
        Delivered => "delivered",
        Canceled => "canceled",
    }
}

impl OrderStatus {
    /// Orders a kitchen is still working on.
    pub const ACTIVE: &'static [OrderStatus] = &[
        OrderStatus::New,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Dispatched,
    ];
}

text_enum! {
    PaymentStatus, "payment status" {
        Pending => "pending",
        Paid => "paid",
        Refunded => "refunded",
        Failed => "failed",
    }
}

text_enum! {
    DietaryType, "dietary preference" {
        Veg => "veg",
        NonVeg => "non-veg",
        Vegan => "vegan",
    }
}

text_enum! {
    SpiceLevel, "spice level" {
        Mild => "mild",
        Medium => "medium",
        Hot => "hot",
    }
}

text_enum! {
    BudgetPreference, "budget preference" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn text_round_trip() {
        assert_eq!("non-veg".parse::<DietaryType>(), Ok(DietaryType::NonVeg));
        assert_eq!(OrderStatus::Dispatched.to_string(), "dispatched");
        assert_eq!(
            serde_json::to_string(&Role::Producer).unwrap(),
            "\"producer\""
        );
        assert_eq!(
            serde_json::from_str::<PaymentStatus>("\"refunded\"").unwrap(),
            PaymentStatus::Refunded
        );
    }

    #[test]
    fn unknown_variant() {
        let err = "chef".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid role: \"chef\"");
        assert!(serde_json::from_str::<SpiceLevel>("\"extreme\"").is_err());
        assert!("Hot".parse::<SpiceLevel>().is_err());
    }
}
