//! Bounded integer types: cart quantities and review ratings.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantity was zero or negative.
    #[error("quantity must be at least 1")]
    NotPositive,
    /// Quantity exceeded the per-line maximum.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: i32,
    },
}

/// A positive number of units on a cart or order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(i32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Largest quantity accepted on a single line.
    pub const MAX: i32 = 999;

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not in `1..=999`.
    pub const fn new(value: i32) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive);
        }
        if value > Self::MAX {
            return Err(QuantityError::TooLarge { max: Self::MAX });
        }
        Ok(Self(value))
    }

    /// The number of units.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i32::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when constructing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("rating must be between {min} and {max}", min = Rating::MIN, max = Rating::MAX)]
pub struct RatingError;

/// A review rating from one to five stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(i16);

impl Rating {
    /// Lowest rating.
    pub const MIN: i16 = 1;
    /// Highest rating.
    pub const MAX: i16 = 5;

    /// Create a rating.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError`] if `stars` is outside `1..=5`.
    pub const fn new(stars: i16) -> Result<Self, RatingError> {
        if stars < Self::MIN || stars > Self::MAX {
            return Err(RatingError);
        }
        Ok(Self(stars))
    }

    /// Number of stars.
    #[must_use]
    pub const fn stars(self) -> i16 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stars = i16::deserialize(deserializer)?;
        Self::new(stars).map_err(serde::de::Error::custom)
    }
}

macro_rules! impl_sqlx_int {
    ($name:ident, $inner:ty, $ctor:path) => {
        #[cfg(feature = "postgres")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <$inner as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <$inner as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <$inner as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok($ctor(raw)?)
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <$inner as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

impl_sqlx_int!(Quantity, i32, Quantity::new);
impl_sqlx_int!(Rating, i16, Rating::new);
