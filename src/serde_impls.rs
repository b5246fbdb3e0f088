//! `serde` support.
//!
//! Serializing forces the value. Deserializing yields a container that is
//! already set, with `T::default` as the producer used after a reset.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Lazy, SyncLazy};

impl<T, F> Serialize for Lazy<T, F>
where
    T: Serialize,
    F: Fn() -> T,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get().serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Lazy<T>
where
    T: Deserialize<'de> + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut lazy = Self::default();
        lazy.set(Some(T::deserialize(deserializer)?));
        Ok(lazy)
    }
}

impl<T, F> Serialize for SyncLazy<T, F>
where
    T: Serialize,
    F: Fn() -> T,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with(|value| value.serialize(serializer))
    }
}

impl<'de, T> Deserialize<'de> for SyncLazy<T>
where
    T: Deserialize<'de> + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let lazy = Self::default();
        lazy.set(Some(T::deserialize(deserializer)?));
        Ok(lazy)
    }
}
