use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T> {
    pub id: u64,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub const fn new(id: u64) -> Self {
        Id { id, _marker: PhantomData }
    }
}

// Manual impls so the tag type does not need to be Copy/Clone itself.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> From<u64> for Id<T> {
    fn from(id: u64) -> Self {
        Id::new(id)
    }
}

impl<T> From<Id<T>> for u64 {
    fn from(id_wrapper: Id<T>) -> Self {
        id_wrapper.id
    }
}

/// Renders the id the way OpenFlow tooling prints datapath ids: the low 48 bits
/// as dashed hex, with the upper 16 bits appended as `|n` when they are set.
impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.id.to_be_bytes();
        let mac = &bytes[2..];
        for (i, b) in mac.iter().enumerate() {
            if i > 0 {
                write!(f, "-")?;
            }
            write!(f, "{:02x}", b)?;
        }

        let upper = self.id >> 48;
        if upper != 0 {
            write!(f, "|{}", upper)?;
        }
        Ok(())
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}: {}", display_name, self)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct SwitchTag;

pub type SwitchId = Id<SwitchTag>;
