// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UUID-backed identifiers.
//!
//! Task and event ids are 128-bit UUIDs serialised in canonical
//! 8-4-4-4-12 hex, per the wire contract. Thin newtypes keep a `TaskId`
//! from being accidentally compared with an `EventId`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.as_hyphenated())
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_uuid_id!(TaskId);
define_uuid_id!(EventId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_canonical_hex() {
        let id = TaskId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        let parsed: TaskId = text.parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn distinct_ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }
}
