// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Newtype identifiers for host objects and actors.
//!
//! The host platform identifies every object (graphic, door, page, player,
//! character) with an opaque string id. These newtypes keep the different
//! id spaces from being accidentally interchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Borrows the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(TrapId, "Identifier of a map object carrying trap/detection blocks.");
string_id!(TokenId, "Identifier of a moving token (graphic) on the map.");
string_id!(CharacterId, "Identifier of a character sheet.");
string_id!(PlayerId, "Identifier of a connected player or GM user.");
string_id!(PageId, "Identifier of a map page.");

impl TrapId {
    /// A trap is itself a graphic on the host; this borrows its id under the
    /// `TokenId` newtype for host lookups that address graphics generically.
    #[must_use]
    pub fn as_token_id(&self) -> TokenId {
        TokenId::from(self.0.clone())
    }
}
