//! Event vectors and stored event records.

use crate::aggregate::AggregateValue;
use crate::system_profile::SystemProfile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered, fixed-arity sequence of non-negative event codes.
///
/// The position of each code is semantically significant: position `i` is the
/// value of dimension `i` of the metric the event was logged for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventVector(Vec<u32>);

impl EventVector {
    pub fn new(codes: Vec<u32>) -> Self {
        Self(codes)
    }

    pub fn codes(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u32>> for EventVector {
    fn from(codes: Vec<u32>) -> Self {
        Self(codes)
    }
}

impl fmt::Display for EventVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, code) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{code}")?;
        }
        write!(f, ")")
    }
}

/// One aggregate-store row read back for observation generation: the system
/// profile active when the events were logged, the event vector, and the
/// value accumulated for it over one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub system_profile: SystemProfile,
    pub event_vector: EventVector,
    pub aggregate_value: AggregateValue,
}

impl EventRecord {
    pub fn new(
        system_profile: SystemProfile,
        event_vector: EventVector,
        aggregate_value: AggregateValue,
    ) -> Self {
        Self {
            system_profile,
            event_vector,
            aggregate_value,
        }
    }
}
