//! Retention status attached to every tree node.
//!
//! A status is a keep/remove flag stamped with the priority layer that set
//! it. Three layers exist, in strictly increasing priority: the mode default,
//! the include/exclude options, and the sample rules. A status can only be
//! overwritten by a status from the same or a higher layer, so "sample always
//! wins, option beats default" without tracking which rule wrote it.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Priority layer of a [`RetentionStatus`].
///
/// Derived `Ord` gives `Default < Option < Sample`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Implicit status assigned by the processing mode.
    Default,
    /// Status assigned by an include/exclude rule.
    Option,
    /// Status assigned by a sample rule.
    Sample,
}

/// A keep/remove flag plus the [`Layer`] that set it.
///
/// # Examples
///
/// ```
/// use json_sift::RetentionStatus;
///
/// let mut status = RetentionStatus::remove_default();
/// assert!(status.try_update(RetentionStatus::keep_option()));
/// // A weaker layer cannot overwrite a stronger one.
/// assert!(!status.try_update(RetentionStatus::remove_default()));
/// assert!(status.is_keep());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionStatus {
    layer: Layer,
    keep: bool,
}

impl RetentionStatus {
    /// KEEP at the default layer.
    #[inline]
    pub fn keep_default() -> Self {
        Self {
            layer: Layer::Default,
            keep: true,
        }
    }

    /// REMOVE at the default layer.
    #[inline]
    pub fn remove_default() -> Self {
        Self {
            layer: Layer::Default,
            keep: false,
        }
    }

    /// KEEP at the option layer.
    #[inline]
    pub fn keep_option() -> Self {
        Self {
            layer: Layer::Option,
            keep: true,
        }
    }

    /// REMOVE at the option layer.
    #[inline]
    pub fn remove_option() -> Self {
        Self {
            layer: Layer::Option,
            keep: false,
        }
    }

    /// KEEP at the sample layer.
    #[inline]
    pub fn keep_sample() -> Self {
        Self {
            layer: Layer::Sample,
            keep: true,
        }
    }

    /// REMOVE at the sample layer.
    #[inline]
    pub fn remove_sample() -> Self {
        Self {
            layer: Layer::Sample,
            keep: false,
        }
    }

    /// Whether this status keeps the node in the output.
    #[inline]
    pub fn is_keep(&self) -> bool {
        self.keep
    }

    /// The layer this status was set at.
    #[inline]
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Compare the priority of two statuses.
    ///
    /// Only the layer participates: equal layers are `Equal` regardless of
    /// the keep flag, a higher layer is `Greater`.
    #[inline]
    pub fn advantage(&self, other: &RetentionStatus) -> Ordering {
        self.layer.cmp(&other.layer)
    }

    /// Overwrite this status with `other` unless `other` is strictly weaker.
    ///
    /// Equal-layer updates always succeed, so the flag can flip within a
    /// layer (rules of one stage are co-equal and the last write wins).
    ///
    /// Returns `true` if the update was applied.
    pub fn try_update(&mut self, other: RetentionStatus) -> bool {
        if self.advantage(&other) == Ordering::Greater {
            return false;
        }
        *self = other;
        true
    }
}
