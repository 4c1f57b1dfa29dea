//! Listing categories derived from the URL path.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Marketplace section a listing belongs to.
///
/// The declaration order is the order used when grouping reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Realestate,
    Mobility,
    Recommerce,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Realestate, Category::Mobility, Category::Recommerce];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Realestate => "realestate",
            Category::Mobility => "mobility",
            Category::Recommerce => "recommerce",
        }
    }

    fn path_marker(self) -> &'static str {
        match self {
            Category::Realestate => "/realestate/",
            Category::Mobility => "/mobility/",
            Category::Recommerce => "/recommerce/",
        }
    }

    /// Detect the category from a URL or URL path.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownCategory` when no category marker is present.
    pub fn detect(url: &str) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|category| url.contains(category.path_marker()))
            .ok_or_else(|| Error::UnknownCategory(url.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}
