//! Resolution of nightly build tags.
//!
//! A nightly token is either `latest`, meaning yesterday's build, or a
//! calendar date written as `2020-01-02` or `20200102`. Anything else
//! resolves to no tag, and the reset that depends on it is skipped.

use std::fmt;

use chrono::NaiveDate;

/// Token that selects yesterday's nightly build.
pub const LATEST_TOKEN: &str = "latest";

const COMPACT_LAYOUT: &str = "%Y%m%d";
const ACCEPTED_LAYOUTS: [&str; 2] = ["%Y-%m-%d", COMPACT_LAYOUT];

/// A resolved nightly build date.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NightlyTag {
    date: NaiveDate,
}

impl NightlyTag {
    /// Creates a tag for the build of `date`.
    #[must_use]
    pub const fn for_date(date: NaiveDate) -> Self {
        Self { date }
    }

    /// The build date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// The build date in compact `YYYYMMDD` form.
    #[must_use]
    pub fn compact_date(&self) -> String {
        self.date.format(COMPACT_LAYOUT).to_string()
    }

    /// The image tag, `nightly-YYYYMMDD`.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("nightly-{}", self.compact_date())
    }
}

impl fmt::Display for NightlyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// Resolves `token` relative to `today`.
///
/// Returns `None` for a blank or unparseable token, and for `latest` when
/// `today` has no predecessor.
#[must_use]
pub fn resolve(token: &str, today: NaiveDate) -> Option<NightlyTag> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == LATEST_TOKEN {
        return today.pred_opt().map(NightlyTag::for_date);
    }

    ACCEPTED_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(trimmed, layout).ok())
        .map(NightlyTag::for_date)
}
