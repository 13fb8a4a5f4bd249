pub mod achievement;
pub mod assessment;
pub mod goal;
pub mod invitation;
pub mod organization;
pub mod profile;

pub use achievement::{Achievement, UnlockView, UserAchievement};
pub use goal::{Goal, GoalStatus, GoalView};
pub use invitation::Invitation;
pub use organization::Organization;
pub use profile::{Profile, ProfileStatus};

use sqlx::{postgres::PgRow, Row};
use std::str::FromStr;

/// Decode a TEXT column into an enum that parses from its string form
pub(crate) fn decode_text<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: e.into(),
    })
}

/// Same as [`decode_text`] for nullable columns
pub(crate) fn decode_text_opt<T>(row: &PgRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr<Err = String>,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        s.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: e.into(),
        })
    })
    .transpose()
}
