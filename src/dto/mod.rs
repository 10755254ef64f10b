use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::dao::models::parse_timestamp;

/// Health payload.
pub mod health;
/// Standings.
pub mod leaderboard;
/// Matches and status updates.
pub mod matches;
/// Teams and captains.
pub mod team;
/// Tournaments, stages and tours.
pub mod tournament;

fn format_timestamp(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Normalize a stored date to RFC 3339, keeping the raw text when it does not parse.
fn normalize_timestamp(raw: Option<String>) -> Option<String> {
    let raw = raw.filter(|value| !value.trim().is_empty())?;
    Some(match parse_timestamp(&raw) {
        Some(time) => format_timestamp(time),
        None => raw,
    })
}
