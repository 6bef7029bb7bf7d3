//! Room key definitions and parsing.
//!
//! A room key is a deterministic function of its inputs, so two sessions
//! that compute the key independently always meet in the same room.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use wastehub_core::error::AppError;
use wastehub_core::result::AppResult;
use wastehub_core::types::{TaskId, UserId};
use wastehub_entity::user::UserRole;

/// Largest supported number of decimals for area buckets.
const MAX_PRECISION: u32 = 6;

/// Keeps a coordinate that is exactly on a bucket edge from drifting into
/// the next bucket toward zero through binary rounding.
const EDGE_EPSILON: f64 = 1e-9;

/// Typed room identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomId {
    /// Every session of one role.
    Role(UserRole),
    /// One grid cell. Buckets are coordinates scaled by `10^precision`.
    Area {
        /// Latitude bucket.
        lat: i64,
        /// Longitude bucket.
        lng: i64,
        /// Decimals kept.
        precision: u32,
    },
    /// Direct messages between two users, stored as a sorted pair.
    Dm(UserId, UserId),
    /// Updates about one task.
    Task(TaskId),
    /// One user's personal feed.
    User(UserId),
}

impl RoomId {
    /// Build a DM room; argument order does not matter.
    pub fn dm(a: UserId, b: UserId) -> Self {
        if a <= b { Self::Dm(a, b) } else { Self::Dm(b, a) }
    }

    /// Parse a room key, re-bucketing area rooms onto `grid`.
    pub fn parse(key: &str, grid: &AreaGrid) -> AppResult<Self> {
        let (kind, rest) = key
            .split_once(':')
            .ok_or_else(|| invalid_room(key))?;
        match kind {
            "role" => rest
                .parse::<UserRole>()
                .map(Self::Role)
                .map_err(|_| invalid_room(key)),
            "area" => {
                let (lat, lng) = rest.split_once(',').ok_or_else(|| invalid_room(key))?;
                let lat = lat.trim().parse::<f64>().map_err(|_| invalid_room(key))?;
                let lng = lng.trim().parse::<f64>().map_err(|_| invalid_room(key))?;
                grid.room_for(lat, lng)
            }
            "dm" => {
                let (a, b) = rest.split_once(':').ok_or_else(|| invalid_room(key))?;
                let a = a.parse::<UserId>().map_err(|_| invalid_room(key))?;
                let b = b.parse::<UserId>().map_err(|_| invalid_room(key))?;
                if a == b {
                    return Err(AppError::validation("A direct message room needs two different users"));
                }
                Ok(Self::dm(a, b))
            }
            "task" => rest
                .parse::<TaskId>()
                .map(Self::Task)
                .map_err(|_| invalid_room(key)),
            "user" => rest
                .parse::<UserId>()
                .map(Self::User)
                .map_err(|_| invalid_room(key)),
            _ => Err(invalid_room(key)),
        }
    }

    /// Whether chat messages may be posted to this room.
    pub fn accepts_chat(&self) -> bool {
        !matches!(self, Self::User(_))
    }

    /// Short kind label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Role(_) => "role",
            Self::Area { .. } => "area",
            Self::Dm(..) => "dm",
            Self::Task(_) => "task",
            Self::User(_) => "user",
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role(role) => write!(f, "role:{role}"),
            Self::Area {
                lat,
                lng,
                precision,
            } => write!(
                f,
                "area:{},{}",
                format_bucket(*lat, *precision),
                format_bucket(*lng, *precision)
            ),
            Self::Dm(a, b) => write!(f, "dm:{a}:{b}"),
            Self::Task(id) => write!(f, "task:{id}"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

impl Serialize for RoomId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn invalid_room(key: &str) -> AppError {
    AppError::validation(format!(
        "Invalid room '{key}'. Expected role:<role>, area:<lat>,<lng>, dm:<user>:<user>, task:<id>, or user:<id>"
    ))
}

/// Render a scaled bucket with exactly `precision` decimals.
///
/// Integer arithmetic keeps the key stable across platforms.
fn format_bucket(bucket: i64, precision: u32) -> String {
    if precision == 0 {
        return bucket.to_string();
    }
    let scale = 10_i64.pow(precision);
    let sign = if bucket < 0 { "-" } else { "" };
    let abs = bucket.unsigned_abs();
    let scale = scale.unsigned_abs();
    format!(
        "{sign}{}.{:0width$}",
        abs / scale,
        abs % scale,
        width = precision as usize
    )
}

/// Buckets coordinates into area rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaGrid {
    precision: u32,
}

impl AreaGrid {
    /// Grid keeping `precision` decimals (2 is roughly 1.1 km).
    pub fn new(precision: u32) -> Self {
        Self {
            precision: precision.min(MAX_PRECISION),
        }
    }

    /// Decimals kept.
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// The area room containing a point. Coordinates are truncated toward
    /// zero, so `-74.0060` and `74.0060` both land on `74.00` in magnitude.
    pub fn room_for(&self, latitude: f64, longitude: f64) -> AppResult<RoomId> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::validation(format!("Latitude {latitude} is out of range")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::validation(format!("Longitude {longitude} is out of range")));
        }
        Ok(RoomId::Area {
            lat: self.bucket(latitude),
            lng: self.bucket(longitude),
            precision: self.precision,
        })
    }

    fn bucket(&self, value: f64) -> i64 {
        let scale = 10_f64.powi(self.precision as i32);
        (value * scale + EDGE_EPSILON.copysign(value)).trunc() as i64
    }
}

impl Default for AreaGrid {
    fn default() -> Self {
        Self::new(2)
    }
}

impl FromStr for AreaGrid {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map(Self::new)
            .map_err(|_| AppError::validation(format!("Invalid area precision '{s}'")))
    }
}
