// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Readings delivered by the location provider.
//!
//! These types are carried through the library without interpretation.
//! No geodesy is performed on them.

use std::fmt;

use chrono::{DateTime, Utc};

/// A WGS84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// A positional reading with the time it was taken.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use locmux::types::{Coordinate, LocationSample};
///
/// let taken_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
/// let sample = LocationSample::new(Coordinate::new(50.08, 14.42), taken_at)
///     .with_horizontal_accuracy(5.0);
///
/// assert_eq!(sample.horizontal_accuracy, Some(5.0));
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LocationSample {
    /// Where the reading was taken.
    pub coordinate: Coordinate,
    /// Altitude in meters, if known.
    pub altitude: Option<f64>,
    /// Radius of uncertainty in meters, if known.
    pub horizontal_accuracy: Option<f64>,
    /// Ground speed in meters per second, if known.
    pub speed: Option<f64>,
    /// When the reading was taken.
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    /// Creates a sample with only a coordinate and timestamp.
    #[must_use]
    pub const fn new(coordinate: Coordinate, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            altitude: None,
            horizontal_accuracy: None,
            speed: None,
            timestamp,
        }
    }

    /// Sets the altitude.
    #[must_use]
    pub const fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Sets the horizontal accuracy.
    #[must_use]
    pub const fn with_horizontal_accuracy(mut self, accuracy: f64) -> Self {
        self.horizontal_accuracy = Some(accuracy);
        self
    }

    /// Sets the ground speed.
    #[must_use]
    pub const fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }
}

/// A compass reading.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Heading {
    /// Heading relative to magnetic north, in degrees.
    pub magnetic: f64,
    /// Heading relative to true north, in degrees, if available.
    pub true_heading: Option<f64>,
    /// Maximum deviation in degrees.
    pub accuracy: f64,
    /// When the reading was taken.
    pub timestamp: DateTime<Utc>,
}

/// A place the user stayed at.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Visit {
    /// Center of the visited place.
    pub coordinate: Coordinate,
    /// Radius of uncertainty in meters.
    pub horizontal_accuracy: f64,
    /// Arrival time, if known.
    pub arrival: Option<DateTime<Utc>>,
    /// Departure time, or `None` while the visit is ongoing.
    pub departure: Option<DateTime<Utc>>,
}

/// Caller-chosen identifier of a monitored region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct RegionId(String);

impl RegionId {
    /// Creates a region identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RegionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A circular geofence.
///
/// # Examples
///
/// ```
/// use locmux::types::{Coordinate, Region};
///
/// let office = Region::circle("office", Coordinate::new(50.08, 14.42), 150.0);
/// assert_eq!(office.id.as_str(), "office");
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Region {
    /// Identifier reported back in [`RegionEvent`]s.
    pub id: RegionId,
    /// Center of the fence.
    pub center: Coordinate,
    /// Radius in meters.
    pub radius: f64,
}

impl Region {
    /// Creates a circular region.
    #[must_use]
    pub fn circle(id: impl Into<String>, center: Coordinate, radius: f64) -> Self {
        Self {
            id: RegionId::new(id),
            center,
            radius,
        }
    }
}

/// A geofence transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RegionEvent {
    /// The device entered the region.
    Enter(RegionId),
    /// The device left the region.
    Exit(RegionId),
}

impl RegionEvent {
    /// Returns the region this event refers to.
    #[must_use]
    pub fn region_id(&self) -> &RegionId {
        match self {
            Self::Enter(id) | Self::Exit(id) => id,
        }
    }

    /// Returns true for an entry transition.
    #[must_use]
    pub fn is_enter(&self) -> bool {
        matches!(self, Self::Enter(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn coordinate_display() {
        assert_eq!(Coordinate::new(1.5, -2.25).to_string(), "1.5,-2.25");
    }

    #[test]
    fn sample_builder() {
        let sample = LocationSample::new(Coordinate::new(0.0, 0.0), at(10))
            .with_altitude(200.0)
            .with_speed(1.2);

        assert_eq!(sample.altitude, Some(200.0));
        assert_eq!(sample.speed, Some(1.2));
        assert_eq!(sample.horizontal_accuracy, None);
        assert_eq!(sample.timestamp, at(10));
    }

    #[test]
    fn region_event_accessors() {
        let enter = RegionEvent::Enter(RegionId::from("home"));
        let exit = RegionEvent::Exit(RegionId::from("home"));

        assert!(enter.is_enter());
        assert!(!exit.is_enter());
        assert_eq!(exit.region_id().as_str(), "home");
    }

    #[test]
    fn sample_serializes_timestamp() {
        let sample = LocationSample::new(Coordinate::new(1.0, 2.0), at(0));
        let json = serde_json::to_value(&sample).unwrap();

        assert_eq!(json["coordinate"]["latitude"], 1.0);
        assert_eq!(json["timestamp"], "1970-01-01T00:00:00Z");
    }
}
