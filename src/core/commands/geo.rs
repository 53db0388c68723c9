use bytes::Bytes;

use crate::core::command::{non_empty, Cmd};
use crate::core::reply::FromReply;
use crate::{Client, Error, Result};

/// Distance unit for GEODIST and GEORADIUS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeoUnit {
    /// Meters.
    #[default]
    M,
    /// Kilometers.
    Km,
    /// Miles.
    Mi,
    /// Feet.
    Ft,
}

impl GeoUnit {
    fn as_str(self) -> &'static str {
        match self {
            GeoUnit::M => "m",
            GeoUnit::Km => "km",
            GeoUnit::Mi => "mi",
            GeoUnit::Ft => "ft",
        }
    }
}

/// Creates a GEOADD command from `(longitude, latitude, member)` items.
pub fn geoadd<I, M>(key: impl Into<Bytes>, members: I) -> Result<Cmd>
where
    I: IntoIterator<Item = (f64, f64, M)>,
    M: Into<Bytes>,
{
    let members: Vec<(f64, f64, M)> = members.into_iter().collect();
    if members.is_empty() {
        return Err(Error::invalid_argument("GEOADD: no member specified"));
    }
    Ok(members
        .into_iter()
        .fold(Cmd::new("GEOADD").arg(key), |cmd, (lon, lat, member)| {
            cmd.arg_float(lon).arg_float(lat).arg(member)
        }))
}

/// Creates a GEODIST command.
#[inline]
pub fn geodist(
    key: impl Into<Bytes>,
    member1: impl Into<Bytes>,
    member2: impl Into<Bytes>,
    unit: GeoUnit,
) -> Cmd {
    Cmd::new("GEODIST")
        .arg(key)
        .arg(member1)
        .arg(member2)
        .arg(unit.as_str())
}

/// Creates a GEOHASH command.
pub fn geohash<I, M>(key: impl Into<Bytes>, members: I) -> Result<Cmd>
where
    I: IntoIterator<Item = M>,
    M: Into<Bytes>,
{
    Ok(Cmd::new("GEOHASH")
        .arg(key)
        .args(non_empty("GEOHASH", "member", members)?))
}

/// Creates a GEOPOS command.
pub fn geopos<I, M>(key: impl Into<Bytes>, members: I) -> Result<Cmd>
where
    I: IntoIterator<Item = M>,
    M: Into<Bytes>,
{
    Ok(Cmd::new("GEOPOS")
        .arg(key)
        .args(non_empty("GEOPOS", "member", members)?))
}

/// Creates a GEORADIUS command around `(longitude, latitude)`.
#[inline]
pub fn georadius(key: impl Into<Bytes>, center: (f64, f64), radius: f64, unit: GeoUnit) -> Cmd {
    Cmd::new("GEORADIUS")
        .arg(key)
        .arg_float(center.0)
        .arg_float(center.1)
        .arg_float(radius)
        .arg(unit.as_str())
}

impl Client {
    /// Adds positioned members. Returns how many were new.
    pub async fn geoadd<I, M>(&self, key: impl Into<Bytes>, members: I) -> Result<u64>
    where
        I: IntoIterator<Item = (f64, f64, M)>,
        M: Into<Bytes>,
    {
        self.command_as(geoadd(key, members)?).await
    }

    /// Distance between two members, `None` if either is missing.
    pub async fn geodist(
        &self,
        key: impl Into<Bytes>,
        member1: impl Into<Bytes>,
        member2: impl Into<Bytes>,
        unit: GeoUnit,
    ) -> Result<Option<f64>> {
        self.command_as(geodist(key, member1, member2, unit)).await
    }

    /// Geohash strings of the members.
    pub async fn geohash<I, M>(&self, key: impl Into<Bytes>, members: I) -> Result<Vec<Option<String>>>
    where
        I: IntoIterator<Item = M>,
        M: Into<Bytes>,
    {
        self.command_as(geohash(key, members)?).await
    }

    /// `(longitude, latitude)` of the members.
    pub async fn geopos<I, M>(
        &self,
        key: impl Into<Bytes>,
        members: I,
    ) -> Result<Vec<Option<(f64, f64)>>>
    where
        I: IntoIterator<Item = M>,
        M: Into<Bytes>,
    {
        self.command_as(geopos(key, members)?).await
    }

    /// Members within `radius` of `center`.
    pub async fn georadius<V: FromReply>(
        &self,
        key: impl Into<Bytes>,
        center: (f64, f64),
        radius: f64,
        unit: GeoUnit,
    ) -> Result<Vec<V>> {
        self.command_as(georadius(key, center, radius, unit)).await
    }
}
