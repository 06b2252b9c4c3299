use chrono::{DateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer};

/// Teamwork APIから返される1日分の記録時間。
///
/// APIでは`["<epoch millis>", "<hours>", "<minutes>"]`という文字列の配列で表現される。
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub epoch: DateTime<Utc>,
    pub hours: f64,
    pub minutes: u64,
}

impl<'de> Deserialize<'de> for TimeEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [epoch, hours, minutes] = <[String; 3]>::deserialize(deserializer)?;

        Ok(Self {
            epoch: parse_epoch_millis(&epoch).map_err(de::Error::custom)?,
            hours: hours
                .parse()
                .map_err(|e| de::Error::custom(format!("invalid hours '{}': {}", hours, e)))?,
            minutes: minutes
                .parse()
                .map_err(|e| de::Error::custom(format!("invalid minutes '{}': {}", minutes, e)))?,
        })
    }
}

/// 文字列で表現されたミリ秒単位のepochをデシリアライズする。
pub fn deserialize_epoch_millis<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_epoch_millis(&s).map_err(de::Error::custom)
}

/// ミリ秒単位のepochを秒単位に切り捨てて`DateTime<Utc>`に変換する。
fn parse_epoch_millis(s: &str) -> Result<DateTime<Utc>, String> {
    let millis: i64 = s
        .parse()
        .map_err(|e| format!("invalid epoch '{}': {}", s, e))?;

    Utc.timestamp_opt(millis.div_euclid(1000), 0)
        .single()
        .ok_or_else(|| format!("epoch out of range: {}", s))
}
