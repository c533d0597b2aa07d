// src/common/timefmt.rs

// Formato de data/hora "de fio" da API:
//   entrada  -> "YYYY-MM-DD HH:MM" (precisão de minuto)
//   saída    -> "YYYY-MM-DD HH:MM:SS"
// Internamente tudo é wall-clock local do estabelecimento (NaiveDateTime).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

pub const WIRE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";
pub const WIRE_DATETIME_MINUTE: &str = "%Y-%m-%d %H:%M";
pub const WIRE_DATE: &str = "%Y-%m-%d";
pub const WIRE_TIME: &str = "%H:%M";

/// Aceita "YYYY-MM-DD HH:MM" ou "YYYY-MM-DD HH:MM:SS" (segundos descartados).
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, WIRE_DATETIME_MINUTE) {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(raw, WIRE_DATETIME)
        .ok()
        .and_then(|dt| dt.with_second(0))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), WIRE_DATE).ok()
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), WIRE_TIME).ok()
}

/// Serde para campos `NaiveDateTime` expostos na API no formato de fio.
pub mod wire_dt {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&value.format(WIRE_DATETIME).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(de)?;
        parse_datetime(&raw).ok_or_else(|| D::Error::custom("expected YYYY-MM-DD HH:MM[:SS]"))
    }
}

/// Idem, para `Option<NaiveDateTime>`.
pub mod wire_dt_opt {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => ser.serialize_some(&dt.format(WIRE_DATETIME).to_string()),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(de)?;
        match raw {
            None => Ok(None),
            Some(raw) => parse_datetime(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom("expected YYYY-MM-DD HH:MM[:SS]")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minute_precision() {
        let dt = parse_datetime("2026-03-10 09:30").unwrap();
        assert_eq!(dt.format(WIRE_DATETIME).to_string(), "2026-03-10 09:30:00");
    }

    #[test]
    fn parse_with_seconds_keeps_minute() {
        let dt = parse_datetime("2026-03-10 09:30:45").unwrap();
        assert_eq!(dt.time().format("%H:%M:%S").to_string(), "09:30:00");
    }

    #[test]
    fn parse_garbage_is_none() {
        assert!(parse_datetime("10/03/2026 9h30").is_none());
        assert!(parse_date("2026-13-40").is_none());
        assert!(parse_time("25:99").is_none());
    }
}
