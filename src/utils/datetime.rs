/// Serde adapter for `Option<chrono::DateTime<Utc>>` fields stored as BSON
/// datetimes. `bson::serde_helpers` only covers the non-optional case.
pub mod option_chrono_datetime_as_bson_datetime {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(bson::DateTime::from_chrono).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(Option::<bson::DateTime>::deserialize(deserializer)?.map(|value| value.to_chrono()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Record {
        #[serde(with = "super::option_chrono_datetime_as_bson_datetime")]
        updated_at: Option<chrono::DateTime<Utc>>,
    }

    #[test]
    fn round_trips_some_datetime() {
        let updated_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let document = bson::to_document(&Record {
            updated_at: Some(updated_at),
        })
        .unwrap();

        let record: Record = bson::from_document(document).unwrap();
        assert_eq!(record.updated_at, Some(updated_at));
    }

    #[test]
    fn round_trips_none_as_null() {
        let document = bson::to_document(&Record { updated_at: None }).unwrap();
        assert_eq!(document.get("updated_at"), Some(&bson::Bson::Null));

        let record: Record = bson::from_document(document).unwrap();
        assert_eq!(record.updated_at, None);
    }
}
