use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &u32, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum U32Input {
        String(String),
        Number(u32),
    }

    match U32Input::deserialize(deserializer)? {
        U32Input::String(raw) => raw.parse::<u32>().map_err(D::Error::custom),
        U32Input::Number(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Wrapper {
        #[serde(with = "super")]
        seed: u32,
    }

    #[test]
    fn deserialize_accepts_string() {
        let parsed: Wrapper = serde_json::from_str(r#"{"seed":"12345"}"#).expect("string seed");
        assert_eq!(parsed, Wrapper { seed: 12345 });
    }

    #[test]
    fn deserialize_accepts_number() {
        let parsed: Wrapper = serde_json::from_str(r#"{"seed":12345}"#).expect("number seed");
        assert_eq!(parsed, Wrapper { seed: 12345 });
    }

    #[test]
    fn serialize_emits_string() {
        let rendered = serde_json::to_string(&Wrapper { seed: 42 }).expect("serialize");
        assert_eq!(rendered, r#"{"seed":"42"}"#);
    }

    #[test]
    fn deserialize_rejects_garbage() {
        let parsed = serde_json::from_str::<Wrapper>(r#"{"seed":"not-a-seed"}"#);
        assert!(parsed.is_err());
    }
}
