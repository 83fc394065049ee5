use serde::{Deserialize, Serialize};

/// Dynamic payload stored alongside an ETag.
///
/// Mirrors the source's `Any` content field with a tagged variant, per
/// the wire-format rule in the spec's data model: bytes are emitted as a
/// UTF-8 string when valid, otherwise as an array of byte integers.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Bytes(Vec<u8>),
    Text(String),
    Json(serde_json::Value),
}

impl Content {
    pub fn as_bytes(&self) -> std::borrow::Cow<'_, [u8]> {
        match self {
            Content::Bytes(b) => std::borrow::Cow::Borrowed(b),
            Content::Text(s) => std::borrow::Cow::Borrowed(s.as_bytes()),
            Content::Json(v) => std::borrow::Cow::Owned(
                serde_json::to_vec(v).unwrap_or_default(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// UTF-8 best-effort preview of the first `n` bytes.
    pub fn preview(&self, n: usize) -> String {
        let bytes = self.as_bytes();
        let slice = &bytes[..bytes.len().min(n)];
        String::from_utf8_lossy(slice).into_owned()
    }
}

impl From<Vec<u8>> for Content {
    fn from(value: Vec<u8>) -> Self {
        Content::Bytes(value)
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::Text(value)
    }
}

/// Opaque cached payload: an ETag paired with its content. Equality is by
/// value; mutating a returned copy never affects the stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct ETagContent {
    pub etag: String,
    pub content: Content,
}

impl ETagContent {
    pub fn new<S: Into<String>>(etag: S, content: Content) -> Self {
        Self {
            etag: etag.into(),
            content,
        }
    }
}

/// Wire-level serialisation: `{"etag": "...", "content": <string|array-of-int>}`.
/// Readers must accept both content shapes (§6).
#[derive(Serialize, Deserialize)]
struct WireContent {
    etag: String,
    content: serde_json::Value,
}

impl Serialize for ETagContent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let content = match &self.content {
            Content::Text(s) => serde_json::Value::String(s.clone()),
            Content::Json(v) => v.clone(),
            Content::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => serde_json::Value::String(s.to_owned()),
                Err(_) => serde_json::Value::Array(
                    b.iter().map(|byte| serde_json::Value::from(*byte)).collect(),
                ),
            },
        };
        WireContent {
            etag: self.etag.clone(),
            content,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ETagContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = WireContent::deserialize(deserializer)?;
        let content = match wire.content {
            serde_json::Value::String(s) => Content::Text(s),
            serde_json::Value::Array(arr) => {
                let mut bytes = Vec::with_capacity(arr.len());
                for v in arr {
                    let b = v.as_u64().ok_or_else(|| {
                        serde::de::Error::custom("content array element is not a byte")
                    })?;
                    bytes.push(b as u8);
                }
                Content::Bytes(bytes)
            }
            other => Content::Json(other),
        };
        Ok(ETagContent {
            etag: wire.etag,
            content,
        })
    }
}

/// Backend record: a value plus an optional absolute-epoch-seconds expiry.
/// `expiry = None` never auto-expires; `expiry <= now` must read as absent.
#[derive(Debug, Clone)]
pub struct CacheItem {
    pub value: ETagContent,
    pub expiry: Option<i64>,
}

impl CacheItem {
    pub fn new(value: ETagContent, expiry: Option<i64>) -> Self {
        Self { value, expiry }
    }

    pub fn is_valid(&self, now: i64) -> bool {
        match self.expiry {
            Some(exp) => exp > now,
            None => true,
        }
    }

    pub fn ttl_remaining(&self, now: i64) -> Option<i64> {
        self.expiry.map(|exp| (exp - now).max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_content_round_trips_as_string() {
        let item = ETagContent::new("abc", Content::Text("hello".into()));
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"content\":\"hello\""));
        let back: ETagContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, Content::Text("hello".into()));
    }

    #[test]
    fn non_utf8_bytes_become_int_array() {
        let item = ETagContent::new("abc", Content::Bytes(vec![0xff, 0xfe]));
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("[255,254]"));
        let back: ETagContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, Content::Bytes(vec![0xff, 0xfe]));
    }

    #[test]
    fn cache_item_validity() {
        let item = CacheItem::new(ETagContent::new("a", Content::Text("x".into())), Some(100));
        assert!(item.is_valid(50));
        assert!(!item.is_valid(100));
        assert!(!item.is_valid(150));
    }
}
