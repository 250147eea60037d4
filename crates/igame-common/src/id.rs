use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a game session.
///
/// The backend may send ids as JSON numbers or strings. The original
/// representation is kept so it is echoed back unchanged in request bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameId {
    Int(i64),
    Text(String),
}

impl GameId {
    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for GameId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for GameId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for GameId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_numeric_id() {
        let id: GameId = serde_json::from_str("42").unwrap();
        assert_eq!(id, GameId::Int(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn deserializes_uuid_id() {
        let id: GameId =
            serde_json::from_str(r#""4f7c1c52-6a5e-4b8a-9d0e-0a6a0f6f5a11""#).unwrap();
        assert!(matches!(id, GameId::Text(_)));
    }

    #[test]
    fn serializes_in_original_shape() {
        assert_eq!(serde_json::to_string(&GameId::Int(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&GameId::from("abc")).unwrap(),
            r#""abc""#
        );
    }

    #[test]
    fn game_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(GameId::from(1));
        set.insert(GameId::from(1));
        set.insert(GameId::from("1"));
        assert_eq!(set.len(), 2);
    }
}
