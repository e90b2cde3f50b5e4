use serde::{Deserialize, Serialize};

/// Columns a draw history file must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredColumn {
    Round,
    Number(u8),
}

impl RequiredColumn {
    pub fn as_str(&self) -> String {
        match self {
            Self::Round => "round".to_string(),
            Self::Number(position) => format!("n{}", position),
        }
    }

    pub fn all() -> Vec<Self> {
        let mut columns = vec![Self::Round];
        columns.extend((1..=6).map(Self::Number));
        columns
    }

    /// Common alternative column names
    pub fn aliases(&self) -> Vec<String> {
        match self {
            Self::Round => ["round", "Round", "ROUND", "draw", "drw_no", "drwNo"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            Self::Number(p) => vec![
                format!("n{}", p),
                format!("N{}", p),
                format!("num{}", p),
                format!("number{}", p),
                format!("drwtNo{}", p),
            ],
        }
    }
}

/// Metadata about a loaded history file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub file_path: String,
    pub num_rows: usize,
    pub first_round: Option<u32>,
    pub last_round: Option<u32>,
}
