use coin_model::CoinId;
use std::fmt;

/// Which upstream call failed. Shows up in user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Snapshot,
    History,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operation::Snapshot => write!(f, "data"),
            Operation::History => write!(f, "historical data"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("API Error {status}: Unable to fetch {operation} for {coin}.")]
    Status {
        operation: Operation,
        coin: CoinId,
        status: u16,
    },
    #[error("An error occurred while fetching {operation} for {coin}: {source}")]
    Transport {
        operation: Operation,
        coin: CoinId,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected {operation} payload for {coin}: {reason}")]
    Payload {
        operation: Operation,
        coin: CoinId,
        reason: String,
    },
}

impl ApiError {
    pub fn coin(&self) -> CoinId {
        match self {
            ApiError::Status { coin, .. }
            | ApiError::Transport { coin, .. }
            | ApiError::Payload { coin, .. } => *coin,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            ApiError::Status { operation, .. }
            | ApiError::Transport { operation, .. }
            | ApiError::Payload { operation, .. } => *operation,
        }
    }
}
