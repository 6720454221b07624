#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("At least one search criterion (gnlNmCd, itmNm, mdsCd, mnfEntpNm) is required")]
    NoCriteria,

    #[error("An ingredient code (gnlNmCd) is required")]
    MissingIngredientCode,

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Drug dataset could not be loaded: {0}")]
    DatasetUnavailable(String),
}

impl Error {
    /// Whether the caller, not the service, is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NoCriteria | Error::MissingIngredientCode | Error::InvalidRequest(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(Error::NoCriteria.is_client_error());
        assert!(Error::MissingIngredientCode.is_client_error());
        assert!(Error::InvalidRequest("bad".to_string()).is_client_error());
        assert!(!Error::DatasetUnavailable("down".to_string()).is_client_error());
    }
}
