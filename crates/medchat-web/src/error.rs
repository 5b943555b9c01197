//! Mapping pipeline failures onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use medchat_core::Error;

/// A failed chat turn. Clients only ever see a generic message.
#[derive(Debug)]
pub struct ChatError(pub Error);

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Retrieval(_) | Error::Generation(_) | Error::Network(_) => StatusCode::BAD_GATEWAY,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match &self.0 {
            Error::InvalidInput(_) => "Please enter a question.",
            Error::Retrieval(_) | Error::Network(_) => {
                "The knowledge base is unavailable right now. Please try again later."
            }
            Error::Generation(_) => "The assistant could not produce an answer. Please try again later.",
            Error::Timeout(_) => "The assistant took too long to answer. Please try again.",
            _ => "Something went wrong while answering your question.",
        }
    }
}

impl From<Error> for ChatError {
    fn from(err: Error) -> Self {
        ChatError(err)
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        (self.status(), self.message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::InvalidInput("empty".into()), StatusCode::BAD_REQUEST),
            (Error::Retrieval("index missing".into()), StatusCode::BAD_GATEWAY),
            (Error::Generation("crashed".into()), StatusCode::BAD_GATEWAY),
            (Error::Timeout("120s".into()), StatusCode::GATEWAY_TIMEOUT),
            (Error::Configuration("bad key".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Data("empty".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ChatError(err).status(), status);
        }
    }

    #[test]
    fn test_message_hides_details() {
        let err = ChatError(Error::Retrieval("https://secret-host.pinecone.io refused".into()));
        assert!(!err.message().contains("pinecone"));
    }
}
