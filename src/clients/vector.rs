use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{json, Value};

use crate::clients::{preview, ClientError};

#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ClientError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Value,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), ClientError>;
}

pub struct OpenAiEmbeddingClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl OpenAiEmbeddingClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        model: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ClientError> {
        let response = self
            .http
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&json!({ "model": self.model, "input": text }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;
        if !status.is_success() {
            return Err(ClientError::Unavailable(format!(
                "embedding request returned {}: {}",
                status,
                preview(&body.to_string(), 200)
            )));
        }
        parse_embedding(&body)
    }
}

fn parse_embedding(body: &Value) -> Result<Vec<f32>, ClientError> {
    let values = body["data"][0]["embedding"]
        .as_array()
        .ok_or_else(|| ClientError::Parse("embedding response has no data".to_string()))?;

    values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| ClientError::Parse("non-numeric embedding value".to_string()))
        })
        .collect()
}

pub struct PineconeClient {
    http: reqwest::Client,
    index_host: String,
    api_key: SecretString,
}

impl PineconeClient {
    pub fn new(http: reqwest::Client, index_host: &str, api_key: SecretString) -> Self {
        let host = index_host.trim_end_matches('/');
        let index_host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
        Self {
            http,
            index_host,
            api_key,
        }
    }
}

#[async_trait]
impl VectorStore for PineconeClient {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!("{}/vectors/upsert", self.index_host))
            .header("Api-Key", self.api_key.expose_secret())
            .json(&json!({ "vectors": records }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Unavailable(format!(
                "vector upsert returned {}: {}",
                status,
                preview(&body, 200)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_embedding_reads_first_vector() {
        let body = json!({ "data": [{ "embedding": [0.5, -1.0, 2.0] }] });
        assert_eq!(parse_embedding(&body).unwrap(), vec![0.5, -1.0, 2.0]);
    }

    #[test]
    fn parse_embedding_rejects_missing_data() {
        assert!(matches!(
            parse_embedding(&json!({ "error": "nope" })),
            Err(ClientError::Parse(_))
        ));
    }

    #[test]
    fn pinecone_host_gets_scheme() {
        let client = PineconeClient::new(
            reqwest::Client::new(),
            "quiz-abc.svc.pinecone.io/",
            SecretString::from("key".to_string()),
        );
        assert_eq!(client.index_host, "https://quiz-abc.svc.pinecone.io");
    }
}
