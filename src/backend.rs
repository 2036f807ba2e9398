//! Cliente del servicio RAG externo.
//!
//! El troceado, los embeddings, la recuperación y la llamada al LLM viven en
//! ese servicio; aquí sólo se envían las peticiones y se desempaqueta el sobre
//! `{error?, payload?}` que devuelven ambos endpoints.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::AppConfig,
    error::BackendError,
    models::{
        ApiEnvelope, RetrieveAndQueryPayload, RetrieveAndQueryRequest, SplitAndEmbedPayload,
        SplitAndEmbedRequest,
    },
};

const SPLIT_AND_EMBED_PATH: &str = "api/splitandembed";
const RETRIEVE_AND_QUERY_PATH: &str = "api/retrieveandquery";

/// Operaciones que el playground necesita del servicio RAG.
#[async_trait]
pub trait RagBackend: Send + Sync {
    /// Trocea y calcula embeddings del documento; devuelve los nodos opacos.
    async fn split_and_embed(
        &self,
        request: &SplitAndEmbedRequest,
    ) -> Result<SplitAndEmbedPayload, BackendError>;

    /// Recupera los nodos más cercanos y consulta al LLM.
    async fn retrieve_and_query(
        &self,
        request: &RetrieveAndQueryRequest,
    ) -> Result<RetrieveAndQueryPayload, BackendError>;
}

/// Implementación HTTP sobre `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpRagBackend {
    client: reqwest::Client,
    split_url: Url,
    query_url: Url,
}

impl HttpRagBackend {
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let (split_url, query_url) = endpoint_urls(&cfg.rag_backend_url)?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| anyhow!("No se pudo crear el cliente HTTP: {e}"))?;
        Ok(Self {
            client,
            split_url,
            query_url,
        })
    }

    async fn post_json<B, T>(&self, url: &Url, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!("POST {}", url);
        let response = self.client.post(url.clone()).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let result = decode_envelope(status, &text);
        if let Err(e) = &result {
            warn!("El servicio RAG devolvió un error en {}: {}", url, e);
        }
        result
    }
}

#[async_trait]
impl RagBackend for HttpRagBackend {
    async fn split_and_embed(
        &self,
        request: &SplitAndEmbedRequest,
    ) -> Result<SplitAndEmbedPayload, BackendError> {
        self.post_json(&self.split_url, request).await
    }

    async fn retrieve_and_query(
        &self,
        request: &RetrieveAndQueryRequest,
    ) -> Result<RetrieveAndQueryPayload, BackendError> {
        self.post_json(&self.query_url, request).await
    }
}

/// Construye las URLs de ambos endpoints a partir de la URL base,
/// conservando cualquier prefijo de ruta que ésta tenga.
fn endpoint_urls(base: &Url) -> Result<(Url, Url)> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let split = base
        .join(SPLIT_AND_EMBED_PATH)
        .map_err(|e| anyhow!("URL de splitandembed inválida: {e}"))?;
    let query = base
        .join(RETRIEVE_AND_QUERY_PATH)
        .map_err(|e| anyhow!("URL de retrieveandquery inválida: {e}"))?;
    Ok((split, query))
}

/// Desempaqueta `{error?, payload?}`. Un `error` no vacío gana siempre;
/// si no hay ni error ni carga útil la respuesta se considera mal formada.
pub fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<T, BackendError> {
    match serde_json::from_str::<ApiEnvelope<T>>(body) {
        Ok(envelope) => {
            if let Some(error) = envelope.error.filter(|e| !e.is_empty()) {
                return Err(BackendError::Server(error));
            }
            match envelope.payload {
                Some(payload) => Ok(payload),
                None if !status.is_success() => {
                    Err(BackendError::Transport(format!("HTTP {status}")))
                }
                None => Err(BackendError::Malformed("missing payload".to_string())),
            }
        }
        Err(_) if !status.is_success() => Err(BackendError::Transport(format!("HTTP {status}"))),
        Err(e) => Err(BackendError::Malformed(e.to_string())),
    }
}

#[cfg(test)]
pub mod testing {
    //! Servicio RAG falso con respuestas fijas que registra las peticiones.

    use std::sync::Mutex;

    use serde_json::Value;

    use super::*;
    use crate::models::Character;

    pub struct FakeBackend {
        split: Result<Vec<Value>, String>,
        query: Result<RetrieveAndQueryPayload, String>,
        split_requests: Mutex<Vec<SplitAndEmbedRequest>>,
        query_requests: Mutex<Vec<RetrieveAndQueryRequest>>,
    }

    impl Default for FakeBackend {
        fn default() -> Self {
            Self {
                split: Ok(Vec::new()),
                query: Ok(RetrieveAndQueryPayload::default()),
                split_requests: Mutex::new(Vec::new()),
                query_requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl FakeBackend {
        pub fn with_nodes(mut self, nodes: Vec<Value>) -> Self {
            self.split = Ok(nodes);
            self
        }

        pub fn with_split_error(mut self, message: &str) -> Self {
            self.split = Err(message.to_string());
            self
        }

        pub fn with_response(mut self, response: &str) -> Self {
            self.query = Ok(RetrieveAndQueryPayload {
                response: Some(response.to_string()),
                characters: None,
            });
            self
        }

        pub fn with_characters(mut self, characters: Vec<Character>) -> Self {
            self.query = Ok(RetrieveAndQueryPayload {
                response: None,
                characters: Some(characters),
            });
            self
        }

        pub fn with_query_error(mut self, message: &str) -> Self {
            self.query = Err(message.to_string());
            self
        }

        pub fn split_requests(&self) -> Vec<SplitAndEmbedRequest> {
            self.split_requests.lock().unwrap().clone()
        }

        pub fn query_requests(&self) -> Vec<RetrieveAndQueryRequest> {
            self.query_requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RagBackend for FakeBackend {
        async fn split_and_embed(
            &self,
            request: &SplitAndEmbedRequest,
        ) -> Result<SplitAndEmbedPayload, BackendError> {
            self.split_requests.lock().unwrap().push(request.clone());
            match &self.split {
                Ok(nodes) => Ok(SplitAndEmbedPayload {
                    nodes_with_embedding: nodes.clone(),
                }),
                Err(message) => Err(BackendError::Server(message.clone())),
            }
        }

        async fn retrieve_and_query(
            &self,
            request: &RetrieveAndQueryRequest,
        ) -> Result<RetrieveAndQueryPayload, BackendError> {
            self.query_requests.lock().unwrap().push(request.clone());
            self.query
                .clone()
                .map_err(BackendError::Server)
        }
    }
}
