//! Carga y gestión de configuración de la aplicación (servidor + servicio RAG).

use std::env;
use anyhow::{anyhow, Result};
use url::Url;

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,
    /// URL base del servicio que expone `/api/splitandembed` y `/api/retrieveandquery`.
    pub rag_backend_url: Url,
    pub frontend_dir: String,
    pub open_browser: bool,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env`, pero leyendo las claves con la función indicada.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_addr =
            lookup("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:3322".to_string());

        let backend_str =
            lookup("RAG_BACKEND_URL").unwrap_or_else(|| "http://127.0.0.1:3000".to_string());
        let rag_backend_url = Url::parse(&backend_str)
            .map_err(|e| anyhow!("RAG_BACKEND_URL no es una URL válida ({backend_str}): {e}"))?;
        if rag_backend_url.cannot_be_a_base() {
            return Err(anyhow!(
                "RAG_BACKEND_URL debe ser una URL base http(s): {backend_str}"
            ));
        }

        let frontend_dir =
            lookup("FRONTEND_DIR").unwrap_or_else(|| "frontend".to_string());

        let open_browser = match lookup("OPEN_BROWSER") {
            None => true,
            Some(v) => parse_bool(&v)
                .ok_or_else(|| anyhow!("OPEN_BROWSER debe ser true/false, no '{v}'"))?,
        };

        Ok(Self {
            server_addr,
            rag_backend_url,
            frontend_dir,
            open_browser,
        })
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
