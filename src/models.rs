//! Modelos de dominio del playground y tipos del protocolo con el servicio RAG.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_CHUNK_SIZE: u32 = 1024;
pub const DEFAULT_CHUNK_OVERLAP: u32 = 20;
pub const DEFAULT_TOP_K: u32 = 2;
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_TOP_P: f64 = 1.0;

/// Prompt fijo usado para la extracción estructurada de personajes.
pub const EXTRACT_CHARACTERS_PROMPT: &str = "Extract all characters from the text. For each character, provide their name, a brief description, and key personality traits.";

/// Nombre del fichero ofrecido al exportar personajes.
pub const CHARACTERS_EXPORT_FILENAME: &str = "extracted_characters.json";

/// Personaje extraído del texto indexado.
///
/// El `id` se conserva tal cual llega del servicio (entero, decimal o cadena)
/// para que la exportación lo reproduzca sin cambios; si falta, tampoco se exporta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,
    pub name: String,
    pub description: String,
    pub personality: String,
}

/// Parámetros de troceado; sólo cuentan en el momento de construir el índice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChunkingSettings {
    pub chunk_size: u32,
    pub chunk_overlap: u32,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Parámetros de recuperación y generación enviados con cada consulta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetrievalSettings {
    pub top_k: u32,
    pub temperature: f64,
    pub top_p: f64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
        }
    }
}

// --- Metadatos de los controles deslizantes ---

/// Descripción de un slider del frontend: etiqueta, ayuda y rango admitido.
#[derive(Debug, Clone, Serialize)]
pub struct SliderSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl SliderSpec {
    /// Dentro del rango y alineado con el paso del slider.
    pub fn contains(&self, value: f64) -> bool {
        if !value.is_finite() || value < self.min || value > self.max {
            return false;
        }
        let steps = (value - self.min) / self.step;
        (steps - steps.round()).abs() < 1e-6
    }
}

pub const CHUNK_SIZE_SLIDER: SliderSpec = SliderSpec {
    key: "chunk_size",
    label: "Chunk Size:",
    description: "The maximum size of the chunks we are searching over, in tokens. \
        The bigger the chunk, the more likely that the information you are looking \
        for is in the chunk, but also the more likely that the chunk will contain \
        irrelevant information.",
    min: 1.0,
    max: 3000.0,
    step: 1.0,
    default: DEFAULT_CHUNK_SIZE as f64,
};

pub const CHUNK_OVERLAP_SLIDER: SliderSpec = SliderSpec {
    key: "chunk_overlap",
    label: "Chunk Overlap:",
    description: "The maximum amount of overlap between chunks, in tokens. \
        Overlap helps ensure that sufficient contextual information is retained.",
    min: 1.0,
    max: 600.0,
    step: 1.0,
    default: DEFAULT_CHUNK_OVERLAP as f64,
};

pub const TOP_K_SLIDER: SliderSpec = SliderSpec {
    key: "top_k",
    label: "Top K:",
    description: "The maximum number of chunks to return from the search. \
        It's called Top K because we are retrieving the K nearest neighbors of the query.",
    min: 1.0,
    max: 15.0,
    step: 1.0,
    default: DEFAULT_TOP_K as f64,
};

pub const TEMPERATURE_SLIDER: SliderSpec = SliderSpec {
    key: "temperature",
    label: "Temperature:",
    description: "Temperature controls the variability of model response. Adjust it \
        downwards to get more consistent responses, and upwards to get more diversity.",
    min: 0.0,
    max: 1.0,
    step: 0.01,
    default: DEFAULT_TEMPERATURE,
};

pub const TOP_P_SLIDER: SliderSpec = SliderSpec {
    key: "top_p",
    label: "Top P:",
    description: "Top P is another way to control the variability of the model \
        response. It filters out low probability options for the model. It's \
        recommended by OpenAI to set temperature to 1 if you're adjusting the top P.",
    min: 0.0,
    max: 1.0,
    step: 0.01,
    default: DEFAULT_TOP_P,
};

/// Controles agrupados tal y como los pinta el frontend.
#[derive(Debug, Clone, Serialize)]
pub struct ControlSpecs {
    pub chunking: [SliderSpec; 2],
    pub retrieval: [SliderSpec; 3],
}

pub fn control_specs() -> ControlSpecs {
    ControlSpecs {
        chunking: [CHUNK_SIZE_SLIDER, CHUNK_OVERLAP_SLIDER],
        retrieval: [TOP_K_SLIDER, TEMPERATURE_SLIDER, TOP_P_SLIDER],
    }
}

// --- Protocolo con el servicio RAG externo (camelCase en el cable) ---

/// Cuerpo de `POST /api/splitandembed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitAndEmbedRequest {
    pub document: String,
    pub chunk_size: u32,
    pub chunk_overlap: u32,
}

/// Carga útil devuelta al construir el índice. Los nodos son opacos.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitAndEmbedPayload {
    #[serde(default)]
    pub nodes_with_embedding: Vec<Value>,
}

/// Cuerpo de `POST /api/retrieveandquery`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveAndQueryRequest {
    pub query: String,
    pub nodes_with_embedding: Vec<Value>,
    pub top_k: u32,
    pub temperature: f64,
    pub top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_output: Option<bool>,
}

/// Carga útil de una consulta: texto libre o personajes estructurados.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrieveAndQueryPayload {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub characters: Option<Vec<Character>>,
}

/// Sobre común a ambos endpoints: `{error?, payload?}`.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub error: Option<String>,
    pub payload: Option<T>,
}
