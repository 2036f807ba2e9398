//! Estado del playground y sus transiciones.
//!
//! Flujo:
//!   1. El usuario escribe o importa texto y ajusta el troceado (índice obsoleto).
//!   2. `begin_build` marca la construcción en curso y produce la petición.
//!   3. El servicio RAG devuelve los nodos con embedding; `complete_build` los guarda.
//!   4. Con el índice listo se permiten consultas libres o la extracción de personajes.
//!
//! Las banderas `building_index` y `running_query` hacen de exclusión mutua:
//! mientras alguna esté activa no se acepta otra operación de red.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    backend::RagBackend,
    error::{BackendError, PlaygroundError},
    models::{
        Character, ChunkingSettings, RetrievalSettings, RetrieveAndQueryPayload,
        RetrieveAndQueryRequest, SliderSpec, SplitAndEmbedPayload, SplitAndEmbedRequest,
        CHUNK_OVERLAP_SLIDER, CHUNK_SIZE_SLIDER, EXTRACT_CHARACTERS_PROMPT, TEMPERATURE_SLIDER,
        TOP_K_SLIDER, TOP_P_SLIDER,
    },
    text_import,
};

pub const MSG_BUILDING_INDEX: &str = "Building index...";
pub const MSG_INDEX_BUILT: &str = "Index built!";
pub const MSG_RUNNING_QUERY: &str = "Running query...";
pub const MSG_EXTRACTING: &str = "Extracting characters...";
pub const MSG_EXTRACTED: &str = "Characters extracted successfully!";

pub type SharedPlayground = Arc<Mutex<Playground>>;

/// Bloquea el estado compartido; un mutex envenenado no invalida el estado,
/// que siempre se deja coherente entre transiciones.
pub fn lock(shared: &SharedPlayground) -> MutexGuard<'_, Playground> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NoIndex,
    Building,
    Ready,
    Querying,
}

/// Variante de petición contra `/api/retrieveandquery`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Question,
    CharacterExtraction,
}

#[derive(Debug, Clone)]
pub struct Playground {
    text: String,
    query: String,
    needs_new_index: bool,
    building_index: bool,
    running_query: bool,
    nodes_with_embedding: Vec<Value>,
    index_id: Option<Uuid>,
    chunking: ChunkingSettings,
    retrieval: RetrievalSettings,
    answer: String,
    characters: Vec<Character>,
}

impl Default for Playground {
    fn default() -> Self {
        Self {
            text: String::new(),
            query: String::new(),
            needs_new_index: true,
            building_index: false,
            running_query: false,
            nodes_with_embedding: Vec::new(),
            index_id: None,
            chunking: ChunkingSettings::default(),
            retrieval: RetrievalSettings::default(),
            answer: String::new(),
            characters: Vec::new(),
        }
    }
}

/// Vista serializable de todo lo que el frontend necesita pintar.
#[derive(Debug, Clone, Serialize)]
pub struct PlaygroundView {
    pub phase: Phase,
    pub text: String,
    pub query: String,
    pub needs_new_index: bool,
    pub building_index: bool,
    pub running_query: bool,
    pub can_build: bool,
    pub can_query: bool,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub answer: String,
    pub characters: Vec<Character>,
    pub node_count: usize,
    pub index_id: Option<Uuid>,
}

impl Playground {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.building_index {
            Phase::Building
        } else if self.running_query {
            Phase::Querying
        } else if self.needs_new_index {
            Phase::NoIndex
        } else {
            Phase::Ready
        }
    }

    pub fn can_build(&self) -> bool {
        self.needs_new_index && !self.building_index && !self.running_query
    }

    pub fn can_query(&self) -> bool {
        !self.needs_new_index && !self.building_index && !self.running_query
    }

    pub fn view(&self) -> PlaygroundView {
        PlaygroundView {
            phase: self.phase(),
            text: self.text.clone(),
            query: self.query.clone(),
            needs_new_index: self.needs_new_index,
            building_index: self.building_index,
            running_query: self.running_query,
            can_build: self.can_build(),
            can_query: self.can_query(),
            chunking: self.chunking,
            retrieval: self.retrieval,
            answer: self.answer.clone(),
            characters: self.characters.clone(),
            node_count: self.nodes_with_embedding.len(),
            index_id: self.index_id,
        }
    }

    // --- Edición del documento y del troceado (invalidan el índice) ---

    pub fn set_text(&mut self, text: String) {
        self.text = text;
        self.needs_new_index = true;
    }

    /// Importa un fichero `.txt`: limpia el contenido y sustituye el texto.
    pub fn import_file(&mut self, filename: &str, content: &str) -> Result<(), PlaygroundError> {
        let cleaned = text_import::import_txt(filename, content)?;
        self.set_text(cleaned);
        Ok(())
    }

    pub fn set_chunk_size(&mut self, value: u32) -> Result<(), PlaygroundError> {
        check_range(&CHUNK_SIZE_SLIDER, value as f64)?;
        self.chunking.chunk_size = value;
        self.needs_new_index = true;
        Ok(())
    }

    pub fn set_chunk_overlap(&mut self, value: u32) -> Result<(), PlaygroundError> {
        check_range(&CHUNK_OVERLAP_SLIDER, value as f64)?;
        self.chunking.chunk_overlap = value;
        self.needs_new_index = true;
        Ok(())
    }

    // --- Parámetros en bloque ---

    /// Aplica varios cambios de troceado a la vez; si alguno es inválido no se aplica ninguno.
    pub fn update_chunking(
        &mut self,
        chunk_size: Option<u32>,
        chunk_overlap: Option<u32>,
    ) -> Result<(), PlaygroundError> {
        if chunk_size.is_none() && chunk_overlap.is_none() {
            return Err(PlaygroundError::EmptyUpdate);
        }
        if let Some(v) = chunk_size {
            check_range(&CHUNK_SIZE_SLIDER, v as f64)?;
        }
        if let Some(v) = chunk_overlap {
            check_range(&CHUNK_OVERLAP_SLIDER, v as f64)?;
        }
        if let Some(v) = chunk_size {
            self.set_chunk_size(v)?;
        }
        if let Some(v) = chunk_overlap {
            self.set_chunk_overlap(v)?;
        }
        Ok(())
    }

    /// Igual que `update_chunking`, para los parámetros de recuperación.
    pub fn update_retrieval(
        &mut self,
        top_k: Option<u32>,
        temperature: Option<f64>,
        top_p: Option<f64>,
    ) -> Result<(), PlaygroundError> {
        self.ensure_can_query()?;
        if top_k.is_none() && temperature.is_none() && top_p.is_none() {
            return Err(PlaygroundError::EmptyUpdate);
        }
        if let Some(v) = top_k {
            check_range(&TOP_K_SLIDER, v as f64)?;
        }
        if let Some(v) = temperature {
            check_range(&TEMPERATURE_SLIDER, v)?;
        }
        if let Some(v) = top_p {
            check_range(&TOP_P_SLIDER, v)?;
        }
        if let Some(v) = top_k {
            self.retrieval.top_k = v;
        }
        if let Some(v) = temperature {
            self.retrieval.temperature = v;
        }
        if let Some(v) = top_p {
            self.retrieval.top_p = v;
        }
        Ok(())
    }

    pub fn set_query(&mut self, query: String) {
        self.query = query;
    }

    // --- Construcción del índice ---

    /// Marca la construcción en curso y devuelve la petición a enviar.
    pub fn begin_build(&mut self) -> Result<SplitAndEmbedRequest, PlaygroundError> {
        if self.building_index || self.running_query {
            return Err(PlaygroundError::Busy);
        }
        if !self.needs_new_index {
            return Err(PlaygroundError::IndexUpToDate);
        }
        self.answer = MSG_BUILDING_INDEX.to_string();
        self.building_index = true;
        self.needs_new_index = false;
        Ok(SplitAndEmbedRequest {
            document: self.text.clone(),
            chunk_size: self.chunking.chunk_size,
            chunk_overlap: self.chunking.chunk_overlap,
        })
    }

    /// Aplica el resultado de la construcción. Las ediciones hechas mientras
    /// tanto mantienen el índice obsoleto.
    pub fn complete_build(&mut self, result: Result<SplitAndEmbedPayload, BackendError>) {
        self.building_index = false;
        match result {
            Ok(payload) => {
                self.nodes_with_embedding = payload.nodes_with_embedding;
                self.index_id = Some(Uuid::new_v4());
                self.answer = MSG_INDEX_BUILT.to_string();
            }
            Err(e) => {
                self.answer = e.to_string();
                self.needs_new_index = true;
            }
        }
    }

    // --- Consultas y extracción ---

    /// Marca la consulta en curso y devuelve la petición a enviar.
    pub fn begin_query(&mut self, kind: QueryKind) -> Result<RetrieveAndQueryRequest, PlaygroundError> {
        self.ensure_can_query()?;
        let (query, structured_output, message) = match kind {
            QueryKind::Question => (self.query.clone(), None, MSG_RUNNING_QUERY),
            QueryKind::CharacterExtraction => {
                (EXTRACT_CHARACTERS_PROMPT.to_string(), Some(true), MSG_EXTRACTING)
            }
        };
        self.answer = message.to_string();
        self.running_query = true;
        Ok(RetrieveAndQueryRequest {
            query,
            nodes_with_embedding: self.nodes_with_embedding.clone(),
            top_k: self.retrieval.top_k,
            temperature: self.retrieval.temperature,
            top_p: self.retrieval.top_p,
            structured_output,
        })
    }

    pub fn complete_query(
        &mut self,
        kind: QueryKind,
        result: Result<RetrieveAndQueryPayload, BackendError>,
    ) {
        self.running_query = false;
        match (kind, result) {
            (_, Err(e)) => self.answer = e.to_string(),
            (QueryKind::Question, Ok(payload)) => {
                self.answer = payload.response.unwrap_or_default();
            }
            (QueryKind::CharacterExtraction, Ok(payload)) => {
                self.characters = payload.characters.unwrap_or_default();
                self.answer = MSG_EXTRACTED.to_string();
            }
        }
    }

    // --- Exportación ---

    /// JSON con sangría de dos espacios; `[]` si no hay personajes.
    pub fn export_characters(&self) -> String {
        // Sólo cadenas y `Value`: la serialización no puede fallar.
        serde_json::to_string_pretty(&self.characters)
            .expect("una lista de personajes siempre se serializa")
    }

    fn ensure_can_query(&self) -> Result<(), PlaygroundError> {
        if self.building_index || self.running_query {
            Err(PlaygroundError::Busy)
        } else if self.needs_new_index {
            Err(PlaygroundError::IndexNotReady)
        } else {
            Ok(())
        }
    }
}

fn check_range(spec: &SliderSpec, value: f64) -> Result<(), PlaygroundError> {
    if spec.contains(value) {
        Ok(())
    } else {
        Err(PlaygroundError::InvalidSetting {
            name: spec.key,
            value,
            min: spec.min,
            max: spec.max,
            step: spec.step,
        })
    }
}

// --- Ejecución asíncrona de las peticiones de red ---

/// Envía la petición de construcción y aplica el resultado. No mantiene el
/// bloqueo durante la espera.
pub async fn run_build(
    shared: SharedPlayground,
    backend: Arc<dyn RagBackend>,
    request: SplitAndEmbedRequest,
) {
    info!(
        "Construyendo índice ({} caracteres, chunk_size={}, chunk_overlap={})",
        request.document.len(),
        request.chunk_size,
        request.chunk_overlap
    );
    let result = backend.split_and_embed(&request).await;
    match &result {
        Ok(payload) => info!("Índice construido con {} nodos.", payload.nodes_with_embedding.len()),
        Err(e) => error!("Error construyendo el índice: {}", e),
    }
    lock(&shared).complete_build(result);
}

/// Envía una consulta (libre o de extracción) y aplica el resultado.
pub async fn run_query(
    shared: SharedPlayground,
    backend: Arc<dyn RagBackend>,
    kind: QueryKind,
    request: RetrieveAndQueryRequest,
) {
    info!("Lanzando consulta {:?} (top_k={})", kind, request.top_k);
    let result = backend.retrieve_and_query(&request).await;
    if let Err(e) = &result {
        error!("Error en la consulta {:?}: {}", kind, e);
    }
    lock(&shared).complete_query(kind, result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::FakeBackend;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn character(id: i64, name: &str) -> Character {
        Character {
            id: json!(id),
            name: name.to_string(),
            description: format!("{name} description"),
            personality: format!("{name} personality"),
        }
    }

    fn ready_playground() -> Playground {
        let mut pg = Playground::new();
        pg.set_text("Érase una vez".into());
        assert_ok!(pg.begin_build());
        pg.complete_build(Ok(SplitAndEmbedPayload {
            nodes_with_embedding: vec![json!({"id": "n1"}), json!({"id": "n2"})],
        }));
        pg
    }

    #[test]
    fn starts_without_index() {
        let pg = Playground::new();
        assert_eq!(pg.phase(), Phase::NoIndex);
        assert!(pg.can_build());
        assert!(!pg.can_query());
        assert_eq!(pg.chunking, ChunkingSettings::default());
        assert_eq!(pg.retrieval, RetrievalSettings::default());
    }

    #[test]
    fn edits_always_mark_index_stale() {
        let mut pg = ready_playground();
        assert!(!pg.needs_new_index);

        let same_text = pg.text.clone();
        pg.set_text(same_text);
        assert!(pg.needs_new_index);

        let mut pg = ready_playground();
        let size = pg.chunking.chunk_size;
        assert_ok!(pg.set_chunk_size(size));
        assert!(pg.needs_new_index);

        let mut pg = ready_playground();
        let overlap = pg.chunking.chunk_overlap;
        assert_ok!(pg.set_chunk_overlap(overlap));
        assert!(pg.needs_new_index);

        let mut pg = ready_playground();
        assert_ok!(pg.import_file("libro.txt", "  nuevo\n\n\n\ntexto "));
        assert_eq!(pg.text, "nuevo texto");
        assert!(pg.needs_new_index);
    }

    #[test]
    fn rejected_import_leaves_state_untouched() {
        let mut pg = ready_playground();
        assert_err!(pg.import_file("libro.epub", "x"));
        assert_eq!(pg.text, "Érase una vez");
        assert!(!pg.needs_new_index);
    }

    #[test]
    fn chunk_settings_are_range_checked() {
        let mut pg = Playground::new();
        assert!(matches!(
            pg.set_chunk_size(0),
            Err(PlaygroundError::InvalidSetting { name: "chunk_size", .. })
        ));
        assert_err!(pg.set_chunk_size(3001));
        assert_err!(pg.set_chunk_overlap(601));
        assert_ok!(pg.set_chunk_overlap(600));
        assert_eq!(pg.chunking.chunk_overlap, 600);
    }

    #[test]
    fn build_request_carries_text_and_chunking() {
        let mut pg = Playground::new();
        pg.set_text("abc".into());
        assert_ok!(pg.set_chunk_size(256));
        assert_ok!(pg.set_chunk_overlap(32));
        let req = pg.begin_build().unwrap();
        assert_eq!(
            req,
            SplitAndEmbedRequest {
                document: "abc".into(),
                chunk_size: 256,
                chunk_overlap: 32,
            }
        );
        assert_eq!(pg.phase(), Phase::Building);
        assert_eq!(pg.answer, MSG_BUILDING_INDEX);
        assert!(!pg.can_build());
        assert!(!pg.can_query());
    }

    #[test]
    fn build_is_refused_when_busy_or_up_to_date() {
        let mut pg = Playground::new();
        assert_ok!(pg.begin_build());
        assert!(matches!(pg.begin_build(), Err(PlaygroundError::Busy)));

        let mut pg = ready_playground();
        assert!(matches!(pg.begin_build(), Err(PlaygroundError::IndexUpToDate)));
    }

    #[test]
    fn successful_build_stores_nodes_without_touching_text() {
        let pg = ready_playground();
        assert_eq!(pg.phase(), Phase::Ready);
        assert_eq!(pg.text, "Érase una vez");
        assert_eq!(pg.nodes_with_embedding.len(), 2);
        assert_eq!(pg.answer, MSG_INDEX_BUILT);
        assert!(pg.view().index_id.is_some());
    }

    #[test]
    fn failed_build_reports_error_and_keeps_previous_nodes() {
        let mut pg = ready_playground();
        let previous_nodes = pg.nodes_with_embedding.clone();
        let previous_id = pg.view().index_id;
        pg.set_text("otro texto".into());
        assert_ok!(pg.begin_build());
        pg.complete_build(Err(BackendError::Server("Embedding quota exceeded".into())));

        assert_eq!(pg.answer, "Embedding quota exceeded");
        assert_eq!(pg.nodes_with_embedding, previous_nodes);
        assert_eq!(pg.view().index_id, previous_id);
        assert!(pg.needs_new_index);
        assert!(pg.can_build());
    }

    #[test]
    fn edits_during_build_keep_index_stale() {
        let mut pg = Playground::new();
        pg.set_text("v1".into());
        assert_ok!(pg.begin_build());
        pg.set_text("v2".into());
        pg.complete_build(Ok(SplitAndEmbedPayload {
            nodes_with_embedding: vec![json!(1)],
        }));
        assert_eq!(pg.phase(), Phase::NoIndex);
        assert_eq!(pg.nodes_with_embedding.len(), 1);
    }

    #[test]
    fn queries_require_a_fresh_idle_index() {
        let mut pg = Playground::new();
        assert!(matches!(
            pg.begin_query(QueryKind::Question),
            Err(PlaygroundError::IndexNotReady)
        ));

        assert_ok!(pg.begin_build());
        assert!(matches!(
            pg.begin_query(QueryKind::CharacterExtraction),
            Err(PlaygroundError::Busy)
        ));

        let mut pg = ready_playground();
        assert_ok!(pg.begin_query(QueryKind::Question));
        assert_eq!(pg.phase(), Phase::Querying);
        assert!(matches!(
            pg.begin_query(QueryKind::Question),
            Err(PlaygroundError::Busy)
        ));
        assert!(matches!(pg.begin_build(), Err(PlaygroundError::Busy)));
    }

    #[test]
    fn retrieval_settings_need_ready_index() {
        let mut pg = Playground::new();
        assert!(matches!(pg.update_retrieval(Some(5), None, None), Err(PlaygroundError::IndexNotReady)));

        let mut pg = ready_playground();
        assert_ok!(pg.update_retrieval(Some(5), Some(0.7), Some(0.9)));
        assert_err!(pg.update_retrieval(Some(16), None, None));
        assert_err!(pg.update_retrieval(None, Some(1.5), None));
        assert_err!(pg.update_retrieval(None, None, Some(-0.1)));
        assert_eq!(
            pg.retrieval,
            RetrievalSettings {
                top_k: 5,
                temperature: 0.7,
                top_p: 0.9,
            }
        );
    }

    #[test]
    fn invalid_batch_update_applies_nothing() {
        let mut pg = ready_playground();
        assert_err!(pg.update_retrieval(Some(4), Some(2.0), None));
        assert_eq!(pg.retrieval, RetrievalSettings::default());

        assert_err!(pg.update_chunking(Some(100), Some(0)));
        assert_eq!(pg.chunking, ChunkingSettings::default());
        assert!(!pg.needs_new_index);

        assert_ok!(pg.update_chunking(Some(100), None));
        assert_eq!(pg.chunking.chunk_size, 100);
        assert!(pg.needs_new_index);
    }

    #[test]
    fn empty_updates_are_rejected() {
        let mut pg = ready_playground();
        assert!(matches!(pg.update_chunking(None, None), Err(PlaygroundError::EmptyUpdate)));
        assert!(!pg.needs_new_index);
        assert!(matches!(
            pg.update_retrieval(None, None, None),
            Err(PlaygroundError::EmptyUpdate)
        ));
    }

    #[test]
    fn off_step_values_are_rejected() {
        let mut pg = ready_playground();
        assert!(matches!(
            pg.update_retrieval(None, Some(0.123), None),
            Err(PlaygroundError::InvalidSetting { name: "temperature", .. })
        ));
        assert_ok!(pg.update_retrieval(None, Some(0.12), None));
    }

    #[test]
    fn question_request_and_answer() {
        let mut pg = ready_playground();
        assert_ok!(pg.update_retrieval(Some(3), None, None));
        pg.set_query("¿Quién es el protagonista?".into());
        let req = pg.begin_query(QueryKind::Question).unwrap();
        assert_eq!(req.query, "¿Quién es el protagonista?");
        assert_eq!(req.nodes_with_embedding, pg.nodes_with_embedding.clone());
        assert_eq!(req.top_k, 3);
        assert_eq!(req.structured_output, None);
        assert_eq!(pg.answer, MSG_RUNNING_QUERY);

        pg.complete_query(
            QueryKind::Question,
            Ok(RetrieveAndQueryPayload {
                response: Some("Un gato.".into()),
                characters: None,
            }),
        );
        assert_eq!(pg.answer, "Un gato.");
        assert_eq!(pg.phase(), Phase::Ready);
    }

    #[test]
    fn extraction_replaces_characters() {
        let mut pg = ready_playground();
        let req = pg.begin_query(QueryKind::CharacterExtraction).unwrap();
        assert_eq!(req.query, EXTRACT_CHARACTERS_PROMPT);
        assert_eq!(req.structured_output, Some(true));
        assert_eq!(pg.answer, MSG_EXTRACTING);

        pg.complete_query(
            QueryKind::CharacterExtraction,
            Ok(RetrieveAndQueryPayload {
                response: None,
                characters: Some(vec![character(1, "Ana"), character(2, "Luis")]),
            }),
        );
        assert_eq!(pg.characters.len(), 2);
        assert_eq!(pg.answer, MSG_EXTRACTED);

        assert_ok!(pg.begin_query(QueryKind::CharacterExtraction));
        pg.complete_query(
            QueryKind::CharacterExtraction,
            Ok(RetrieveAndQueryPayload {
                response: None,
                characters: Some(vec![character(3, "Eva")]),
            }),
        );
        assert_eq!(pg.characters, &[character(3, "Eva")]);
    }

    #[test]
    fn failed_query_keeps_characters_and_nodes() {
        let mut pg = ready_playground();
        assert_ok!(pg.begin_query(QueryKind::CharacterExtraction));
        pg.complete_query(
            QueryKind::CharacterExtraction,
            Ok(RetrieveAndQueryPayload {
                response: None,
                characters: Some(vec![character(1, "Ana")]),
            }),
        );
        let nodes = pg.nodes_with_embedding.clone();

        assert_ok!(pg.begin_query(QueryKind::CharacterExtraction));
        pg.complete_query(
            QueryKind::CharacterExtraction,
            Err(BackendError::Server("Model overloaded".into())),
        );
        assert_eq!(pg.answer, "Model overloaded");
        assert_eq!(pg.characters, &[character(1, "Ana")]);
        assert_eq!(pg.nodes_with_embedding, nodes);
        assert!(pg.can_query());
    }

    #[test]
    fn export_of_empty_list_is_empty_array() {
        let pg = Playground::new();
        assert_eq!(pg.export_characters(), "[]");
    }

    #[test]
    fn export_round_trips_characters() {
        let mut pg = ready_playground();
        let characters = vec![character(1, "Ana"), character(7, "Luis \"el Sabio\"")];
        assert_ok!(pg.begin_query(QueryKind::CharacterExtraction));
        pg.complete_query(
            QueryKind::CharacterExtraction,
            Ok(RetrieveAndQueryPayload {
                response: None,
                characters: Some(characters.clone()),
            }),
        );
        let exported = pg.export_characters();
        assert!(exported.contains("\n  {\n    \"id\": 1,"));
        let parsed: Vec<Character> = serde_json::from_str(&exported).unwrap();
        assert_eq!(parsed, characters);
    }

    #[tokio::test]
    async fn run_build_applies_backend_result() {
        let backend = Arc::new(FakeBackend::default().with_nodes(vec![json!({"id": 1})]));
        let shared: SharedPlayground = Arc::new(Mutex::new(Playground::new()));
        let request = {
            let mut pg = lock(&shared);
            pg.set_text("texto".into());
            pg.begin_build().unwrap()
        };
        run_build(shared.clone(), backend.clone(), request).await;

        let pg = lock(&shared);
        assert_eq!(pg.phase(), Phase::Ready);
        assert_eq!(pg.nodes_with_embedding, &[json!({"id": 1})]);
        assert_eq!(backend.split_requests()[0].document, "texto");
    }

    #[tokio::test]
    async fn run_query_surfaces_backend_error() {
        let backend = Arc::new(FakeBackend::default().with_query_error("No nodes"));
        let shared: SharedPlayground = Arc::new(Mutex::new(ready_playground()));
        let request = lock(&shared).begin_query(QueryKind::Question).unwrap();
        run_query(shared.clone(), backend, QueryKind::Question, request).await;

        let pg = lock(&shared);
        assert_eq!(pg.answer, "No nodes");
        assert_eq!(pg.phase(), Phase::Ready);
    }
}
