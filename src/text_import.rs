//! Importación de ficheros `.txt`: validación del nombre y limpieza del texto.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::PlaygroundError;

fn repeated_blank_lines() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n\s*\n").expect("patrón de saltos de línea válido"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("patrón de espacios válido"))
}

/// Sólo se aceptan ficheros con extensión `.txt` (sin distinguir mayúsculas).
pub fn is_txt_file(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(|ext| ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

/// Limpia el texto importado:
/// 1. recorta espacios al principio y al final,
/// 2. reduce tres o más saltos de línea seguidos a dos,
/// 3. colapsa cualquier secuencia de espacios en blanco a un único espacio,
/// 4. vuelve a recortar.
pub fn normalize_text(content: &str) -> String {
    let trimmed = content.trim();
    let fewer_breaks = repeated_blank_lines().replace_all(trimmed, "\n\n");
    let single_spaced = whitespace_runs().replace_all(&fewer_breaks, " ");
    single_spaced.trim().to_string()
}

/// Valida el fichero recibido y devuelve su contenido ya normalizado.
pub fn import_txt(filename: &str, content: &str) -> Result<String, PlaygroundError> {
    if !is_txt_file(filename) {
        return Err(PlaygroundError::UnsupportedFile(filename.to_string()));
    }
    Ok(normalize_text(content))
}
