//! ============================================================================
//! Intent Classifier - Keyword-based query labeling
//! ============================================================================
//! Pure, case-insensitive substring matching against fixed keyword lists.
//! The evaluation order is a contract: help beats everything, record
//! creation beats record analysis, and analysis only applies when decoded
//! records are available in context. Storage-worthiness is a separate
//! classifier with its own list; it is orthogonal to creation intent.
//! ============================================================================

use crate::types::Intent;

/// Keywords that make a query a help command
const HELP_KEYWORDS: &[&str] = &[
    "ayuda",
    "help",
    "qué puedes hacer",
    "que puedes hacer",
    "comandos",
    "funciones",
    "capacidades",
    "what can you do",
];

/// Keywords that make a query a record-creation request
const RECORD_CREATION_KEYWORDS: &[&str] = &[
    "crear registro",
    "crear un registro",
    "registrar",
    "anotar",
    "guardar",
    "almacenar",
    "tomar nota",
    "documentar",
    "apuntar",
];

/// Keywords that make a query a request to analyze stored records.
/// Spanish and English variants are matched against the same query.
const RECORD_ANALYSIS_KEYWORDS: &[&str] = &[
    // Spanish
    "analiza",
    "analizar",
    "resumen",
    "resumir",
    "estadísticas",
    "estadística",
    "tendencia",
    "tendencias",
    "patrones",
    "patrón",
    "historial",
    "historia",
    "registros",
    "registro",
    "datos",
    "dato",
    "información",
    "comparar",
    "comparación",
    "evaluar",
    "evaluación",
    "reportar",
    "reporte",
    "mostrar mis",
    "ver mis",
    "cuándo",
    "cuando",
    "cuántas veces",
    "cuantas veces",
    "qué he",
    "que he",
    "cuál es",
    "cual es",
    "dime si",
    "cuánto",
    "cuanto",
    // English
    "analyze",
    "summary",
    "statistics",
    "trend",
    "pattern",
    "history",
    "record",
    "data",
    "information",
    "compare",
    "evaluate",
    "report",
    "show my",
    "view my",
    "when",
    "how many times",
    "what have i",
    "what is",
    "tell me",
];

/// Keywords that mark a generic query as worth persisting to the ledger
const STORAGE_KEYWORDS: &[&str] = &[
    "registrar",
    "guardar",
    "almacenar",
    "anotar",
    "documentar",
    "cosecha",
    "siembra",
    "fertilización",
    "riego",
    "cultivo",
];

fn contains_any(lower_query: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| lower_query.contains(k))
}

/// Label a query. `has_records` says whether decoded records are available
/// in context; without them the analysis branch is unreachable.
pub fn classify(query: &str, has_records: bool) -> Intent {
    let lower = query.to_lowercase();

    if contains_any(&lower, HELP_KEYWORDS) {
        return Intent::Help;
    }
    if contains_any(&lower, RECORD_CREATION_KEYWORDS) {
        return Intent::RecordCreation;
    }
    if has_records && contains_any(&lower, RECORD_ANALYSIS_KEYWORDS) {
        return Intent::RecordAnalysis;
    }
    Intent::Generic
}

/// Whether the query looks like it targets stored records. Used to decide
/// whether fetching topic messages is worth the mirror round-trip before the
/// final classification runs.
pub fn is_analysis_query(query: &str) -> bool {
    contains_any(&query.to_lowercase(), RECORD_ANALYSIS_KEYWORDS)
}

/// Storage-worthiness of a generic query. Independent of creation intent.
pub fn needs_ledger_storage(query: &str) -> bool {
    contains_any(&query.to_lowercase(), STORAGE_KEYWORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_keyword_classifies_as_help() {
        assert_eq!(classify("ayuda", false), Intent::Help);
        assert_eq!(classify("AYUDA por favor", true), Intent::Help);
        assert_eq!(classify("help me out", false), Intent::Help);
        assert_eq!(classify("¿Qué puedes hacer?", false), Intent::Help);
    }

    #[test]
    fn help_beats_record_creation() {
        // Contains both "ayuda" and "registrar"
        let query = "ayuda, quiero registrar una cosecha";
        assert_eq!(classify(query, true), Intent::Help);
    }

    #[test]
    fn creation_keyword_classifies_as_creation() {
        assert_eq!(
            classify("Quiero registrar que hoy sembré maíz", false),
            Intent::RecordCreation
        );
        assert_eq!(classify("toma nota de esto", false), Intent::Generic);
        assert_eq!(classify("tomar nota de esto", false), Intent::RecordCreation);
    }

    #[test]
    fn creation_beats_analysis() {
        // "registrar" (creation) and "resumen" (analysis) both present
        let query = "registrar un resumen de la siembra";
        assert_eq!(classify(query, true), Intent::RecordCreation);
    }

    #[test]
    fn analysis_requires_records_in_context() {
        let query = "muestra un resumen de mis registros";
        assert_eq!(classify(query, true), Intent::RecordAnalysis);
        assert_eq!(classify(query, false), Intent::Generic);
    }

    #[test]
    fn english_analysis_keywords_match() {
        assert_eq!(classify("show my planting history", true), Intent::RecordAnalysis);
        assert_eq!(classify("how many times did I irrigate", true), Intent::RecordAnalysis);
    }

    #[test]
    fn plain_question_is_generic() {
        assert_eq!(
            classify("cómo controlo la broca del café", false),
            Intent::Generic
        );
    }

    #[test]
    fn storage_classifier_is_orthogonal() {
        // Creation keyword also appears in the storage list
        assert!(needs_ledger_storage("quiero guardar esto"));
        // Crop-activity words trigger storage without any creation intent
        assert!(needs_ledger_storage("la cosecha de este año fue buena"));
        assert_eq!(
            classify("la cosecha de este año fue buena", false),
            Intent::Generic
        );
        // Generic advice question stores nothing
        assert!(!needs_ledger_storage("cómo mejoro el suelo arcilloso"));
    }

    #[test]
    fn analysis_candidate_check_ignores_record_context() {
        assert!(is_analysis_query("muestra un resumen de mis registros"));
        assert!(!is_analysis_query("hola, cómo estás"));
    }
}
