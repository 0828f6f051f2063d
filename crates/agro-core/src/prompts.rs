//! ============================================================================
//! Prompt Assembly - Instructions for the completion endpoint
//! ============================================================================
//! Builds the system instruction per intent branch and formats stored
//! entries into the human-readable digest embedded in analysis prompts.
//! User-facing copy is Spanish, matching the product audience.
//! ============================================================================

use chrono::DateTime;

use crate::codec::StoredEntry;
use crate::types::FarmRecord;

/// Guidance returned when the completion reply could not be parsed into a
/// structured record
pub const RETRY_GUIDANCE: &str = "No pude formatear correctamente tu registro. Por favor, \
proporciona los detalles de forma más clara, incluyendo qué actividad realizaste, qué \
cultivos estaban involucrados y cuándo ocurrió.";

/// Shown when an analysis prompt is built without any decodable entries
pub const EMPTY_DIGEST: &str = "No hay registros disponibles para analizar.";

/// Instruction for the structured-extraction branch
pub fn record_creation_instruction(query: &str) -> String {
    format!(
        "Eres un asistente agrícola experto que ayuda a formatear registros agrícolas para \
almacenarlos en blockchain.\n\n\
El agricultor desea crear un registro con la siguiente información: \"{}\"\n\n\
Extrae y formatea la información agrícola relevante en formato JSON estructurado con los \
siguientes campos:\n\
- activityType: tipo de actividad (siembra, cosecha, fertilización, riego, etc.)\n\
- description: descripción detallada de la actividad\n\
- location: ubicación donde se realizó (si se menciona)\n\
- crops: cultivos involucrados\n\
- date: fecha de la actividad (formateada como YYYY-MM-DD)\n\
- time: hora de la actividad (si se menciona)\n\
- notes: notas adicionales relevantes\n\n\
Solo devuelve el JSON formateado, sin explicaciones adicionales.",
        query
    )
}

/// Instruction for the stored-record analysis branch
pub fn record_analysis_instruction(query: &str, digest: &str) -> String {
    format!(
        "Eres un asistente agrícola experto que analiza registros agrícolas almacenados en \
blockchain.\n\n\
El agricultor ha realizado la siguiente consulta sobre sus registros: \"{}\"\n\n\
A continuación se presentan los registros disponibles:\n{}\n\n\
Analiza estos registros para responder a la consulta del agricultor. Puedes:\n\
- Proporcionar estadísticas y tendencias\n\
- Resumir actividades por tipo o cultivo\n\
- Identificar patrones o problemas\n\
- Sugerir mejoras en base a las prácticas observadas\n\n\
Responde de forma clara y concisa, organizando la información de manera útil para el \
agricultor.",
        query, digest
    )
}

/// Persona instruction for the generic-advice branch
pub fn generic_instruction(has_records: bool) -> String {
    let mut instruction = String::from(
        "Eres un asistente agrícola experto que ayuda a los agricultores colombianos a mejorar \
sus prácticas agrícolas. Ofrece respuestas concisas y prácticas sobre cultivos, técnicas \
agrícolas y gestión de fincas. Si la pregunta está relacionada con el registro o la consulta \
de datos de cultivos, indícalo en tu respuesta sugiriendo el uso de la función de registro en \
la cadena de bloques Hedera. Recomienda buenas prácticas agrícolas sostenibles y enfócate en \
cultivos relevantes para Colombia.",
    );
    if has_records {
        instruction.push_str(
            "\n\nEl agricultor tiene registros almacenados en blockchain que puede consultar \
para análisis.",
        );
    }
    instruction
}

/// Fixed capability summary for help commands. Served locally, no
/// completion call involved.
pub fn help_text() -> &'static str {
    "# 🌱 AgroLedger - Asistente Agrícola con Blockchain\n\n\
## ¿Qué puedo hacer por ti?\n\n\
### 📝 Crear registros agrícolas\n\
Puedes decirme que quieres crear un registro y describir la actividad. Por ejemplo:\n\
- \"Quiero registrar que hoy sembré maíz en la parcela norte\"\n\
- \"Crea un registro de la cosecha de café que hice ayer\"\n\
- \"Registra que apliqué fertilizante orgánico esta mañana\"\n\n\
### 💬 Consultas agrícolas\n\
Puedo responder preguntas sobre:\n\
- Técnicas de cultivo\n\
- Manejo de plagas\n\
- Fertilización\n\
- Riego\n\
- Cosecha\n\
- Almacenamiento de productos\n\n\
### 📊 Análisis de datos\n\
Puedo analizar tus registros almacenados:\n\
- \"Muestra un resumen de mis registros de siembra\"\n\
- \"¿Cuántas veces apliqué fertilizante este mes?\"\n\
- \"Analiza mis patrones de riego\"\n\
- \"Dame estadísticas sobre los cultivos registrados\"\n\n\
### 🔗 Gestión de topics de Hedera\n\
Tus registros se guardan en un topic de Hedera:\n\
- Puedes usar uno existente o crear uno nuevo\n\
- Toda la información importante se guarda de forma segura en la blockchain de Hedera\n\n\
Los datos almacenados en blockchain garantizan la trazabilidad e inmutabilidad de tus \
registros agrícolas."
}

/// Confirmation answer once a record has been extracted successfully
pub fn record_confirmation(record: &FarmRecord) -> String {
    let mut answer = format!(
        "He formateado tu registro con éxito. Los siguientes datos se almacenarán en la \
blockchain de Hedera:\n\n\
Tipo de actividad: {}\n\
Descripción: {}\n\
Cultivos: {}\n\
Fecha: {}",
        record.activity_type, record.description, record.crops, record.date
    );
    if let Some(time) = &record.time {
        answer.push_str(&format!("\nHora: {}", time));
    }
    if let Some(location) = &record.location {
        answer.push_str(&format!("\nUbicación: {}", location));
    }
    if let Some(notes) = &record.notes {
        answer.push_str(&format!("\nNotas adicionales: {}", notes));
    }
    answer
}

/// Format decoded entries into the numbered digest embedded in analysis
/// prompts. Unrecognized entries are skipped; numbering runs over the
/// entries that made it in.
pub fn format_entries(entries: &[StoredEntry]) -> String {
    let mut digest = String::new();
    let mut index = 0usize;

    for entry in entries {
        match entry {
            StoredEntry::Record(envelope) => {
                index += 1;
                let record = &envelope.record;
                digest.push_str(&format!(
                    "Registro #{} ({}):\n- Tipo: {}\n- Descripción: {}\n- Cultivos: {}\n- Fecha de actividad: {}\n",
                    index,
                    localized_date(&envelope.timestamp),
                    record.activity_type,
                    record.description,
                    record.crops,
                    record.date
                ));
                if let Some(time) = &record.time {
                    digest.push_str(&format!("- Hora: {}\n", time));
                }
                if let Some(location) = &record.location {
                    digest.push_str(&format!("- Ubicación: {}\n", location));
                }
                if let Some(notes) = &record.notes {
                    digest.push_str(&format!("- Notas: {}\n", notes));
                }
            }
            StoredEntry::Query(envelope) => {
                index += 1;
                digest.push_str(&format!(
                    "Consulta #{} ({}):\n- Consulta: {}\n- Tipo: Consulta general\n",
                    index,
                    localized_date(&envelope.timestamp),
                    envelope.query
                ));
            }
            StoredEntry::Unrecognized => {}
        }
    }

    if digest.is_empty() {
        EMPTY_DIGEST.to_string()
    } else {
        digest
    }
}

/// Strip markdown code-fence wrapping from a completion reply
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Envelope timestamps are RFC 3339; render day/month/year for the digest,
/// falling back to the raw string for anything unparsable.
fn localized_date(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{QueryLogEnvelope, RecordEnvelope};

    fn record_entry(activity: &str) -> StoredEntry {
        StoredEntry::Record(RecordEnvelope {
            record: FarmRecord {
                activity_type: activity.to_string(),
                description: format!("{} de prueba", activity),
                location: None,
                crops: "maíz".into(),
                date: "2025-03-14".into(),
                time: None,
                notes: None,
            },
            timestamp: "2025-03-14T09:30:00.000Z".into(),
        })
    }

    #[test]
    fn digest_numbers_entries_and_skips_unrecognized() {
        let entries = vec![
            record_entry("siembra"),
            StoredEntry::Unrecognized,
            record_entry("riego"),
            StoredEntry::Query(QueryLogEnvelope {
                query: "cómo va el café".into(),
                timestamp: "2025-03-15T10:00:00.000Z".into(),
            }),
        ];
        let digest = format_entries(&entries);
        assert!(digest.contains("Registro #1"));
        assert!(digest.contains("Registro #2"));
        assert!(digest.contains("Consulta #3"));
        assert!(!digest.contains("#4"));
        assert_eq!(digest.matches("Registro #").count(), 2);
        assert_eq!(digest.matches("Consulta #").count(), 1);
    }

    #[test]
    fn digest_localizes_dates() {
        let digest = format_entries(&[record_entry("siembra")]);
        assert!(digest.contains("(14/03/2025)"));
    }

    #[test]
    fn digest_includes_optional_fields_only_when_present() {
        let entry = StoredEntry::Record(RecordEnvelope {
            record: FarmRecord {
                activity_type: "cosecha".into(),
                description: "cosecha de café".into(),
                location: Some("lote 3".into()),
                crops: "café".into(),
                date: "2025-05-20".into(),
                time: Some("06:00".into()),
                notes: None,
            },
            timestamp: "2025-05-20T11:00:00.000Z".into(),
        });
        let digest = format_entries(&[entry]);
        assert!(digest.contains("- Hora: 06:00"));
        assert!(digest.contains("- Ubicación: lote 3"));
        assert!(!digest.contains("- Notas:"));
    }

    #[test]
    fn empty_digest_has_fallback_text() {
        assert_eq!(format_entries(&[]), EMPTY_DIGEST);
        assert_eq!(format_entries(&[StoredEntry::Unrecognized]), EMPTY_DIGEST);
    }

    #[test]
    fn strips_json_code_fences() {
        let fenced = "```json\n{\"activityType\":\"siembra\"}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"activityType\":\"siembra\"}");

        let bare = "```\n{\"a\":1}\n```";
        assert_eq!(strip_code_fences(bare), "{\"a\":1}");

        let plain = "  {\"a\":1}  ";
        assert_eq!(strip_code_fences(plain), "{\"a\":1}");
    }

    #[test]
    fn confirmation_lists_optional_fields_when_present() {
        let record = FarmRecord {
            activity_type: "siembra".into(),
            description: "siembra de maíz".into(),
            location: Some("parcela norte".into()),
            crops: "maíz".into(),
            date: "2025-03-14".into(),
            time: None,
            notes: Some("semilla criolla".into()),
        };
        let answer = record_confirmation(&record);
        assert!(answer.contains("Tipo de actividad: siembra"));
        assert!(answer.contains("Ubicación: parcela norte"));
        assert!(answer.contains("Notas adicionales: semilla criolla"));
        assert!(!answer.contains("Hora:"));
    }

    #[test]
    fn generic_instruction_mentions_records_only_in_context() {
        assert!(!generic_instruction(false).contains("registros almacenados"));
        assert!(generic_instruction(true).contains("registros almacenados"));
    }
}
