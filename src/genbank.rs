//! Conversion of GenBank flat-text efetch output into [`SequenceRecord`]s.

use gb_io::reader::SeqReader;
use gb_io::seq::Seq;

use crate::domain::SequenceRecord;
use crate::error::KiraError;

pub fn parse_records(text: &str) -> Result<Vec<SequenceRecord>, KiraError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    SeqReader::new(text.as_bytes())
        .map(|result| {
            result
                .map(record_from_seq)
                .map_err(|err| KiraError::RecordParse(err.to_string()))
        })
        .collect()
}

pub fn record_from_seq(seq: Seq) -> SequenceRecord {
    let accession = first_token(seq.version.as_deref())
        .or_else(|| first_token(seq.accession.as_deref()))
        .or_else(|| first_token(seq.name.as_deref()))
        .unwrap_or_else(|| "<unknown>".to_string());

    // CON records carry no ORIGIN block; fall back to the LOCUS length.
    let length = if seq.seq.is_empty() {
        seq.len.unwrap_or(0)
    } else {
        seq.seq.len()
    };

    let description = seq
        .definition
        .as_deref()
        .map(normalize_definition)
        .unwrap_or_default();

    SequenceRecord {
        accession,
        length,
        description,
    }
}

fn first_token(value: Option<&str>) -> Option<String> {
    value
        .and_then(|v| v.split_whitespace().next())
        .map(|v| v.to_string())
}

fn normalize_definition(definition: &str) -> String {
    let joined = definition.split_whitespace().collect::<Vec<_>>().join(" ");
    match joined.strip_suffix('.') {
        Some(stripped) => stripped.to_string(),
        None => joined,
    }
}
