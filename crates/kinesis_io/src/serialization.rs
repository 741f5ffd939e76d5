//! JSON and HexDNA encodings.
//!
//! HexDNA is the hex encoding of a value's compact JSON. It is the export
//! format for genomes: one opaque token that survives copy and paste.

use crate::error::{IoError, Result};
use kinesis_core::GenomeLogic;
use kinesis_data::Genome;
use serde::{de::DeserializeOwned, Serialize};

pub fn to_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string(data)
        .map_err(|e| IoError::serialization(format!("JSON serialization failed: {e}")))
}

/// Deserializes a JSON string. Blank input is rejected before parsing.
pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    if json.trim().is_empty() {
        return Err(IoError::validation("Empty JSON string"));
    }
    serde_json::from_str(json)
        .map_err(|e| IoError::serialization(format!("JSON deserialization failed: {e}")))
}

pub fn to_hex_dna<T: Serialize>(data: &T) -> Result<String> {
    Ok(hex::encode(to_json(data)?.as_bytes()))
}

pub fn from_hex_dna<T: DeserializeOwned>(hex_str: &str) -> Result<T> {
    let trimmed = hex_str.trim();
    if trimmed.is_empty() {
        return Err(IoError::validation("Empty HexDNA string"));
    }
    let bytes = hex::decode(trimmed)
        .map_err(|e| IoError::validation(format!("Invalid hex encoding: {e}")))?;
    let json = String::from_utf8(bytes)
        .map_err(|e| IoError::validation(format!("Invalid UTF-8 in HexDNA: {e}")))?;
    from_json(&json)
}

/// Decodes a HexDNA genome and rejects it unless it could be instantiated.
pub fn genome_from_hex_dna(hex_str: &str) -> Result<Genome> {
    let genome: Genome = from_hex_dna(hex_str)?;
    genome
        .validate()
        .map_err(|e| IoError::validation(e.to_string()))?;
    Ok(genome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinesis_core::config::GenomeConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn genome() -> Genome {
        Genome::new_random_with_rng(&GenomeConfig::default(), &mut ChaCha8Rng::seed_from_u64(5))
    }

    #[test]
    fn test_genome_hex_dna_roundtrip() {
        let original = genome();
        let dna = to_hex_dna(&original).unwrap();
        assert!(dna.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(genome_from_hex_dna(&dna).unwrap(), original);
    }

    #[test]
    fn test_blank_input_rejected() {
        assert!(matches!(
            from_json::<Genome>("   "),
            Err(IoError::Validation(_))
        ));
        assert!(matches!(
            from_hex_dna::<Genome>(""),
            Err(IoError::Validation(_))
        ));
    }

    #[test]
    fn test_malformed_hex_rejected() {
        assert!(from_hex_dna::<Genome>("zz-not-hex").is_err());
        assert!(from_hex_dna::<Genome>("7b7d").is_err());
    }

    #[test]
    fn test_invalid_genome_rejected() {
        let mut broken = genome();
        broken.springs[1].rest_length = 0.0;
        let dna = to_hex_dna(&broken).unwrap();
        match genome_from_hex_dna(&dna) {
            Err(IoError::Validation(msg)) => assert!(msg.contains("springs[1].rest_length")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
