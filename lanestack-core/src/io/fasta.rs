//! Read-sequence loading
//!
//! Reports carry coordinates into the reads but not the reads themselves;
//! the sequences come from a FASTA/FASTQ file keyed by read name.

use std::collections::HashMap;
use std::path::Path;

use needletail::parse_fastx_file;

use crate::source::SourceError;
use crate::types::first_word;

/// Loads all sequences from a FASTA/FASTQ file (optionally gzipped), keyed
/// by the first word of each record's header. Later duplicates of a name are
/// ignored.
pub fn read_sequences<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>, SourceError> {
    let mut reader =
        parse_fastx_file(&path).map_err(|error| SourceError::InvalidFasta(error.to_string()))?;
    let mut sequences = HashMap::new();
    while let Some(record) = reader.next() {
        let record = record.map_err(|error| SourceError::InvalidFasta(error.to_string()))?;
        let header = String::from_utf8_lossy(record.id()).to_string();
        let name = first_word(&header).to_string();
        let sequence = String::from_utf8_lossy(&record.seq()).to_string();
        sequences.entry(name).or_insert(sequence);
    }
    log::debug!("Loaded {} read sequences", sequences.len());
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_sequences() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ">read1 first sample").unwrap();
        writeln!(file, "ATGGCC").unwrap();
        writeln!(file, "AAA").unwrap();
        writeln!(file, ">read2").unwrap();
        writeln!(file, "GGCCAT").unwrap();
        file.flush().unwrap();

        let sequences = read_sequences(file.path()).unwrap();
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences["read1"], "ATGGCCAAA");
        assert_eq!(sequences["read2"], "GGCCAT");
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ">read1\nAAAA\n>read1\nCCCC").unwrap();
        file.flush().unwrap();

        let sequences = read_sequences(file.path()).unwrap();
        assert_eq!(sequences["read1"], "AAAA");
    }

    #[test]
    fn test_missing_file() {
        let result = read_sequences("/no/such/file.fasta");
        assert!(result.is_err());
    }
}
