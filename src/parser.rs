//! Gzip-compressed CSV decoding and encoding.
//!
//! Every table the calculator exchanges with object storage (occurrences,
//! ASID lookups, telemetry, registrations) is a gzip CSV with a header row.

use anyhow::Result;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};

/// Lazily deserializes rows of a gzip CSV stream.
///
/// The returned iterator is single-pass: rows are decoded as they are pulled.
pub fn gzip_csv_rows<T, R>(reader: R) -> impl Iterator<Item = csv::Result<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(GzDecoder::new(reader))
        .into_deserialize()
}

/// Decodes every row of a gzip CSV held in memory.
///
/// # Errors
///
/// Returns an error if the bytes are not gzip, or any row fails to deserialize.
pub fn parse_gzip_csv<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    Ok(gzip_csv_rows(bytes).collect::<csv::Result<Vec<T>>>()?)
}

/// Decodes a plain (uncompressed) CSV body, as returned by the search API.
pub fn parse_csv<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    Ok(rdr.deserialize().collect::<csv::Result<Vec<T>>>()?)
}

/// Serializes `rows` as CSV with a header row and gzip-compresses the result.
pub fn to_gzip_csv<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let plain = writer.into_inner().map_err(|e| anyhow::anyhow!("{}", e.error()))?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&plain)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        name: String,
        count: u64,
    }

    #[test]
    fn test_gzip_csv_rows_are_decoded_in_order() {
        let bytes = to_gzip_csv(&[
            Row { name: "a".into(), count: 1 },
            Row { name: "b".into(), count: 2 },
        ])
        .unwrap();

        let rows: Vec<Row> = parse_gzip_csv(&bytes).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "a");
        assert_eq!(rows[1].count, 2);
    }

    #[test]
    fn test_header_only_file_has_no_rows() {
        let rows: Vec<Row> = Vec::new();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"name,count\n").unwrap();
        let bytes = encoder.finish().unwrap();

        assert_eq!(parse_gzip_csv::<Row>(&bytes).unwrap(), rows);
    }

    #[test]
    fn test_plain_bytes_are_not_gzip() {
        let result = parse_gzip_csv::<Row>(b"name,count\na,1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_csv_trims_fields() {
        let rows: Vec<Row> = parse_csv(b"name,count\n  a , 7\n").unwrap();
        assert_eq!(rows, vec![Row { name: "a".into(), count: 7 }]);
    }
}
