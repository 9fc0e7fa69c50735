//! Row encoding/decoding for storage
//!
//! Key format: `{table_name}#{row_id}` where row_id is 20-digit zero-padded
//! decimal, so keys of one table sort contiguously and in row id order.
//! Value format: column count + type-tagged columns

use super::datum::Datum;
use super::error::{ExecutorError, ExecutorResult};
use super::row::Row;

/// Separator between table name and row id
pub const KEY_SEPARATOR: u8 = b'#';

/// Byte following the separator; bounds a table's key range
const KEY_SEPARATOR_END: u8 = KEY_SEPARATOR + 1;

/// Digits in an encoded row id (enough for `u64::MAX`)
pub const ROW_ID_WIDTH: usize = 20;

/// Encode a table row key
pub fn encode_row_key(table: &str, row_id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(table.len() + 1 + ROW_ID_WIDTH);
    key.extend_from_slice(table.as_bytes());
    key.push(KEY_SEPARATOR);
    key.extend_from_slice(format!("{:0width$}", row_id, width = ROW_ID_WIDTH).as_bytes());
    key
}

/// Decode a table row key
///
/// Returns (table_name, row_id)
pub fn decode_row_key(key: &[u8]) -> ExecutorResult<(String, u64)> {
    let sep_pos = key
        .iter()
        .position(|&b| b == KEY_SEPARATOR)
        .ok_or_else(|| ExecutorError::Encoding("missing # separator".to_string()))?;

    let table = String::from_utf8(key[..sep_pos].to_vec())
        .map_err(|_| ExecutorError::Encoding("invalid table name encoding".to_string()))?;

    let digits = &key[sep_pos + 1..];
    if digits.len() != ROW_ID_WIDTH || !digits.iter().all(u8::is_ascii_digit) {
        return Err(ExecutorError::Encoding(format!(
            "row id must be {} decimal digits",
            ROW_ID_WIDTH
        )));
    }

    let row_id = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| ExecutorError::Encoding("row id out of range".to_string()))?;

    Ok((table, row_id))
}

/// Get the key prefix for scanning all rows in a table
pub fn table_key_prefix(table: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(table.len() + 1);
    prefix.extend_from_slice(table.as_bytes());
    prefix.push(KEY_SEPARATOR);
    prefix
}

/// Get the end key for scanning all rows in a table (exclusive)
pub fn table_key_end(table: &str) -> Vec<u8> {
    let mut end = Vec::with_capacity(table.len() + 1);
    end.extend_from_slice(table.as_bytes());
    end.push(KEY_SEPARATOR_END);
    end
}

// Datum type tags
const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_TEXT: u8 = 4;
const TAG_BYTES: u8 = 5;

/// Encode a row value
///
/// Format: [num_cols:u16][datum...]
/// Each datum: [tag:u8][data...]
pub fn encode_row(row: &Row) -> ExecutorResult<Vec<u8>> {
    let num_cols = u16::try_from(row.len()).map_err(|_| {
        ExecutorError::Encoding(format!("too many columns: {}", row.len()))
    })?;

    let mut buf = Vec::new();
    buf.extend_from_slice(&num_cols.to_le_bytes());

    for datum in row.iter() {
        encode_datum(&mut buf, datum)?;
    }

    Ok(buf)
}

/// Encode a single datum
fn encode_datum(buf: &mut Vec<u8>, datum: &Datum) -> ExecutorResult<()> {
    match datum {
        Datum::Null => {
            buf.push(TAG_NULL);
        }
        Datum::Bool(b) => {
            buf.push(TAG_BOOL);
            buf.push(u8::from(*b));
        }
        Datum::Int(i) => {
            buf.push(TAG_INT);
            buf.extend_from_slice(&i.to_le_bytes());
        }
        Datum::Float(f) => {
            buf.push(TAG_FLOAT);
            buf.extend_from_slice(&f.to_le_bytes());
        }
        Datum::Text(s) => {
            buf.push(TAG_TEXT);
            encode_len_prefixed(buf, s.as_bytes())?;
        }
        Datum::Bytes(b) => {
            buf.push(TAG_BYTES);
            encode_len_prefixed(buf, b)?;
        }
    }
    Ok(())
}

fn encode_len_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) -> ExecutorResult<()> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| ExecutorError::Encoding(format!("value too large: {} bytes", bytes.len())))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Decode a row value
///
/// Rejects truncated input, unknown tags and trailing bytes.
pub fn decode_row(data: &[u8]) -> ExecutorResult<Row> {
    let header: [u8; 2] = read_array(data, 0, "row header")?;
    let num_cols = u16::from_le_bytes(header) as usize;

    let mut offset = 2;
    let mut values = Vec::with_capacity(num_cols);
    for _ in 0..num_cols {
        let (datum, consumed) = decode_datum(&data[offset..])?;
        values.push(datum);
        offset += consumed;
    }

    if offset != data.len() {
        return Err(ExecutorError::Encoding(format!(
            "{} trailing bytes after row",
            data.len() - offset
        )));
    }

    Ok(Row::new(values))
}

/// Decode a row value that must have exactly `arity` columns
pub fn decode_row_checked(data: &[u8], arity: usize) -> ExecutorResult<Row> {
    let row = decode_row(data)?;
    if row.len() != arity {
        return Err(ExecutorError::ColumnCountMismatch {
            expected: arity,
            got: row.len(),
        });
    }
    Ok(row)
}

/// Copy `N` bytes at `offset`, failing on short input
fn read_array<const N: usize>(data: &[u8], offset: usize, what: &str) -> ExecutorResult<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| ExecutorError::Encoding(format!("{} too short", what)))
}

/// Decode a single datum, returns (datum, bytes_consumed)
fn decode_datum(data: &[u8]) -> ExecutorResult<(Datum, usize)> {
    let tag = *data
        .first()
        .ok_or_else(|| ExecutorError::Encoding("unexpected end of datum".to_string()))?;

    match tag {
        TAG_NULL => Ok((Datum::Null, 1)),

        TAG_BOOL => {
            let [b] = read_array::<1>(data, 1, "bool data")?;
            match b {
                0 => Ok((Datum::Bool(false), 2)),
                1 => Ok((Datum::Bool(true), 2)),
                other => Err(ExecutorError::Encoding(format!(
                    "invalid bool byte: {}",
                    other
                ))),
            }
        }

        TAG_INT => {
            let i = i64::from_le_bytes(read_array(data, 1, "int data")?);
            Ok((Datum::Int(i), 9))
        }

        TAG_FLOAT => {
            let f = f64::from_le_bytes(read_array(data, 1, "float data")?);
            Ok((Datum::Float(f), 9))
        }

        TAG_TEXT => {
            let (bytes, consumed) = decode_len_prefixed(data, "string")?;
            let s = String::from_utf8(bytes.to_vec())
                .map_err(|_| ExecutorError::Encoding("invalid utf8 in string".to_string()))?;
            Ok((Datum::Text(s), consumed))
        }

        TAG_BYTES => {
            let (bytes, consumed) = decode_len_prefixed(data, "bytes")?;
            Ok((Datum::Bytes(bytes.to_vec()), consumed))
        }

        _ => Err(ExecutorError::Encoding(format!(
            "unknown datum tag: {}",
            tag
        ))),
    }
}

/// Decode `[len:u32][bytes]` following the tag byte
fn decode_len_prefixed<'a>(data: &'a [u8], what: &str) -> ExecutorResult<(&'a [u8], usize)> {
    let len = u32::from_le_bytes(read_array(data, 1, what)?) as usize;
    let bytes = data
        .get(5..5 + len)
        .ok_or_else(|| ExecutorError::Encoding(format!("{} data too short", what)))?;
    Ok((bytes, 5 + len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_row_key() {
        let key = encode_row_key("users", 12345);
        assert_eq!(key, b"users#00000000000000012345");
        let (table, row_id) = decode_row_key(&key).unwrap();
        assert_eq!(table, "users");
        assert_eq!(row_id, 12345);

        let max = encode_row_key("t", u64::MAX);
        assert_eq!(decode_row_key(&max).unwrap().1, u64::MAX);
    }

    #[test]
    fn test_decode_row_key_rejects_malformed() {
        assert!(decode_row_key(b"tables").is_err());
        assert!(decode_row_key(b"orders#12").is_err());
        assert!(decode_row_key(b"orders#0000000000000000001x").is_err());
        // 20 digits but larger than u64::MAX
        assert!(decode_row_key(b"orders#99999999999999999999").is_err());
    }

    #[test]
    fn test_row_keys_sort_numerically() {
        let two = encode_row_key("t", 2);
        let ten = encode_row_key("t", 10);
        assert!(two < ten);

        let mut keys: Vec<_> = (0..100u64).rev().map(|i| encode_row_key("t", i)).collect();
        keys.sort();
        let ids: Vec<u64> = keys.iter().map(|k| decode_row_key(k).unwrap().1).collect();
        assert_eq!(ids, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_table_key_range() {
        assert_eq!(table_key_prefix("users"), b"users#");
        assert_eq!(table_key_end("users"), b"users$");

        let prefix = table_key_prefix("t");
        let end = table_key_end("t");
        let own = encode_row_key("t", u64::MAX);
        assert!(own >= prefix && own < end);

        // Keys of a longer name sharing the prefix fall outside the range
        let other = encode_row_key("t2", 0);
        assert!(other >= end);
        let other = encode_row_key("ta", 0);
        assert!(other >= end);
    }

    #[test]
    fn test_tables_sort_contiguously() {
        let a_last = encode_row_key("a", u64::MAX);
        let ab_first = encode_row_key("ab", 0);
        let b_first = encode_row_key("b", 0);
        assert!(a_last < ab_first);
        assert!(ab_first < b_first);
    }

    #[test]
    fn test_encode_decode_row() {
        let row = Row::new(vec![
            Datum::Null,
            Datum::Bool(true),
            Datum::Int(42),
            Datum::Float(2.5),
            Datum::Text("hello".to_string()),
            Datum::Bytes(vec![1, 2, 3]),
        ]);

        let encoded = encode_row(&row).unwrap();
        let decoded = decode_row(&encoded).unwrap();
        assert_eq!(decoded, row);
    }

    #[test]
    fn test_delimiter_and_sentinel_text_survive() {
        let row = Row::new(vec![
            Datum::Text("a,b,c".to_string()),
            Datum::Text("NULL".to_string()),
            Datum::Null,
            Datum::Text(String::new()),
        ]);
        let decoded = decode_row(&encode_row(&row).unwrap()).unwrap();
        assert_eq!(decoded, row);
        assert_ne!(decoded.get(1), Some(&Datum::Null));
        assert_eq!(decoded.get(2), Some(&Datum::Null));
    }

    #[test]
    fn test_encode_decode_empty_row() {
        let encoded = encode_row(&Row::new(vec![])).unwrap();
        assert!(decode_row(&encoded).unwrap().is_empty());
    }

    #[test]
    fn test_decode_checked_arity() {
        let encoded = encode_row(&Row::new(vec![Datum::Int(1), Datum::Int(2)])).unwrap();
        assert_eq!(decode_row_checked(&encoded, 2).unwrap().len(), 2);
        assert!(matches!(
            decode_row_checked(&encoded, 3),
            Err(ExecutorError::ColumnCountMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn test_decode_rejects_corruption() {
        let encoded = encode_row(&Row::new(vec![Datum::Text("hello".to_string())])).unwrap();

        // Truncated
        assert!(decode_row(&encoded[..encoded.len() - 1]).is_err());
        assert!(decode_row(&[]).is_err());

        // Trailing garbage
        let mut extra = encoded.clone();
        extra.push(0);
        assert!(decode_row(&extra).is_err());

        // Unknown tag
        assert!(decode_row(&[1, 0, 99]).is_err());

        // Bad bool byte
        assert!(decode_row(&[1, 0, TAG_BOOL, 7]).is_err());

        // Invalid utf8
        assert!(decode_row(&[1, 0, TAG_TEXT, 1, 0, 0, 0, 0xff]).is_err());
    }
}
