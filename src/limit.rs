use crate::graph::Row;

/// Maximum number of records handed to summarization. Bounds prompt size and
/// streaming latency for one turn.
pub const HARD_LIMIT_CONTEXT_RECORDS: usize = 10;

/// Keep the first `cap` rows in their original order. No reordering, no
/// deduplication.
pub fn limit_rows(mut rows: Vec<Row>, cap: usize) -> Vec<Row> {
    rows.truncate(cap);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(n: usize) -> Row {
        let mut row = Row::new();
        row.insert("n".to_string(), json!(n));
        row
    }

    #[test]
    fn output_is_a_prefix_of_input() {
        let rows: Vec<Row> = (0..15).map(row).collect();
        let limited = limit_rows(rows.clone(), HARD_LIMIT_CONTEXT_RECORDS);
        assert_eq!(limited.len(), 10);
        assert_eq!(limited[..], rows[..10]);
    }

    #[test]
    fn short_input_passes_through() {
        let rows: Vec<Row> = (0..3).map(row).collect();
        let limited = limit_rows(rows.clone(), HARD_LIMIT_CONTEXT_RECORDS);
        assert_eq!(limited, rows);
    }

    #[test]
    fn length_is_min_of_len_and_cap() {
        for len in [0usize, 1, 9, 10, 11, 40] {
            for cap in [0usize, 1, 10, 25] {
                let rows: Vec<Row> = (0..len).map(row).collect();
                assert_eq!(limit_rows(rows, cap).len(), len.min(cap));
            }
        }
    }
}
