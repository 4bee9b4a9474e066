//! Arrow record batches as an ingestion source

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;

use crate::store::RawRow;
use crate::DataError;

/// Flatten a record batch into raw rows. Null cells are left out, so a
/// declared dimension with a null value fails the load as a missing field.
pub fn rows_from_batch(batch: &RecordBatch) -> Result<Vec<RawRow>, DataError> {
    let schema = batch.schema();
    let mut rows = vec![RawRow::new(); batch.num_rows()];

    for (col_idx, field) in schema.fields().iter().enumerate() {
        let column = batch.column(col_idx);
        for (row_idx, row) in rows.iter_mut().enumerate() {
            if column.is_null(row_idx) {
                continue;
            }
            row.insert(field.name().clone(), array_value_to_string(column, row_idx)?);
        }
    }

    Ok(rows)
}
