use crate::error::{EnsembleError, Result};
use crate::types::{MAX_CANDIDATE, MIN_CANDIDATE};
use polars::prelude::*;
use super::types::RequiredColumn;
use std::collections::HashMap;

pub struct DataValidator;

impl DataValidator {
    /// Validate that the DataFrame has a round column and six numeric number columns
    pub fn validate_draw_columns(df: &DataFrame) -> Result<HashMap<RequiredColumn, String>> {
        let mut column_map = HashMap::new();

        for required in RequiredColumn::all() {
            match Self::find_column(df, &required) {
                Some(col_name) => {
                    column_map.insert(required, col_name);
                }
                None => {
                    return Err(EnsembleError::DataLoading(format!(
                        "Missing required column: {} (tried aliases: {:?})",
                        required.as_str(),
                        required.aliases()
                    )));
                }
            }
        }

        for (req_col, actual_name) in &column_map {
            let column = df.column(actual_name)?;
            if !matches!(
                column.dtype(),
                DataType::Int64
                    | DataType::Int32
                    | DataType::UInt64
                    | DataType::UInt32
                    | DataType::Float64
            ) {
                return Err(EnsembleError::DataLoading(format!(
                    "Column '{}' ({}) must be numeric, found {:?}",
                    actual_name,
                    req_col.as_str(),
                    column.dtype()
                )));
            }
        }

        Self::validate_number_range(df, &column_map)?;

        Ok(column_map)
    }

    /// Find column by checking aliases
    fn find_column(df: &DataFrame, required: &RequiredColumn) -> Option<String> {
        let columns = df.get_column_names();
        required
            .aliases()
            .into_iter()
            .find(|alias| columns.iter().any(|col| col.as_str() == alias.as_str()))
    }

    fn validate_number_range(
        df: &DataFrame,
        column_map: &HashMap<RequiredColumn, String>,
    ) -> Result<()> {
        for position in 1..=6u8 {
            let name = &column_map[&RequiredColumn::Number(position)];
            let column = df.column(name)?.cast(&DataType::Int64)?;
            let values = column.i64()?;

            for (row, value) in values.into_iter().enumerate() {
                match value {
                    Some(v) if v >= MIN_CANDIDATE as i64 && v <= MAX_CANDIDATE as i64 => {}
                    Some(v) => {
                        return Err(EnsembleError::DataLoading(format!(
                            "Invalid data at row {}: {} = {} outside {}..={}",
                            row, name, v, MIN_CANDIDATE, MAX_CANDIDATE
                        )));
                    }
                    None => {
                        return Err(EnsembleError::DataLoading(format!(
                            "Invalid data at row {}: {} is empty",
                            row, name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Check for minimum required rows
    pub fn validate_minimum_rows(df: &DataFrame, min_rows: usize) -> Result<()> {
        if df.height() < min_rows {
            return Err(EnsembleError::DataLoading(format!(
                "Insufficient data: {} rows, minimum {} required",
                df.height(),
                min_rows
            )));
        }
        Ok(())
    }

    /// Check for null values in any column
    pub fn check_nulls(df: &DataFrame) -> Result<Vec<(String, usize)>> {
        let mut null_report = Vec::new();

        for col_name in df.get_column_names() {
            let column = df.column(col_name.as_str())?;
            let null_count = column.null_count();
            if null_count > 0 {
                null_report.push((col_name.to_string(), null_count));
            }
        }

        Ok(null_report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_validate_good_data() {
        let df = df! {
            "round" => &[1i64, 2],
            "n1" => &[1i64, 4],
            "n2" => &[7i64, 9],
            "n3" => &[12i64, 18],
            "n4" => &[23i64, 27],
            "n5" => &[34i64, 40],
            "n6" => &[45i64, 44],
        }
        .unwrap();

        let result = DataValidator::validate_draw_columns(&df);
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_missing_column() {
        let df = df! {
            "round" => &[1i64],
            "n1" => &[1i64],
            "n2" => &[7i64],
            "n3" => &[12i64],
            "n4" => &[23i64],
            // Missing n5
            "n6" => &[45i64],
        }
        .unwrap();

        assert!(DataValidator::validate_draw_columns(&df).is_err());
    }

    #[test]
    fn test_validate_out_of_range() {
        let df = df! {
            "round" => &[1i64],
            "n1" => &[0i64],
            "n2" => &[7i64],
            "n3" => &[12i64],
            "n4" => &[23i64],
            "n5" => &[34i64],
            "n6" => &[46i64],
        }
        .unwrap();

        assert!(DataValidator::validate_draw_columns(&df).is_err());
    }

    #[test]
    fn test_column_aliases() {
        let df = df! {
            "drwNo" => &[1i64],
            "drwtNo1" => &[1i64],
            "drwtNo2" => &[7i64],
            "drwtNo3" => &[12i64],
            "drwtNo4" => &[23i64],
            "drwtNo5" => &[34i64],
            "drwtNo6" => &[45i64],
        }
        .unwrap();

        let map = DataValidator::validate_draw_columns(&df).unwrap();
        assert_eq!(map[&RequiredColumn::Round], "drwNo");
    }
}
