use crate::data::history::DrawHistory;
use crate::error::{EnsembleError, Result};
use crate::types::HistoricalDraw;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use super::{
    types::{DatasetMetadata, RequiredColumn},
    validator::DataValidator,
};

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| EnsembleError::DataLoading(format!("Failed to read CSV: {}", e)))?;

        Ok(df)
    }

    /// Load, validate, and convert a draw file into a history
    pub fn load_history<P: AsRef<Path>>(path: P, min_rows: usize) -> Result<DrawHistory> {
        let df = Self::load(&path)?;

        let null_report = DataValidator::check_nulls(&df)?;
        if !null_report.is_empty() {
            log::warn!("Null values detected: {:?}", null_report);
        }

        let column_map = DataValidator::validate_draw_columns(&df)?;
        DataValidator::validate_minimum_rows(&df, min_rows)?;

        let history = Self::to_history(&df, &column_map)?;
        log::info!(
            "Loaded {} draws from {}",
            history.len(),
            path.as_ref().display()
        );
        Ok(history)
    }

    /// Convert validated columns into draws ordered by round.
    ///
    /// Rows may arrive in any order; rounds must still be distinct.
    pub fn to_history(
        df: &DataFrame,
        column_map: &HashMap<RequiredColumn, String>,
    ) -> Result<DrawHistory> {
        let round_column = column_map[&RequiredColumn::Round].as_str();
        let df = df.sort(vec![round_column], SortMultipleOptions::default())?;
        let rounds = df.column(round_column)?.cast(&DataType::Int64)?;
        let rounds = rounds.i64()?;

        let mut number_columns = Vec::with_capacity(6);
        for position in 1..=6u8 {
            let column = df
                .column(&column_map[&RequiredColumn::Number(position)])?
                .cast(&DataType::Int64)?;
            number_columns.push(column);
        }

        let mut draws = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let round = rounds.get(row).ok_or_else(|| {
                EnsembleError::DataLoading(format!("Missing round number at row {}", row))
            })?;
            let round = u32::try_from(round).map_err(|_| {
                EnsembleError::DataLoading(format!("Invalid round number {} at row {}", round, row))
            })?;

            let mut numbers = [0u8; 6];
            for (slot, column) in numbers.iter_mut().zip(&number_columns) {
                let value = column.i64()?.get(row).ok_or_else(|| {
                    EnsembleError::DataLoading(format!("Missing number at row {}", row))
                })?;
                *slot = value as u8;
            }

            let draw = HistoricalDraw::new(round, &numbers)
                .map_err(|e| EnsembleError::DataLoading(format!("Row {}: {}", row, e)))?;
            draws.push(draw);
        }

        DrawHistory::new(draws)
    }

    pub fn create_metadata<P: AsRef<Path>>(path: P, history: &DrawHistory) -> DatasetMetadata {
        DatasetMetadata {
            file_path: path.as_ref().to_string_lossy().to_string(),
            num_rows: history.len(),
            first_round: history.get(0).map(|d| d.round),
            last_round: history.last().map(|d| d.round),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_to_history_orders_numbers() {
        let df = df! {
            "round" => &[10i64, 11],
            "n1" => &[45i64, 4],
            "n2" => &[7i64, 9],
            "n3" => &[12i64, 18],
            "n4" => &[23i64, 27],
            "n5" => &[34i64, 40],
            "n6" => &[1i64, 44],
        }
        .unwrap();

        let map = DataValidator::validate_draw_columns(&df).unwrap();
        let history = CsvConnector::to_history(&df, &map).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(0).unwrap().numbers.numbers(), &[1, 7, 12, 23, 34, 45]);
        assert_eq!(history.last().unwrap().round, 11);
    }

    #[test]
    fn test_duplicate_numbers_rejected() {
        let df = df! {
            "round" => &[1i64],
            "n1" => &[5i64],
            "n2" => &[5i64],
            "n3" => &[12i64],
            "n4" => &[23i64],
            "n5" => &[34i64],
            "n6" => &[45i64],
        }
        .unwrap();

        let map = DataValidator::validate_draw_columns(&df).unwrap();
        assert!(CsvConnector::to_history(&df, &map).is_err());
    }

    #[test]
    fn test_newest_first_rows_are_reordered() {
        let df = df! {
            "round" => &[3i64, 2, 1],
            "n1" => &[3i64, 2, 1],
            "n2" => &[10i64, 11, 12],
            "n3" => &[20i64, 21, 22],
            "n4" => &[30i64, 31, 32],
            "n5" => &[40i64, 41, 42],
            "n6" => &[45i64, 44, 43],
        }
        .unwrap();

        let map = DataValidator::validate_draw_columns(&df).unwrap();
        let history = CsvConnector::to_history(&df, &map).unwrap();
        let rounds: Vec<u32> = (0..history.len()).map(|i| history.get(i).unwrap().round).collect();
        assert_eq!(rounds, vec![1, 2, 3]);
        assert_eq!(history.get(0).unwrap().numbers.numbers(), &[1, 12, 22, 32, 42, 43]);
    }

    #[test]
    fn test_repeated_round_rejected_after_sorting() {
        let df = df! {
            "round" => &[2i64, 1, 2],
            "n1" => &[1i64, 1, 1],
            "n2" => &[2i64, 2, 2],
            "n3" => &[3i64, 3, 3],
            "n4" => &[4i64, 4, 4],
            "n5" => &[5i64, 5, 5],
            "n6" => &[6i64, 6, 6],
        }
        .unwrap();

        let map = DataValidator::validate_draw_columns(&df).unwrap();
        assert!(CsvConnector::to_history(&df, &map).is_err());
    }
}
