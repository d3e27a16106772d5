use super::traits::TrajectoryFile;
use crate::core::models::results::{ResultsError, SimulationMode, SimulationResults};
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use thiserror::Error;

const TIME: &str = "Time";
const POSITION: &str = "Position";
const ENERGY: &str = "Energy";
const CONSTRAINT_FORCE: &str = "ConstraintForce";

#[derive(Debug, Error)]
pub enum TrajectoryIoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Invalid number '{value}' in column '{column}' on row {row}")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Inconsistent trajectory: {0}")]
    Results(#[from] ResultsError),
}

/// Comma-separated trajectory table.
///
/// One header row names the columns `Time`, `Position`, `Energy` and, for RT-cNEO results,
/// `ConstraintForce`. Every value is written in scientific notation with six decimals.
/// Reading infers the method from the presence of the constraint column.
pub struct CsvTrajectory;

impl CsvTrajectory {
    fn column_index(headers: &csv::StringRecord, name: &'static str) -> Option<usize> {
        headers.iter().position(|h| h.trim() == name)
    }

    fn parse(
        record: &csv::StringRecord,
        index: usize,
        row: usize,
        column: &'static str,
    ) -> Result<f64, TrajectoryIoError> {
        let raw = record.get(index).unwrap_or("").trim();
        raw.parse().map_err(|_| TrajectoryIoError::InvalidNumber {
            row,
            column,
            value: raw.to_string(),
        })
    }
}

impl TrajectoryFile for CsvTrajectory {
    type Error = TrajectoryIoError;

    fn read_from(reader: impl Read) -> Result<SimulationResults, Self::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let time_idx =
            Self::column_index(&headers, TIME).ok_or(TrajectoryIoError::MissingColumn(TIME))?;
        let position_idx = Self::column_index(&headers, POSITION)
            .ok_or(TrajectoryIoError::MissingColumn(POSITION))?;
        let energy_idx =
            Self::column_index(&headers, ENERGY).ok_or(TrajectoryIoError::MissingColumn(ENERGY))?;
        let constraint_idx = Self::column_index(&headers, CONSTRAINT_FORCE);

        let mut times = Vec::new();
        let mut positions = Vec::new();
        let mut energies = Vec::new();
        let mut constraint_forces = Vec::new();

        for (i, record) in csv_reader.records().enumerate() {
            let record = record?;
            let row = i + 1;
            times.push(Self::parse(&record, time_idx, row, TIME)?);
            positions.push(Self::parse(&record, position_idx, row, POSITION)?);
            energies.push(Self::parse(&record, energy_idx, row, ENERGY)?);
            constraint_forces.push(match constraint_idx {
                Some(idx) => Self::parse(&record, idx, row, CONSTRAINT_FORCE)?,
                None => 0.0,
            });
        }

        let method = if constraint_idx.is_some() {
            SimulationMode::RtCneo
        } else {
            SimulationMode::RtNeo
        };
        Ok(SimulationResults::new(
            method,
            times,
            positions,
            energies,
            constraint_forces,
            BTreeMap::new(),
        )?)
    }

    fn write_to(results: &SimulationResults, writer: impl Write) -> Result<(), Self::Error> {
        let with_constraint = results.method() == SimulationMode::RtCneo;
        let mut csv_writer = csv::Writer::from_writer(writer);

        if with_constraint {
            csv_writer.write_record([TIME, POSITION, ENERGY, CONSTRAINT_FORCE])?;
        } else {
            csv_writer.write_record([TIME, POSITION, ENERGY])?;
        }

        for i in 0..results.len() {
            let mut row = vec![
                format!("{:.6e}", results.times()[i]),
                format!("{:.6e}", results.positions()[i]),
                format!("{:.6e}", results.energies()[i]),
            ];
            if with_constraint {
                row.push(format!("{:.6e}", results.constraint_forces()[i]));
            }
            csv_writer.write_record(&row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample(method: SimulationMode) -> SimulationResults {
        SimulationResults::new(
            method,
            vec![0.1, 0.2, 0.3],
            vec![-0.150123456, -0.1498, 0.0],
            vec![-2.65432198, -2.65432201, -2.654321],
            vec![0.0, 1.234567e-5, -3.3e-4],
            BTreeMap::new(),
        )
        .unwrap()
    }

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() <= 5e-7 * x.abs().max(y.abs()), "{} vs {}", x, y);
        }
    }

    #[test]
    fn constrained_trajectory_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rtcneo_trajectory.csv");
        let original = sample(SimulationMode::RtCneo);

        CsvTrajectory::write_to_path(&original, &path).unwrap();
        let parsed = CsvTrajectory::read_from_path(&path).unwrap();

        assert_eq!(parsed.method(), SimulationMode::RtCneo);
        assert_close(parsed.times(), original.times());
        assert_close(parsed.positions(), original.positions());
        assert_close(parsed.energies(), original.energies());
        assert_close(parsed.constraint_forces(), original.constraint_forces());
    }

    #[test]
    fn unconstrained_trajectory_omits_constraint_column() {
        let mut buffer = Vec::new();
        CsvTrajectory::write_to(&sample(SimulationMode::RtNeo), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("Time,Position,Energy"));
        assert_eq!(lines.next(), Some("1.000000e-1,-1.501235e-1,-2.654322e0"));

        let parsed = CsvTrajectory::read_from(Cursor::new(text.as_bytes())).unwrap();
        assert_eq!(parsed.method(), SimulationMode::RtNeo);
        assert_eq!(parsed.constraint_forces(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn missing_energy_column_is_reported() {
        let input = "Time,Position\n1.0e-1,2.0e-1\n";
        let err = CsvTrajectory::read_from(Cursor::new(input)).unwrap_err();
        assert!(matches!(err, TrajectoryIoError::MissingColumn("Energy")));
    }

    #[test]
    fn malformed_number_reports_row_and_column() {
        let input = "Time,Position,Energy\n1.0e-1,abc,0.0\n";
        let err = CsvTrajectory::read_from(Cursor::new(input)).unwrap_err();
        match err {
            TrajectoryIoError::InvalidNumber { row, column, value } => {
                assert_eq!(row, 1);
                assert_eq!(column, "Position");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
