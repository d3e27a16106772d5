use crate::core::models::results::SimulationResults;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Defines the interface for reading and writing trajectory file formats.
///
/// Implementors handle format-specific parsing and serialization of a complete
/// [`SimulationResults`].
pub trait TrajectoryFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a trajectory from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: impl Read) -> Result<SimulationResults, Self::Error>;

    /// Writes a trajectory to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or I/O operations encounter issues.
    fn write_to(results: &SimulationResults, writer: impl Write) -> Result<(), Self::Error>;

    /// Reads a trajectory from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<SimulationResults, Self::Error> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    /// Writes a trajectory to a file path, creating or truncating the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        results: &SimulationResults,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(results, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
