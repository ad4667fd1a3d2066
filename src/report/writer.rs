use super::ReportRow;
use crate::core::error::SimulatorResult;
use std::io::{self, Write};

/// 行末は CRLF
pub fn write_csv<W: Write>(writer: W, rows: &[ReportRow]) -> io::Result<()> {
    let mut writer = io::BufWriter::new(writer);
    write!(writer, "{}\r\n", ReportRow::csv_header())?;
    for row in rows {
        write!(writer, "{}\r\n", row.to_csv_line())?;
    }
    writer.flush()
}

/// 2スペースインデントのJSON配列として書き出す
pub fn write_json<W: Write>(writer: W, rows: &[ReportRow]) -> SimulatorResult<()> {
    let mut writer = io::BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.flush()?;
    Ok(())
}
