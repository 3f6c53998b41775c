//! Splitting of comma-separated text into a header and numbered rows.
use csv::{ReaderBuilder, StringRecord, Trim};
use super::nom_prelude::*;
use crate::{Error, Result};

#[derive(Debug, Copy, Clone)]
pub struct Column {
  pub name: &'static str,
  idx: usize,
}

#[derive(Debug)]
pub struct Row {
  /// 1-based line number in the input text
  pub line: usize,
  fields: StringRecord,
}

impl Row {
  pub fn field(&self, col: &Column) -> Result<&str> {
    match self.fields.get(col.idx) {
      None => Err(Error::malformed(self.line, col.name, "missing field").into()),
      Some(s) if s.is_empty() => Err(Error::malformed(self.line, col.name, "empty field").into()),
      Some(s) => Ok(s),
    }
  }

  pub fn parse<'r, T>(&'r self, col: &Column, parser: impl FnMut(&'r str) -> IResult<&'r str, T>) -> Result<T> {
    let value = self.field(col)?;
    all_consuming(parser)(value)
      .finish()
      .map(|(_, v)| v)
      .map_err(|_| Error::malformed(self.line, col.name, format!("cannot parse {:?}", value)).into())
  }
}

#[derive(Debug)]
pub struct Table {
  header: Row,
  pub rows: Vec<Row>,
}

fn is_blank(record: &StringRecord) -> bool {
  record.iter().all(str::is_empty)
}

impl Table {
  /// Returns `None` if the text contains no header line.  Fields may be quoted and are trimmed;
  /// rows may have any number of fields.
  pub fn split(text: &str) -> Result<Option<Table>> {
    let mut reader = ReaderBuilder::new()
      .has_headers(false)
      .flexible(true)
      .trim(Trim::All)
      .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
      let fields = record.map_err(|e| {
        let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
        Error::malformed(line, "", e.to_string())
      })?;
      if is_blank(&fields) {
        continue;
      }
      let line = fields.position().map(|p| p.line() as usize).unwrap_or(0);
      rows.push(Row { line, fields });
    }

    if rows.is_empty() {
      return Ok(None);
    }
    let header = rows.remove(0);
    Ok(Some(Table { header, rows }))
  }

  /// Locates a column by any of its accepted names.  The first name is used in error messages.
  pub fn column(&self, names: &[&'static str]) -> Result<Column> {
    names.iter()
      .find_map(|n| self.header.fields.iter().position(|h| h == *n))
      .map(|idx| Column { name: names[0], idx })
      .ok_or_else(|| Error::malformed(self.header.line, names[0], "missing column").into())
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn fields(row: &Row) -> Vec<&str> {
    row.fields.iter().collect()
  }

  #[test]
  fn quoted_and_padded_fields() -> Result<()> {
    let t = Table::split("\"a\", b ,,c\n\"1,5\",\" 2 \",3\n")?.unwrap();
    assert_eq!(fields(&t.header), vec!["a", "b", "", "c"]);
    assert_eq!(fields(&t.rows[0]), vec!["1,5", "2", "3"]);
    Ok(())
  }

  #[test]
  fn line_numbers_skip_blank_lines() -> Result<()> {
    let t = Table::split("x,y\n\n1,2\r\n3,4\n")?.unwrap();
    assert_eq!(t.header.line, 1);
    assert_eq!(t.rows.iter().map(|r| r.line).collect::<Vec<_>>(), vec![3, 4]);
    Ok(())
  }

  #[test]
  fn aliases() -> Result<()> {
    let t = Table::split("id_start,distance\n")?.unwrap();
    let col = t.column(&["id_1", "id_start"])?;
    assert_eq!(col.name, "id_1");
    assert_eq!(col.idx, 0);
    assert!(t.column(&["id_2", "id_end"]).is_err());
    Ok(())
  }

  #[test]
  fn empty_text() -> Result<()> {
    assert!(Table::split("")?.is_none());
    assert!(Table::split("\n \n")?.is_none());
    Ok(())
  }
}
