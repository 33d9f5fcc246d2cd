use crate::error::ValuationError;
use crate::models::CompanyRecord;

/// Company fields as the user typed them.
///
/// Editing an existing company starts from `from_record`; `to_record` turns
/// the text back into numbers and names the first field that does not parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyForm {
    pub name: String,
    pub current_price: String,
    pub pe: Vec<String>,
    pub ps: Vec<String>,
    /// Left empty when the company has no PEG history
    pub peg: Vec<String>,
    pub earnings_this_year: String,
    pub earnings_next_year: String,
    pub growth_this_year: String,
    pub growth_next_year: String,
}

impl CompanyForm {
    /// Blank form with one slot per historical multiple
    pub fn blank(history_len: usize) -> Self {
        Self {
            pe: vec![String::new(); history_len],
            ps: vec![String::new(); history_len],
            ..Self::default()
        }
    }

    /// Load a saved company into the form for editing
    pub fn from_record(record: &CompanyRecord) -> Self {
        let texts = |values: &[f64]| values.iter().map(f64::to_string).collect::<Vec<_>>();
        Self {
            name: record.name.clone(),
            current_price: record.current_price.to_string(),
            pe: texts(&record.pe_history),
            ps: texts(&record.ps_history),
            peg: record.peg_history.as_deref().map(texts).unwrap_or_default(),
            earnings_this_year: record.earnings_this_year.to_string(),
            earnings_next_year: record.earnings_next_year.to_string(),
            growth_this_year: record.growth_this_year.to_string(),
            growth_next_year: record.growth_next_year.to_string(),
        }
    }

    /// Coerce the text fields into a record with `history_len` multiples each
    pub fn to_record(&self, history_len: usize) -> Result<CompanyRecord, ValuationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValuationError::InvalidInput(
                "company name must not be empty".to_string(),
            ));
        }

        let peg_history = if self.peg.iter().all(|cell| cell.trim().is_empty()) {
            None
        } else {
            Some(parse_history("PEG", &self.peg, history_len)?)
        };

        Ok(CompanyRecord {
            name: name.to_string(),
            current_price: parse_number("current price", &self.current_price)?,
            pe_history: parse_history("P/E", &self.pe, history_len)?,
            ps_history: parse_history("P/S", &self.ps, history_len)?,
            peg_history,
            earnings_this_year: parse_number("earnings this year", &self.earnings_this_year)?,
            earnings_next_year: parse_number("earnings next year", &self.earnings_next_year)?,
            growth_this_year: parse_number("growth this year", &self.growth_this_year)?,
            growth_next_year: parse_number("growth next year", &self.growth_next_year)?,
        })
    }
}

/// Parse a number as typed, accepting a decimal comma ("12,5")
pub fn parse_number(field: &str, text: &str) -> Result<f64, ValuationError> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        return Err(ValuationError::InvalidInput(format!("{} is required", field)));
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValuationError::InvalidInput(format!(
            "{} must be a number, got '{}'",
            field,
            text.trim()
        ))),
    }
}

fn parse_history(label: &str, cells: &[String], history_len: usize) -> Result<Vec<f64>, ValuationError> {
    if cells.len() != history_len {
        return Err(ValuationError::InvalidInput(format!(
            "expected {} {} values, got {}",
            history_len,
            label,
            cells.len()
        )));
    }

    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| parse_number(&format!("{} {}", label, i + 1), cell))
        .collect()
}
