#[derive(Debug, Clone, PartialEq)]
pub struct CsvSettings {
    pub delimiter: char,
    pub quote: char,
    pub has_headers: bool,
}

impl CsvSettings {
    pub fn new(delimiter: char, quote: char, has_headers: bool) -> Self {
        CsvSettings {
            delimiter,
            quote,
            has_headers,
        }
    }
}

impl Default for CsvSettings {
    fn default() -> Self {
        CsvSettings::new(',', '"', true)
    }
}
