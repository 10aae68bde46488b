use std::io::{self, BufRead, Write};

use crate::config::{Parameters, PartialParameters};
use crate::error::KiraError;

pub const EMAIL_PROMPT: &str = "NCBI email:";
pub const API_KEY_PROMPT: &str = "NCBI API key:";
pub const TAX_ID_PROMPT: &str = "TaxID:";
pub const MIN_LEN_PROMPT: &str = "Min length:";
pub const MAX_LEN_PROMPT: &str = "Max length:";

/// Line-oriented prompts over any reader/writer pair.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn ask(&mut self, label: &str) -> Result<String, KiraError> {
        self.output
            .write_all(label.as_bytes())
            .and_then(|_| self.output.flush())
            .map_err(|err| KiraError::Prompt(err.to_string()))?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|err| KiraError::Prompt(err.to_string()))?;
        if read == 0 {
            return Err(KiraError::Prompt(format!(
                "input closed while waiting for {}",
                label.trim_end_matches(':')
            )));
        }
        Ok(line.trim().to_string())
    }

    /// Prompts, in fixed order, for every value not already supplied.
    pub fn complete(&mut self, partial: PartialParameters) -> Result<Parameters, KiraError> {
        Ok(Parameters {
            email: self.value_or_ask(partial.email, EMAIL_PROMPT)?,
            api_key: self.value_or_ask(partial.api_key, API_KEY_PROMPT)?,
            tax_id: self.value_or_ask(partial.tax_id, TAX_ID_PROMPT)?,
            min_len: self.value_or_ask(partial.min_len, MIN_LEN_PROMPT)?,
            max_len: self.value_or_ask(partial.max_len, MAX_LEN_PROMPT)?,
        })
    }

    fn value_or_ask(&mut self, value: Option<String>, label: &str) -> Result<String, KiraError> {
        match value {
            Some(value) => Ok(value),
            None => self.ask(label),
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn prompts_in_order() {
        let input = b"me@example.org\nKEY\n9606\n100\n200\n";
        let mut console = Console::new(&input[..], Vec::new());
        let params = console.complete(PartialParameters::default()).unwrap();
        assert_eq!(params.email, "me@example.org");
        assert_eq!(params.api_key, "KEY");
        assert_eq!(params.tax_id, "9606");
        assert_eq!(params.min_len, "100");
        assert_eq!(params.max_len, "200");

        let shown = String::from_utf8(console.into_output()).unwrap();
        assert_eq!(
            shown,
            "NCBI email:NCBI API key:TaxID:Min length:Max length:"
        );
    }

    #[test]
    fn skips_supplied_values() {
        let input = b"\n200\n";
        let partial = PartialParameters {
            email: Some("me@example.org".to_string()),
            tax_id: Some("9606".to_string()),
            min_len: Some("100".to_string()),
            ..PartialParameters::default()
        };
        let mut console = Console::new(&input[..], Vec::new());
        let params = console.complete(partial).unwrap();
        assert_eq!(params.api_key, "");
        assert_eq!(params.max_len, "200");

        let shown = String::from_utf8(console.into_output()).unwrap();
        assert_eq!(shown, "NCBI API key:Max length:");
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut console = Console::new(&b""[..], Vec::new());
        assert_matches!(console.ask(TAX_ID_PROMPT), Err(KiraError::Prompt(_)));
    }
}
