//! Encode command: print the Morse form of some text.

use clap::Args;
use serde::Serialize;

use crate::cli::common::{join_text, print_json, CliResult};
use crate::morse::{encode, MorseString, SYMBOL_TABLE};

/// Encode text into Morse without playing it
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Text to encode (words are joined with a single space)
    #[arg(value_name = "TEXT", required_unless_present = "table")]
    text: Vec<String>,

    /// Print the symbol table instead
    #[arg(long, conflicts_with = "text")]
    table: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize, Debug)]
struct EncodeOutput {
    input: String,
    morse: MorseString,
    pulses: usize,
}

#[derive(Serialize, Debug)]
struct TableEntry {
    symbol: char,
    morse: &'static str,
}

impl EncodeArgs {
    /// Execute the encode command
    pub fn execute(&self) -> CliResult<()> {
        if self.table {
            return self.print_table();
        }

        let input = join_text(&self.text);
        let morse = encode(&input);

        if self.json {
            print_json(&EncodeOutput {
                pulses: morse.pulse_count(),
                input,
                morse,
            })
        } else {
            println!("{morse}");
            Ok(())
        }
    }

    fn print_table(&self) -> CliResult<()> {
        if self.json {
            let entries: Vec<TableEntry> = SYMBOL_TABLE
                .iter()
                .map(|&(symbol, morse)| TableEntry { symbol, morse })
                .collect();
            return print_json(&entries);
        }

        for (symbol, morse) in SYMBOL_TABLE {
            let label = if symbol == ' ' {
                "space".to_string()
            } else {
                symbol.to_string()
            };
            println!("{label:<6} {morse}");
        }
        Ok(())
    }
}
