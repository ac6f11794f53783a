//! Signal parsing: provider grammars and the parser that chains them.

mod grammar;
mod parser;

pub use grammar::{Grammar, GrammarMatch, GrammarRegistry, ParsedSignal, RegistryEntry};
pub use parser::{received_at_from_unix, SignalParser};
