//! An HTML parser that tokenizes speculatively on a background thread.
//!
//! The tokenizer runs ahead of tree construction together with a tree
//! builder simulator that predicts the tokenizer state changes the real
//! tree builder would request. Scripts that write to the document can
//! invalidate the prediction, in which case the speculation is discarded
//! and tokenization resumes from the last point the tree builder reached.
//!
//! ```
//! use tandem_html::{serialize_for_test, DocumentParser, Dom, ParserSettings, PumpOutcome};
//!
//! let mut parser = DocumentParser::new(Dom::new(), ParserSettings::default());
//!
//! parser.append("<p>Hello</p>").unwrap();
//! parser.finish().unwrap();
//!
//! assert_eq!(parser.run_until_blocked().unwrap(), PumpOutcome::Finished);
//! assert!(serialize_for_test(parser.sink()).contains("\"Hello\""));
//! ```

#[macro_use]
pub mod base;

#[macro_use]
pub mod html;

pub mod background;
mod document_parser;
pub mod dom;
mod errors;
pub mod input;
pub mod preload_scanner;
pub mod token;
pub mod tokenizer;
pub mod tree_builder;
pub mod tree_builder_simulator;
pub mod xss_auditor;

pub use self::base::TextPosition;
pub use self::document_parser::{
    DocumentParser, MemorySettings, ParserSettings, PumpOutcome, SchedulingSettings,
};
pub use self::dom::{serialize_for_test, Dom};
pub use self::errors::{CheckpointError, ParserError};
pub use self::tree_builder::{NodeId, ScriptToProcess, TreeSink};
