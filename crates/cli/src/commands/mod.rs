//! Command handlers for the pdfchat CLI.

pub mod ask;
pub mod index;
pub mod upload;

pub use ask::{AskCommand, KeywordCommand};
pub use index::{ClearCommand, DeleteCommand, DocumentsCommand, StatsCommand, SummaryCommand};
pub use upload::UploadCommand;
