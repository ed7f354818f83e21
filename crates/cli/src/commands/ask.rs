//! Question answering commands.

use clap::Args;
use pdfchat_core::AppResult;
use pdfchat_knowledge::{AnswerResult, KnowledgeBase};

/// Ask a question about the uploaded documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question
    pub question: String,

    /// Number of chunks to retrieve (default from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Have the configured language model write the answer
    #[arg(long)]
    pub llm: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, kb: &KnowledgeBase) -> AppResult<()> {
        tracing::info!("Executing ask command (llm: {})", self.llm);
        tracing::debug!("Question: {:?}", self.question);

        let result = if self.llm {
            kb.qa.ask_generated(&self.question).await
        } else {
            kb.qa.ask(&self.question).await
        };
        print_answer(&result, self.json)
    }
}

/// Search the documents for a keyword
#[derive(Args, Debug)]
pub struct KeywordCommand {
    /// Keyword to look for
    pub keyword: String,

    /// Number of chunks to retrieve (default from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KeywordCommand {
    pub async fn execute(&self, kb: &KnowledgeBase) -> AppResult<()> {
        tracing::info!("Executing keyword command for {:?}", self.keyword);

        let result = kb.qa.search_by_keyword(&self.keyword).await;
        print_answer(&result, self.json)
    }
}

fn print_answer(result: &AnswerResult, json: bool) -> AppResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("Answer:");
    println!("{}", result.answer);
    println!();

    if result.citations.is_empty() {
        println!("Sources: (none)");
    } else {
        println!("Sources:");
        for citation in &result.citations {
            println!(
                "{}. {} ({})",
                citation.rank, citation.filename, citation.label
            );
            println!("   {}", citation.excerpt.replace('\n', " "));
        }
    }

    Ok(())
}
