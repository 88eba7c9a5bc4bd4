//! Prompt assembly and answer classification.

use docchat_core::traits::Generator;
use docchat_core::types::{Answer, AnswerStatus, RetrievedContext};
use docchat_core::{Error, Result};
use tracing::debug;

/// Reply the model is told to give when the context does not answer the question.
pub const DECLINE_PHRASE: &str = "I don't know based on the provided context.";

/// One prompt holding every retrieved chunk verbatim, separated by blank lines.
pub fn build_prompt(context: &RetrievedContext, question: &str) -> String {
    let context_text = context.contents().collect::<Vec<_>>().join("\n\n");
    format!(
        "You are an assistant for question-answering tasks.\n\
         Use the following pieces of retrieved context to answer\n\
         the question. Answer only from the context. If the context does not\n\
         contain the answer, reply exactly \"{DECLINE_PHRASE}\"\n\
         DON'T MAKE UP ANYTHING.\n\
         \n\
         Context:\n\
         {context_text}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer:\n"
    )
}

/// Ask `generator` once and classify its reply.
pub fn synthesize(context: &RetrievedContext, question: &str, generator: &dyn Generator) -> Result<Answer> {
    let prompt = build_prompt(context, question);
    debug!(chunks = context.len(), prompt_chars = prompt.chars().count(), model = generator.model_id(), "generating answer");
    let text = generator.generate(&prompt).map_err(Error::Generation)?;
    let text = text.trim().to_string();
    let status = classify(&text);
    Ok(Answer { text, status })
}

pub fn classify(text: &str) -> AnswerStatus {
    let normalized = text.trim_start().replace('\u{2019}', "'").to_lowercase();
    let phrase = DECLINE_PHRASE.trim_end_matches('.').to_lowercase();
    if normalized.starts_with(&phrase) { AnswerStatus::Declined } else { AnswerStatus::Answered }
}
