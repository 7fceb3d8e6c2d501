//! Prompt contract for article and summary generation.
//!
//! The system instructions are fixed; per-call user instructions embed the
//! target keyword and the assembled context. Downstream rendering depends
//! on the `[[wiki style links]]` convention these prompts establish.

use babelwiki_shared::Result;

use crate::{CompletionRequest, SamplingParams, TextGenerator};

/// Persona and structural requirements for article generation.
const ARTICLE_SYSTEM_PROMPT: &str = "\
You are writing articles for an encyclopedia from an alternate reality.
Your task is to create short, fascinating articles that maintain internal consistency with existing content.
Write in a professional, encyclopedia-like style.
Use markdown formatting.
Include many [[wiki style links]] to reference other potential articles. There should be at least a link per paragraph, and every place and person's name should have a link.
Be creative but maintain a serious, academic tone.
Articles should feel like they're from a complete, coherent alternate universe.";

/// Fixed instruction for the summary generator: a sub-100-word digest that
/// keeps as many original keywords as possible, output only.
const SUMMARY_SYSTEM_PROMPT: &str = "\
You are a summary generator. You will summarise each message in less than 100 words.
The messages are wiki articles. You should only output the summary.
Please try to retain as many keywords as possible from the original text.";

/// Build the completion request for a new article.
pub fn article_request(
    params: &SamplingParams,
    keyword: &str,
    context: &str,
) -> CompletionRequest {
    let user = format!(
        "Write an article about: {keyword}\n\n\
         Here is the context from related articles in our encyclopedia that you should maintain consistency with:\n\n\
         {context}\n\n\
         The article should include:\n\
         1. A clear introduction\n\
         2. Multiple sections with headers (using ## for h2 headers)\n\
         3. References to other articles using [[wiki style links]]\n\
         4. At least one quote from a fictional scholar or historical figure\n\
         5. Specific dates and events from our alternate timeline\n\
         6. A 'References' section at the end with 3-5 fictional sources\n\
         7. Maintains consistency with the context provided above\n\n\
         Format the article in markdown."
    );

    CompletionRequest {
        system: ARTICLE_SYSTEM_PROMPT.to_string(),
        user,
        params: params.clone(),
    }
}

/// Build the completion request for an article digest.
pub fn summary_request(params: &SamplingParams, content: &str) -> CompletionRequest {
    CompletionRequest {
        system: SUMMARY_SYSTEM_PROMPT.to_string(),
        user: content.to_string(),
        params: params.without_penalties(),
    }
}

/// Generate the full markdown article for `keyword`, seeded with the
/// assembled context from related articles.
pub async fn generate_article(
    generator: &dyn TextGenerator,
    params: &SamplingParams,
    keyword: &str,
    context: &str,
) -> Result<String> {
    tracing::info!(keyword, context_len = context.len(), "generating article");
    generator
        .complete(article_request(params, keyword, context))
        .await
}

/// Generate the short digest stored alongside an article.
pub async fn summarize(
    generator: &dyn TextGenerator,
    params: &SamplingParams,
    content: &str,
) -> Result<String> {
    tracing::info!(content_len = content.len(), "generating summary");
    generator.complete(summary_request(params, content)).await
}
