use tracing::debug;

use crate::interfaces::search::SearchDocument;

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn or_unknown(value: &Option<String>) -> &str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("Unknown")
}

fn document_block(doc: &SearchDocument) -> String {
    format!(
        "Title: {}\nAuthor: {}\nPublished: {}\nContent: {}\nURL: {}",
        or_unknown(&doc.title),
        or_unknown(&doc.author),
        or_unknown(&doc.published_date),
        doc.text.as_deref().unwrap_or("").trim(),
        doc.url.trim(),
    )
}

/// Joins search results into one text for the market-analysis prompt. Stops
/// before the first block that would push the total past `max_words`.
pub fn compile_market_data(docs: &[SearchDocument], max_words: usize) -> String {
    let mut compiled = String::new();
    let mut words = 0usize;

    for (idx, doc) in docs.iter().enumerate() {
        let block = document_block(doc);
        let block_words = word_count(&block);
        if words + block_words > max_words {
            debug!(
                kept = idx,
                dropped = docs.len() - idx,
                max_words,
                "market data word guard reached"
            );
            break;
        }
        if !compiled.is_empty() {
            compiled.push_str("\n\n");
        }
        compiled.push_str(&block);
        words += block_words;
    }

    compiled
}
