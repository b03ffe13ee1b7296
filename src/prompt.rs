use crate::SummaryStyle;

/// Render the prompt for a transcript in the requested style.
///
/// The title and transcript are embedded verbatim. Without a title the
/// prompt refers to "this content" instead of a titled video.
pub fn build_prompt(transcript: &str, title: Option<&str>, style: SummaryStyle) -> String {
    let subject = match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => format!("this YouTube video titled \"{title}\""),
        None => "this content".to_string(),
    };

    match style {
        SummaryStyle::Detailed => format!(
            "Provide a comprehensive summary of {subject} in plain text format without any markdown, bold text, or special formatting.

Include:
- Main topic and key points
- Important details and examples
- Conclusions or takeaways

Write in clear paragraphs using only plain text.

Transcript:
{transcript}"
        ),
        SummaryStyle::Brief => format!(
            "Provide a concise 2-3 paragraph summary of {subject} in plain text format without any markdown, bold text, or special formatting.

Focus on the main message and key takeaways only. Write in clear paragraphs using only plain text.

Transcript:
{transcript}"
        ),
        SummaryStyle::BulletPoints => format!(
            "Summarize {subject} as bullet points in plain text format without any markdown or special formatting.

Format:
- Main topic
- Key points (3-5 bullets)
- Important takeaways

Use simple dashes (-) for bullet points, no special characters.

Transcript:
{transcript}"
        ),
    }
}
