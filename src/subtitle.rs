use std::sync::LazyLock;

use eyre::{Result, WrapErr};
use regex::Regex;
use serde::Deserialize;

static TIMING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,2}:)?\d{2}:\d{2}[.,]\d{3}\s+-->\s+(?:\d{1,2}:)?\d{2}:\d{2}[.,]\d{3}").expect("valid regex")
});

static WEBVTT_SIGNATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\x{FEFF}?WEBVTT(?:[ \t].*)?$").expect("valid regex"));

static NON_CUE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:NOTE|STYLE|REGION)(?:[ \t].*)?$").expect("valid regex"));

// Cue markup only: class/italic/bold/underline/ruby spans, voice and language
// spans with annotations, SRT font tags, and karaoke timestamps.
static CUE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"</?(?:[cibu]|ruby|rt)(?:\.[\w-]+)*>",
        r"|<(?:v|lang|font)(?:\.[\w-]+)*(?:[ \t][^<>]*)?>",
        r"|</(?:v|lang|font)>",
        r"|<(?:\d{1,2}:)?\d{2}:\d{2}\.\d{3}>",
    ))
    .expect("valid regex")
});

/// Turn a raw WebVTT/SRT payload into single-spaced plain text.
///
/// Multi-line payloads lose cue timing lines, the WEBVTT header block,
/// NOTE/STYLE/REGION blocks and cue markup; remaining lines are trimmed and
/// joined with single spaces. Single-line input is already flat text and only
/// has its whitespace collapsed, which makes the function idempotent.
pub fn normalize(raw: &str) -> String {
    if !raw.contains('\n') {
        return collapse_whitespace(raw);
    }

    let is_vtt = raw
        .lines()
        .next()
        .is_some_and(|first| WEBVTT_SIGNATURE.is_match(first.trim_end()));

    let mut kept = Vec::new();
    let mut skipping = is_vtt;
    let mut block_start = false;

    for line in raw.lines().map(str::trim) {
        if line.is_empty() {
            skipping = false;
            block_start = true;
            continue;
        }
        if TIMING_LINE.is_match(line) {
            skipping = false;
            block_start = false;
            continue;
        }
        if is_vtt && block_start && NON_CUE_BLOCK.is_match(line) {
            skipping = true;
        }
        block_start = false;
        if !skipping {
            kept.push(CUE_TAG.replace_all(line, ""));
        }
    }

    collapse_whitespace(&kept.join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Wire format of a downloadable caption track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionFormat {
    Vtt,
    Json3,
    Other(String),
}

impl CaptionFormat {
    pub fn from_ext(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "vtt" => CaptionFormat::Vtt,
            "json3" => CaptionFormat::Json3,
            other => CaptionFormat::Other(other.to_string()),
        }
    }
}

/// Convert a downloaded caption payload to plain transcript text
pub fn payload_to_text(format: &CaptionFormat, payload: &str) -> Result<String> {
    let text = match format {
        CaptionFormat::Json3 => normalize(&parse_json3(payload)?),
        CaptionFormat::Vtt | CaptionFormat::Other(_) => normalize(payload),
    };
    Ok(html_escape::decode_html_entities(&text).into_owned())
}

#[derive(Debug, Deserialize)]
struct Json3Payload {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Flatten a `json3` caption payload (events → segs → utf8) into plain text
pub fn parse_json3(payload: &str) -> Result<String> {
    let parsed: Json3Payload = serde_json::from_str(payload).wrap_err("invalid json3 caption payload")?;

    Ok(parsed
        .events
        .iter()
        .flat_map(|event| event.segs.iter())
        .map(|seg| seg.utf8.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" "))
}
