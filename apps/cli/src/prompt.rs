//! Console prompts and answer framing.

use std::io::{BufRead, Write};

use color_eyre::eyre::{Result, eyre};

use crawlqa_shared::parse_url_list;

const BANNER: &str = "=== Local Web Crawler + BERT QA ===";
const ANSWER_HEADER: &str = "========= Final Answer =========";
const ANSWER_FOOTER: &str = "================================";

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Request {
    pub question: String,
    pub urls: Vec<String>,
}

/// Print `prompt` and read one line, without its line terminator.
fn prompt_line<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<String> {
    write!(out, "{prompt}")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(eyre!("input closed before '{}' was answered", prompt.trim()));
    }
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Collect the question and URL list, prompting only for values not given
/// on the command line.
pub(crate) fn read_request<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    question: Option<String>,
    urls: Option<String>,
) -> Result<Request> {
    if question.is_none() || urls.is_none() {
        writeln!(out, "{BANNER}")?;
    }

    let question = match question {
        Some(q) => q,
        None => prompt_line(input, out, "Enter your question: ")?,
    };

    let url_line = match urls {
        Some(u) => u,
        None => {
            writeln!(out, "Enter URLs (comma separated):")?;
            prompt_line(input, out, "> ")?
        }
    };

    Ok(Request {
        question,
        urls: parse_url_list(&url_line),
    })
}

/// Print the answer between the header and footer rules.
pub(crate) fn write_answer<W: Write>(out: &mut W, answer: &str) -> Result<()> {
    writeln!(out, "\n{ANSWER_HEADER}\n")?;
    writeln!(out, "{answer}")?;
    writeln!(out, "\n{ANSWER_FOOTER}\n")?;
    Ok(())
}
