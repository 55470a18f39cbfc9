//! HTML to text conversion using `html-to-markdown-rs`.
//!
//! The converter recurses over the DOM, so very large documents are converted on
//! a dedicated thread with a generous stack.

use crate::error::{FetchtextError, Result};
use html_to_markdown_rs::convert;
use std::{any::Any, thread};

const LARGE_HTML_STACK_THRESHOLD_BYTES: usize = 512 * 1024;
const HTML_CONVERSION_STACK_SIZE_BYTES: usize = 16 * 1024 * 1024;

/// Convert an HTML document to readable text (Markdown flavoured).
pub fn html_to_text(html: &str) -> Result<String> {
    if html.len() > LARGE_HTML_STACK_THRESHOLD_BYTES {
        let owned = html.to_string();
        run_on_dedicated_stack(move || convert_html(&owned))
    } else {
        convert_html(html)
    }
}

fn convert_html(html: &str) -> Result<String> {
    convert(html, None)
        .map(|text| text.trim().to_string())
        .map_err(|e| FetchtextError::extraction(format!("Failed to convert HTML: {}", e)))
}

fn run_on_dedicated_stack<T, F>(job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("fetchtext-html-conversion".to_string())
        .stack_size(HTML_CONVERSION_STACK_SIZE_BYTES)
        .spawn(job)
        .map_err(|err| FetchtextError::Other(format!("Failed to spawn HTML conversion thread: {}", err)))?;

    match handle.join() {
        Ok(result) => result,
        Err(panic) => Err(FetchtextError::extraction(format!(
            "HTML conversion panicked: {}",
            panic_reason(&panic)
        ))),
    }
}

fn panic_reason(panic: &Box<dyn Any + Send + 'static>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_html() {
        let text = html_to_text("<html><body><h1>Title</h1><p>Hello <b>world</b></p></body></html>").unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("Hello"));
        assert!(text.contains("world"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_large_html_uses_dedicated_stack() {
        let mut html = String::from("<html><body>");
        while html.len() <= LARGE_HTML_STACK_THRESHOLD_BYTES {
            html.push_str("<p>paragraph of filler text</p>");
        }
        html.push_str("</body></html>");

        let text = html_to_text(&html).unwrap();
        assert!(text.contains("paragraph of filler text"));
    }
}
