use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use shelf_logging::shelf_debug;
use thiserror::Error;

const PRINT_STYLESHEET: &str = r#"body {
    font-family: Georgia, serif;
    font-size: 14pt;
    line-height: 1.6;
    max-width: 600px;
    margin: 0 auto;
    padding: 20px;
    color: #222;
}
h1 { font-size: 20pt; margin-bottom: 0.3em; }
.source { color: #666; font-size: 10pt; margin-bottom: 2em; }
img { max-width: 100%; height: auto; }
a { color: #222; }
pre, code { font-size: 11pt; overflow-wrap: break-word; white-space: pre-wrap; }"#;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("wkhtmltopdf not found on PATH: {0}")]
    BinaryNotFound(String),
    #[error("failed to run {binary:?}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("renderer produced no output")]
    EmptyOutput,
}

/// Turns an extracted article into PDF bytes.
pub trait Renderer: Send + Sync {
    fn render(&self, title: &str, content_html: &str, url: &str) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    /// Explicit wkhtmltopdf binary; `None` searches `PATH`.
    pub binary: Option<PathBuf>,
    pub page_size: String,
    pub margin_mm: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            binary: None,
            page_size: "A4".to_string(),
            margin_mm: 20,
        }
    }
}

/// Standalone print page wrapping the article body.
pub fn print_document(title: &str, content_html: &str, url: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n{style}\n</style>\n</head>\n<body>\n<h1>{title}</h1>\n<p class=\"source\">{url}</p>\n{content}\n</body>\n</html>\n",
        style = PRINT_STYLESHEET,
        title = escape_html(title),
        url = escape_html(url),
        content = content_html,
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Pipes the print document through an external `wkhtmltopdf`.
#[derive(Debug, Clone)]
pub struct WkhtmltopdfRenderer {
    binary: PathBuf,
    settings: RenderSettings,
}

impl WkhtmltopdfRenderer {
    pub fn new(settings: RenderSettings) -> Result<Self, RenderError> {
        let binary = match &settings.binary {
            Some(path) => path.clone(),
            None => which::which("wkhtmltopdf")
                .map_err(|err| RenderError::BinaryNotFound(err.to_string()))?,
        };
        Ok(Self { binary, settings })
    }

    pub fn binary(&self) -> &std::path::Path {
        &self.binary
    }

    fn args(&self) -> Vec<String> {
        let margin = format!("{}mm", self.settings.margin_mm);
        let mut args = vec![
            "--page-size".to_string(),
            self.settings.page_size.clone(),
        ];
        for side in ["--margin-top", "--margin-right", "--margin-bottom", "--margin-left"] {
            args.push(side.to_string());
            args.push(margin.clone());
        }
        args.extend(
            ["--encoding", "UTF-8", "--no-outline", "--quiet", "-", "-"]
                .into_iter()
                .map(String::from),
        );
        args
    }
}

impl Renderer for WkhtmltopdfRenderer {
    fn render(&self, title: &str, content_html: &str, url: &str) -> Result<Vec<u8>, RenderError> {
        let document = print_document(title, content_html, url);
        let spawn_error = |source| RenderError::Spawn {
            binary: self.binary.clone(),
            source,
        };

        let mut child = Command::new(&self.binary)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // Feed stdin from another thread so a full stdout pipe cannot deadlock us.
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || -> std::io::Result<()> {
                stdin.write_all(document.as_bytes())?;
                stdin.flush()
            })
        });

        let output = child.wait_with_output().map_err(spawn_error)?;
        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => shelf_debug!("renderer stdin closed early: {}", err),
                Err(_) => shelf_debug!("renderer stdin writer panicked"),
            }
        }

        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(RenderError::EmptyOutput);
        }
        shelf_debug!("rendered {} PDF bytes for {}", output.stdout.len(), url);
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_document_escapes_title_and_url_but_not_content() {
        let doc = print_document(
            "Fish & <Chips>",
            "<p>body <b>bold</b></p>",
            "https://x.org/?a=1&b=\"2\"",
        );
        assert!(doc.contains("<h1>Fish &amp; &lt;Chips&gt;</h1>"));
        assert!(doc.contains(r#"<p class="source">https://x.org/?a=1&amp;b=&quot;2&quot;</p>"#));
        assert!(doc.contains("<p>body <b>bold</b></p>"));
        assert!(doc.contains("font-family: Georgia, serif;"));
        assert!(doc.contains("<meta charset=\"utf-8\">"));
    }

    #[test]
    fn arguments_use_stdin_and_stdout() {
        let renderer = WkhtmltopdfRenderer::new(RenderSettings {
            binary: Some(PathBuf::from("/opt/wkhtmltopdf")),
            ..RenderSettings::default()
        })
        .unwrap();
        let args = renderer.args();
        assert_eq!(&args[..2], ["--page-size", "A4"]);
        assert!(args.windows(2).any(|w| w == ["--margin-left", "20mm"]));
        assert!(args.contains(&"--no-outline".to_string()));
        assert_eq!(&args[args.len() - 2..], ["-", "-"]);
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let renderer = WkhtmltopdfRenderer::new(RenderSettings {
            binary: Some(PathBuf::from("/nonexistent/wkhtmltopdf-shelf")),
            ..RenderSettings::default()
        })
        .unwrap();
        let err = renderer.render("t", "<p>c</p>", "https://x.org").unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
    }
}
