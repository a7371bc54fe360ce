//! Puppeteer tool - headless-browser automation through a Node subprocess.
//!
//! Each action launches `node` with one of the embedded scripts and a JSON
//! argument blob, then reads the script's JSON result from stdout. Binary
//! outputs (screenshots, PDFs) go through a temp file that is removed on
//! every exit path, success or failure.

mod scripts;

pub use scripts::install_scripts;

use std::io;
use std::path::PathBuf;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde_json::{Map, Value, json};
use tokio::process::Command;
use tracing::debug;

use crate::core::config::BrowserConfig;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::params::Parameters;
use crate::domains::tools::spec::{ActionSpec, ParamType, Tool};

/// Runs the embedded automation scripts.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    script_dir: PathBuf,
    headless: bool,
    chrome_path: Option<String>,
}

impl ScriptRunner {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            script_dir: config.script_dir.clone(),
            headless: config.headless,
            chrome_path: config.chrome_path.clone(),
        }
    }

    fn base_args(&self, url: &str) -> Map<String, Value> {
        let mut args = Map::new();
        args.insert("url".to_string(), json!(url));
        args.insert("headless".to_string(), json!(self.headless));
        args.insert("executablePath".to_string(), json!(self.chrome_path));
        args
    }

    async fn run_script(&self, name: &str, args: Map<String, Value>) -> Result<Value, ToolError> {
        let path = scripts::script_path(&self.script_dir, name);
        debug!("Running browser script {}", path.display());

        let output = Command::new("node")
            .arg(&path)
            .arg(Value::Object(args).to_string())
            .output()
            .await
            .map_err(|e| ToolError::backend(format!("Failed to launch node: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // scripts report failures as {"success": false, "error": ...} on stderr
            let message = serde_json::from_str::<Value>(stderr.trim())
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| stderr.trim().to_string());
            return Err(ToolError::backend(format!(
                "Browser automation failed: {}",
                message
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(stdout.trim()).map_err(|e| {
            ToolError::backend(format!("Browser script returned malformed output: {}", e))
        })
    }

    /// Take a screenshot of a webpage, returned base64-encoded.
    pub async fn screenshot(&self, params: Parameters) -> Result<Value, ToolError> {
        let url = params.require_str("url")?;
        let full_page = params.bool_or("fullPage", false);
        let image_type = params.str_opt("type").unwrap_or("png").to_string();

        // Removed on drop, covering failure paths below as well.
        let output_file = tempfile::Builder::new()
            .prefix("gateway-screenshot-")
            .suffix(&format!(".{}", image_type))
            .tempfile()
            .map_err(|e| ToolError::internal(format!("Failed to create temp file: {}", e)))?;

        let mut args = self.base_args(url);
        args.insert(
            "outputPath".to_string(),
            json!(output_file.path().to_string_lossy()),
        );
        args.insert("fullPage".to_string(), json!(full_page));
        args.insert("type".to_string(), json!(image_type));
        copy_passthrough(
            &params,
            &mut args,
            &["waitForSelector", "waitTime", "viewport", "userAgent", "quality"],
        );

        self.run_script("screenshot.js", args).await?;

        let image = tokio::fs::read(output_file.path())
            .await
            .map_err(|e| ToolError::backend(format!("Failed to read screenshot: {}", e)))?;

        Ok(json!({
            "success": true,
            "imageType": image_type,
            "base64Image": BASE64.encode(image),
        }))
    }

    /// Generate a PDF of a webpage, returned base64-encoded.
    pub async fn pdf(&self, params: Parameters) -> Result<Value, ToolError> {
        let url = params.require_str("url")?;
        let print_background = params.bool_or("printBackground", true);

        let output_file = tempfile::Builder::new()
            .prefix("gateway-pdf-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| ToolError::internal(format!("Failed to create temp file: {}", e)))?;

        let mut args = self.base_args(url);
        args.insert(
            "outputPath".to_string(),
            json!(output_file.path().to_string_lossy()),
        );
        args.insert("printBackground".to_string(), json!(print_background));
        copy_passthrough(
            &params,
            &mut args,
            &["format", "margin", "waitForSelector", "waitTime", "viewport", "userAgent"],
        );

        self.run_script("pdf.js", args).await?;

        let pdf = tokio::fs::read(output_file.path())
            .await
            .map_err(|e| ToolError::backend(format!("Failed to read PDF: {}", e)))?;

        Ok(json!({
            "success": true,
            "base64Pdf": BASE64.encode(pdf),
        }))
    }

    /// Extract text or HTML content from a webpage.
    pub async fn extract(&self, params: Parameters) -> Result<Value, ToolError> {
        let url = params.require_str("url")?;
        let extract_html = params.bool_or("extractHtml", false);

        let mut args = self.base_args(url);
        if let Some(selector) = params.str_opt("selector") {
            args.insert("selector".to_string(), json!(selector));
        }
        args.insert("extractHtml".to_string(), json!(extract_html));
        copy_passthrough(&params, &mut args, &["waitForSelector", "waitTime", "userAgent"]);

        let result = self.run_script("extract.js", args).await?;

        Ok(json!({
            "success": true,
            "content": result.get("content").cloned().unwrap_or(Value::Null),
        }))
    }
}

/// Copy optional caller-supplied fields into the script arguments.
fn copy_passthrough(params: &Parameters, args: &mut Map<String, Value>, names: &[&str]) {
    for name in names {
        if let Some(value) = params.get(name) {
            args.insert((*name).to_string(), value.clone());
        }
    }
}

/// The `puppeteer` tool.
pub struct PuppeteerTool {
    runner: ScriptRunner,
}

impl PuppeteerTool {
    pub const NAME: &'static str = "puppeteer";

    /// Construct the tool and install the automation scripts.
    pub fn new(config: &BrowserConfig) -> io::Result<Self> {
        install_scripts(&config.script_dir)?;
        Ok(Self {
            runner: ScriptRunner::new(config),
        })
    }
}

impl Tool for PuppeteerTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn actions(&self) -> Vec<ActionSpec> {
        vec![
            ActionSpec::builder("screenshot", "Take a screenshot of a webpage")
                .required("url", ParamType::String, "URL to screenshot")
                .with_default(
                    "fullPage",
                    ParamType::Boolean,
                    "Whether to capture the full page",
                    json!(false),
                )
                .with_default(
                    "type",
                    ParamType::String,
                    "Image type (png or jpeg)",
                    json!("png"),
                )
                .returns("object", "Screenshot result with base64-encoded image")
                .handler({
                    let runner = self.runner.clone();
                    move |params| {
                        let runner = runner.clone();
                        async move { runner.screenshot(params).await }
                    }
                }),
            ActionSpec::builder("pdf", "Generate a PDF of a webpage")
                .required("url", ParamType::String, "URL to convert to PDF")
                .with_default(
                    "printBackground",
                    ParamType::Boolean,
                    "Whether to print background graphics",
                    json!(true),
                )
                .returns("object", "PDF result with base64-encoded document")
                .handler({
                    let runner = self.runner.clone();
                    move |params| {
                        let runner = runner.clone();
                        async move { runner.pdf(params).await }
                    }
                }),
            ActionSpec::builder("extract", "Extract content from a webpage")
                .required("url", ParamType::String, "URL to extract content from")
                .optional(
                    "selector",
                    ParamType::String,
                    "CSS selector for content to extract",
                )
                .with_default(
                    "extractHtml",
                    ParamType::Boolean,
                    "Return HTML instead of text",
                    json!(false),
                )
                .returns("object", "Extracted content")
                .handler({
                    let runner = self.runner.clone();
                    move |params| {
                        let runner = runner.clone();
                        async move { runner.extract(params).await }
                    }
                }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> BrowserConfig {
        BrowserConfig {
            headless: true,
            chrome_path: None,
            script_dir: dir.path().to_path_buf(),
        }
    }

    #[test]
    fn test_new_installs_scripts() {
        let dir = TempDir::new().unwrap();
        let _tool = PuppeteerTool::new(&test_config(&dir)).unwrap();
        assert!(dir.path().join("screenshot.js").exists());
        assert!(dir.path().join("pdf.js").exists());
        assert!(dir.path().join("extract.js").exists());
    }

    #[test]
    fn test_action_names() {
        let dir = TempDir::new().unwrap();
        let tool = PuppeteerTool::new(&test_config(&dir)).unwrap();
        let names: Vec<_> = tool.actions().iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["screenshot", "pdf", "extract"]);
    }

    #[tokio::test]
    async fn test_screenshot_requires_url() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptRunner::new(&test_config(&dir));
        let err = runner.screenshot(Parameters::new()).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidParameters");
        assert!(err.to_string().contains("url"));
    }

    #[test]
    fn test_copy_passthrough_only_present_fields() {
        let params = Parameters::from_value(json!({
            "waitTime": 500,
            "viewport": {"width": 800, "height": 600},
            "unrelated": true
        }));
        let mut args = Map::new();
        copy_passthrough(&params, &mut args, &["waitForSelector", "waitTime", "viewport"]);

        assert_eq!(args.get("waitTime"), Some(&json!(500)));
        assert!(args.contains_key("viewport"));
        assert!(!args.contains_key("waitForSelector"));
        assert!(!args.contains_key("unrelated"));
    }

    #[test]
    fn test_base_args_carry_browser_settings() {
        let dir = TempDir::new().unwrap();
        let config = BrowserConfig {
            headless: false,
            chrome_path: Some("/usr/bin/chromium-browser".to_string()),
            script_dir: dir.path().to_path_buf(),
        };
        let runner = ScriptRunner::new(&config);
        let args = runner.base_args("https://example.com");
        assert_eq!(args.get("headless"), Some(&json!(false)));
        assert_eq!(
            args.get("executablePath"),
            Some(&json!("/usr/bin/chromium-browser"))
        );
    }
}
