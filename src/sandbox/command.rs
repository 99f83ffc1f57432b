//! 外部进程沙箱：把代码与能力作用域以 JSON 写入求值程序的 stdin
//!
//! 约定：退出码 0 表示渲染成功；非 0 时以 stderr（为空则用退出状态）作为渲染错误。
//! 超时（覆盖写入输入与等待退出）也按渲染错误上报。

use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::sandbox::{CapabilityScope, ErrorReporter, RenderSandbox};

pub struct CommandSandbox {
    program: String,
    args: Vec<String>,
    timeout_secs: u64,
}

impl CommandSandbox {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            args,
            timeout_secs: timeout_secs.max(1),
        }
    }

    async fn evaluate(&self, code: &str, scope: &CapabilityScope) -> Result<(), String> {
        let payload = serde_json::json!({ "code": code, "scope": scope }).to_string();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("Failed to start sandbox '{}': {}", self.program, e))?;

        // 写 stdin 与等待退出放在同一个超时里：不读输入的程序不能把写端永久卡住
        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(payload.as_bytes()).await {
                // 程序没读完输入就退出了，由退出码决定结果
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                Err(e) => Err(format!("Failed to send source to sandbox: {}", e)),
                Ok(()) => Ok(()),
            }
        };

        let (fed, output) = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            async { tokio::join!(feed, child.wait_with_output()) },
        )
        .await
        .map_err(|_| format!("Sandbox timed out after {}s", self.timeout_secs))?;
        let output = output.map_err(|e| format!("Sandbox execution failed: {}", e))?;

        if output.status.success() {
            return fed;
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        Err(if stderr.is_empty() {
            format!("Sandbox exited with {}", output.status)
        } else {
            stderr.to_string()
        })
    }
}

#[async_trait]
impl RenderSandbox for CommandSandbox {
    async fn mount(&self, code: String, scope: Arc<CapabilityScope>, reporter: ErrorReporter) {
        tracing::debug!(program = %self.program, len = code.len(), "sandbox evaluate");
        if let Err(message) = self.evaluate(&code, &scope).await {
            reporter.report(message);
        }
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::sandbox::{RenderAdapter, RenderOutcome};

    fn adapter(script: &str) -> RenderAdapter {
        let sandbox = CommandSandbox::new("sh", vec!["-c".into(), script.into()], 5);
        RenderAdapter::new(Arc::new(sandbox), CapabilityScope::default(), Duration::from_millis(100))
    }

    #[tokio::test]
    async fn test_zero_exit_renders() {
        let outcome = adapter("cat > /dev/null").present("<Box/>").await;
        assert_eq!(outcome, RenderOutcome::Rendered);
    }

    #[tokio::test]
    async fn test_stderr_becomes_render_error() {
        let outcome = adapter("cat > /dev/null; echo 'Foo is not defined' >&2; exit 1")
            .present("<Foo/>")
            .await;
        assert_eq!(outcome, RenderOutcome::RenderFailed("Foo is not defined".into()));
    }

    #[tokio::test]
    async fn test_payload_carries_normalized_code_and_scope() {
        // 只有当 stdin 中出现规范化后的代码与 MUI 符号时才成功
        let outcome = adapter("input=$(cat); case \"$input\" in *'\"code\":\"<Box/>\"'*'\"MUI\"'*) exit 0;; *) exit 3;; esac")
            .present("\\<Box/>")
            .await;
        assert_eq!(outcome, RenderOutcome::Rendered);
    }

    #[tokio::test]
    async fn test_child_ignoring_large_input_times_out() {
        let sandbox = CommandSandbox::new("sh", vec!["-c".into(), "sleep 30".into()], 1);
        let adapter =
            RenderAdapter::new(Arc::new(sandbox), CapabilityScope::default(), Duration::from_millis(100));
        let source = "x".repeat(512 * 1024);

        let outcome = tokio::time::timeout(Duration::from_secs(5), adapter.present(&source))
            .await
            .expect("present must finish within the sandbox timeout");
        match outcome {
            RenderOutcome::RenderFailed(msg) => assert!(msg.contains("timed out"), "{}", msg),
            other => panic!("expected RenderFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_exit_without_reading_input_renders() {
        let source = "x".repeat(512 * 1024);
        let outcome = adapter("exit 0").present(&source).await;
        assert_eq!(outcome, RenderOutcome::Rendered);
    }

    #[tokio::test]
    async fn test_missing_program() {
        let sandbox = CommandSandbox::new("/nonexistent/genui-sandbox", vec![], 5);
        let adapter =
            RenderAdapter::new(Arc::new(sandbox), CapabilityScope::default(), Duration::from_millis(100));
        match adapter.present("<A/>").await {
            RenderOutcome::RenderFailed(msg) => assert!(msg.contains("Failed to start sandbox")),
            other => panic!("expected RenderFailed, got {:?}", other),
        }
    }
}
