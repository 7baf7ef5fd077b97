// Runner module - 调用外部扫描脚本（run-zap.sh）
//
// 脚本以 `<script> <url> <email>` 的形式执行。子进程都设置了 kill_on_drop，
// 请求被取消（客户端断开）时进程随之结束。

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::error::{CoreError, Result};

/// 流式输出的通道容量
const LINE_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy)]
enum Stop {
    Disconnected,
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct ScanScript {
    path: PathBuf,
    timeout: Option<Duration>,
}

impl ScanScript {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: None,
        }
    }

    /// 不设置时无限等待
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn is_available(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    fn command(&self, url: &str, email: &str) -> Command {
        let mut cmd = Command::new(&self.path);
        cmd.arg(url)
            .arg(email)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn spawn(&self, url: &str, email: &str) -> Result<Child> {
        if !self.is_available().await {
            return Err(CoreError::ScriptMissing(self.path.clone()));
        }
        self.command(url, email).spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::ScriptMissing(self.path.clone()),
            _ => CoreError::Io(e),
        })
    }

    /// 执行脚本直到结束，返回捕获的 stdout/stderr
    pub async fn run(&self, url: &str, email: &str) -> Result<ScanOutput> {
        let child = self.spawn(url, email).await?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| CoreError::Timeout(limit.as_secs()))??,
            None => child.wait_with_output().await?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(CoreError::ScriptFailed {
                code: output.status.code().unwrap_or(-1),
                stdout,
                stderr,
            });
        }

        Ok(ScanOutput { stdout, stderr })
    }

    /// 启动脚本并逐行转发 stdout 与 stderr 的合并输出。
    ///
    /// stdout 与 stderr 是两个管道，各自内部保持顺序，两者之间按到达先后交错。
    /// 接收端被丢弃（客户端断开）或超时后子进程会被终止，超时时额外发送一行提示。
    pub async fn stream(&self, url: &str, email: &str) -> Result<mpsc::Receiver<String>> {
        let mut child = self.spawn(url, email).await?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        let timeout = self.timeout;
        let script = self.path.display().to_string();

        tokio::spawn(async move {
            let pump = async {
                tokio::join!(forward_lines(stdout, &tx), forward_lines(stderr, &tx));
                child.wait().await
            };
            let deadline = async {
                match timeout {
                    Some(limit) => tokio::time::sleep(limit).await,
                    None => std::future::pending::<()>().await,
                }
            };

            let stop = tokio::select! {
                status = pump => {
                    match status {
                        Ok(status) => tracing::info!("{} exited with {}", script, status),
                        Err(e) => tracing::error!("Failed to wait for {}: {}", script, e),
                    }
                    None
                }
                _ = tx.closed() => Some(Stop::Disconnected),
                _ = deadline => Some(Stop::TimedOut),
            };

            let Some(stop) = stop else { return };
            tracing::warn!("Stopping {}: {:?}", script, stop);
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to kill {}: {}", script, e);
            }
            if let (Stop::TimedOut, Some(limit)) = (stop, timeout) {
                let _ = tx
                    .send(format!("scan timed out after {} seconds", limit.as_secs()))
                    .await;
            }
        });

        Ok(rx)
    }
}

async fn forward_lines<R>(pipe: Option<R>, tx: &mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else { return };
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        // 按字节读取，非 UTF-8 内容替换为 U+FFFD，不中断后续输出
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => return,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).trim().to_string();
                if tx.send(line).await.is_err() {
                    // 客户端已断开
                    return;
                }
            }
            Err(e) => {
                tracing::warn!("Failed to read scan output: {}", e);
                return;
            }
        }
    }
}
