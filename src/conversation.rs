//! 交互式对话循环
use crate::{chat::ChatSession, error::Result};
use async_trait::async_trait;
use log::{debug, info};
use std::io::{BufRead, Write};

/// 结束对话的命令，不区分大小写
pub const QUIT_COMMAND: &str = "quit";

/// 对话后端，输入一条消息，返回回复文本
#[async_trait]
pub trait ChatBackend: Send {
    async fn send(&mut self, message: &str) -> Result<String>;
}

#[async_trait]
impl ChatBackend for ChatSession {
    async fn send(&mut self, message: &str) -> Result<String> {
        self.send_text(message).await
    }
}

/// 判断一行输入是否为退出命令
pub fn is_quit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(QUIT_COMMAND)
}

/// 运行对话循环，直到输入 `quit` 或读到 EOF
///
/// 退出命令不会触发请求；空行被跳过；单轮出错只打印错误，循环继续。
/// 返回成功发出的消息数。
pub async fn run_conversation<B, R, W>(backend: &mut B, mut input: R, mut output: W) -> Result<usize>
where
    B: ChatBackend + ?Sized,
    R: BufRead,
    W: Write,
{
    writeln!(output, "Starting chat with Gemini. Type '{}' to exit.", QUIT_COMMAND)?;
    let mut sent = 0;

    loop {
        write!(output, "You: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            debug!("Input closed");
            writeln!(output)?;
            writeln!(output, "Ending chat.")?;
            break;
        }

        if is_quit_command(&line) {
            writeln!(output, "Ending chat.")?;
            break;
        }

        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        writeln!(output, "\nGemini thinking...")?;
        output.flush()?;

        match backend.send(message).await {
            Ok(reply) => {
                sent += 1;
                writeln!(output, "\nGemini: {}\n", reply)?;
            }
            Err(e) => {
                writeln!(output, "\nAn error occurred: {}", e)?;
            }
        }
    }

    info!("Chat ended after {} messages", sent);
    Ok(sent)
}
