//! 流式响应处理模块
use crate::{
    error::{NanoError, Result},
    types::GenerateContentResponse,
};
use async_stream::try_stream;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use log::debug;
use memchr::memmem;
use std::{
    io::Write,
    pin::Pin,
    task::{Context, Poll},
};

// ================================================================================================
// 流式响应包装器
// ================================================================================================

const DONE_CHUNK: &str = "[DONE]";

/// 从 `from` 开始查找第一个事件分隔符，返回 (绝对位置, 分隔符长度)
///
/// 服务端可能使用 `\n\n` 或 `\r\n\r\n` 分隔事件。
pub(crate) fn find_event_boundary(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    let haystack = buf.get(from..)?;
    let lf = memmem::find(haystack, b"\n\n").map(|pos| (pos, 2));
    let crlf = memmem::find(haystack, b"\r\n\r\n").map(|pos| (pos, 4));
    let (pos, len) = match (lf, crlf) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b)?,
    };
    Some((from + pos, len))
}

/// 下一次扫描的起点，保留可能被截断的分隔符前缀
fn resume_offset(buf: &[u8]) -> usize {
    buf.len().saturating_sub(3)
}

/// 提取一个事件中所有 `data:` 行并拼接，注释行被忽略
pub(crate) fn event_data(event: &str) -> String {
    let mut data = String::new();
    for line in event.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with(':') {
            continue;
        }
        if let Some(content) = trimmed.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(content.trim_start());
        }
    }
    data
}

/// 事件边界都是 ASCII 换行，完整事件内的多字节字符不会被截断
fn decode_event(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| NanoError::StreamError(format!("Invalid UTF-8 in SSE event: {}", e)))
}

fn parse_event(data: &str) -> Result<Option<GenerateContentResponse>> {
    if data.is_empty() || data == DONE_CHUNK {
        return Ok(None);
    }
    serde_json::from_str(data).map(Some).map_err(|e| {
        NanoError::Json(format!("Failed to parse event: '{}', error: {}", data, e))
    })
}

/// 一个无状态的流处理器，用于解析 SSE (Server-Sent Events) 数据流
#[derive(Debug, Clone, Default)]
pub struct StreamWrapper;

impl StreamWrapper {
    /// 创建一个新的 `StreamWrapper` 实例
    pub fn new() -> Self {
        StreamWrapper
    }

    /// 将一个字节流转换为 `GenerateContentResponse` 的流
    pub fn stream<S, E>(
        &self,
        mut bytes_stream: S,
    ) -> impl Stream<Item = Result<GenerateContentResponse>> + Send + use<S, E>
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static + Unpin,
        E: Into<NanoError> + Send + 'static,
    {
        try_stream! {
            let mut buffer = BytesMut::new();
            let mut scanned = 0;
            while let Some(bytes_res) = bytes_stream.next().await {
                let bytes = bytes_res.map_err(Into::<NanoError>::into)?;
                buffer.extend_from_slice(&bytes);

                while let Some((pos, len)) = find_event_boundary(&buffer, scanned) {
                    let event_bytes = buffer.split_to(pos + len);
                    scanned = 0;
                    if let Some(resp) = parse_event(&event_data(decode_event(&event_bytes)?))? {
                        yield resp;
                    }
                }
                scanned = resume_offset(&buffer);
            }

            // 最后一个事件可能没有结尾的空行
            if !buffer.is_empty() {
                let rest = decode_event(&buffer)?;
                match parse_event(&event_data(rest))? {
                    Some(resp) => yield resp,
                    None => debug!("Leftover buffer: {:?}", rest),
                }
            }
        }
    }
}

/// `Stream<Item = Result<String>>` 的简单包装，逐块产出文本
pub struct TextStream {
    inner: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
}

impl TextStream {
    /// 创建一个新的 `TextStream`
    pub fn new(stream: impl Stream<Item = Result<String>> + Send + 'static) -> Self {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl TextStream {
    /// 把文本块依次写入 `out` 并返回完整文本
    ///
    /// 整个流没有产出任何文本时返回 `NoContent`，此时不写入任何内容。
    pub async fn write_to<W: Write>(mut self, out: &mut W) -> Result<String> {
        let mut text = String::new();
        while let Some(chunk) = self.next().await {
            let chunk = chunk?;
            write!(out, "{}", chunk)?;
            out.flush()?;
            text.push_str(&chunk);
        }
        if text.is_empty() {
            return Err(NanoError::NoContent);
        }
        writeln!(out)?;
        Ok(text)
    }
}

impl Stream for TextStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
