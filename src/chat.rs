//! 多轮对话模块
//!
//! `generateContent` 接口本身是无状态的，对话历史保存在客户端，每轮请求都会携带完整历史。
use crate::{
    client::{LLMClient, response_text},
    error::{NanoError, Result},
    stream::TextStream,
    types::{Content, GenerateContentResponse, Role},
};
use async_stream::try_stream;
use futures::StreamExt;
use log::debug;
use std::sync::{Arc, Mutex};

/// 一次对话会话
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: LLMClient,
    history: Arc<Mutex<Vec<Content>>>,
}

impl ChatSession {
    pub fn new(client: LLMClient, history: Vec<Content>) -> Self {
        Self {
            client,
            history: Arc::new(Mutex::new(history)),
        }
    }

    /// 当前历史的快照
    pub fn history(&self) -> Vec<Content> {
        self.lock_history().clone()
    }

    /// 清空历史
    pub fn clear(&self) {
        self.lock_history().clear();
    }

    /// 最近一次模型回复的文本
    pub fn last_reply(&self) -> Option<String> {
        self.lock_history()
            .iter()
            .rev()
            .find(|c| c.role == Some(Role::Model))
            .and_then(Content::text)
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, Vec<Content>> {
        // 历史只在持锁时整体替换或追加，中毒后数据仍然完整
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn contents_with(&self, text: &str) -> Vec<Content> {
        let mut contents = self.history();
        contents.push(Content::user(text));
        contents
    }

    fn commit(&self, user: Content, reply: Content) {
        let mut history = self.lock_history();
        history.push(user);
        history.push(reply);
        debug!("Chat history now has {} turns", history.len());
    }

    /// 发送一条消息
    ///
    /// 只有请求成功时才把这一轮写入历史，失败后可以直接重试。
    pub async fn send_message(&self, text: &str) -> Result<GenerateContentResponse> {
        let contents = self.contents_with(text);
        let response = self.client.generate_content(&contents).await?;

        // 历史中只保存带文本的回复
        let reply = response_text(&response)?;
        self.commit(Content::user(text), Content::model(reply));
        Ok(response)
    }

    /// 发送一条消息并返回回复文本
    pub async fn send_text(&self, text: &str) -> Result<String> {
        let response = self.send_message(text).await?;
        response_text(&response)
    }

    /// 以流式方式发送一条消息
    ///
    /// 流正常结束后，拼接的回复写入历史；中途出错或没有文本时不写入。
    pub async fn send_message_stream(&self, text: &str) -> Result<TextStream> {
        let contents = self.contents_with(text);
        let mut inner = self.client.stream_contents(&contents).await?;
        let session = self.clone();
        let user = Content::user(text);

        Ok(TextStream::new(try_stream! {
            let mut reply = String::new();
            while let Some(chunk) = inner.next().await {
                let chunk = chunk?;
                reply.push_str(&chunk);
                yield chunk;
            }
            if reply.is_empty() {
                Err::<(), _>(NanoError::NoContent)?;
            }
            session.commit(user, Content::model(reply));
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn session(history: Vec<Content>) -> ChatSession {
        let client = LLMClient::new(Config::default().with_api_key("k".to_string()));
        client.start_chat(history)
    }

    #[test]
    fn test_new_session_keeps_initial_history() {
        let chat = session(vec![Content::user("hi"), Content::model("hello")]);
        assert_eq!(chat.history().len(), 2);
        assert_eq!(chat.last_reply().as_deref(), Some("hello"));
    }

    #[test]
    fn test_commit_and_clear() {
        let chat = session(Vec::new());
        assert!(chat.last_reply().is_none());

        chat.commit(Content::user("q"), Content::model("a"));
        let history = chat.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Some(Role::User));
        assert_eq!(history[1].role, Some(Role::Model));

        chat.clear();
        assert!(chat.history().is_empty());
    }

    #[test]
    fn test_contents_with_appends_user_turn() {
        let chat = session(vec![Content::user("q"), Content::model("a")]);
        let contents = chat.contents_with("next");
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[2], Content::user("next"));
        assert_eq!(chat.history().len(), 2);
    }
}
