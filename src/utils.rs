//! 工具函数模块
use crate::types::{Content, Part, Role};

/// 创建一轮内容的便捷函数
///
/// # 参数
///
/// * `role` - 角色
/// * `text` - 文本内容
pub fn content(role: Role, text: &str) -> Content {
    Content {
        role: Some(role),
        parts: vec![Part::text(text)],
    }
}

/// 准备系统指令
///
/// 系统指令为空时不发送。
pub(crate) fn prepare_system_instruction(system_instruction: &str) -> Option<Content> {
    if system_instruction.trim().is_empty() {
        None
    } else {
        Some(Content {
            role: None,
            parts: vec![Part::text(system_instruction)],
        })
    }
}

/// 拼接片段中的文本，全部为空时返回 `None`
pub fn join_text(parts: &[Part]) -> Option<String> {
    let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_creation() {
        let c = content(Role::User, "Hello");
        assert_eq!(c.role, Some(Role::User));
        assert_eq!(c.text().as_deref(), Some("Hello"));
    }

    #[test]
    fn test_prepare_system_instruction() {
        let instruction = prepare_system_instruction("You are a poet.").unwrap();
        assert_eq!(instruction.role, None);
        assert_eq!(instruction.text().as_deref(), Some("You are a poet."));
    }

    #[test]
    fn test_prepare_system_instruction_empty() {
        assert!(prepare_system_instruction("").is_none());
        assert!(prepare_system_instruction("   ").is_none());
    }

    #[test]
    fn test_join_text_skips_non_text_parts() {
        let parts = vec![Part::text("a"), Part { text: None }, Part::text("b")];
        assert_eq!(join_text(&parts).as_deref(), Some("ab"));
        assert_eq!(join_text(&[Part { text: None }]), None);
    }
}
