//! 组件标签表
//!
//! 标签是组件注册时携带的声明式元数据，形如 `key:"value"` 的序列，
//! 键可在不同组件间重复。解析算法从不读取标签——它们仅供调用方
//! （例如按标签筛选路由组件的外部协作者）查询。

use std::fmt;

/// 组件标签表
///
/// 解析是宽松的：首个不合法的片段之后的内容被整体忽略，
/// 而不是报错。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    raw: String,
    entries: Vec<(String, String)>,
}

impl TagSet {
    /// 解析标签串
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let entries = parse_entries(&raw);
        Self { raw, entries }
    }

    /// 原始标签串
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// 查询键对应的值；同键多次出现时返回第一个
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 是否包含键
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 遍历全部键值对
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_entries(raw: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut rest = raw;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        // 键：到冒号为止，不允许空白和引号
        let Some(colon) = rest.find(':') else { break };
        let key = &rest[..colon];
        if key.is_empty() || key.contains(char::is_whitespace) || key.contains('"') {
            break;
        }

        // 值：紧随冒号的带引号字符串，支持 \" 和 \\ 转义
        let mut chars = rest[colon + 1..].char_indices();
        match chars.next() {
            Some((_, '"')) => {}
            _ => break,
        }

        let mut value = String::new();
        let mut closed = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                '"' => {
                    closed = Some(colon + 1 + i + 1);
                    break;
                }
                _ => value.push(c),
            }
        }

        let Some(end) = closed else { break };
        entries.push((key.to_string(), value));
        rest = &rest[end..];
    }

    entries
}
